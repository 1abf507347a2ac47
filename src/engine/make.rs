//! Compile/link orchestration
//!
//! One build invocation walks an explicit state machine:
//! compile every stale unit in registration order, join the per-unit
//! outcomes, decide whether linking is necessary, link, and classify the
//! resulting executable as valid or invalid.
//!
//! Errors never abort the batch: every unit is attempted, and the worst
//! case of any lower-level failure is an unnecessary recompilation.

use crate::engine::build::{Build, EngineError};
use crate::engine::process::{self, ToolOutput};
use crate::engine::staleness;
use crate::engine::unit::BuildUnit;
use crate::timestamp::TimestampCache;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Outcome of compiling one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    Succeeded,
    Error,
}

/// Outcome of the link step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Skipped,
    Succeeded,
    Error,
}

/// Join of all per-unit compile outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WholeCompileStatus {
    /// Every unit was up to date; nothing ran
    NoCompiledFile,
    /// At least one unit compiled, none failed
    NoCompileError,
    /// At least one unit failed (including missing sources)
    AtLeastOneCompileError,
}

/// Final classification of the build's executable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableStatus {
    Valid,
    Invalid,
}

/// What happened to one unit during the compile phase
#[derive(Debug, Clone)]
pub enum UnitOutcome {
    /// The compiler ran; captured output retained for reporting
    Compiled {
        status: CompileStatus,
        output: String,
    },
    /// The object was up to date
    Skipped,
    /// The source file was absent; recorded as a compile error
    SourceMissing,
}

/// Per-unit record in a [`MakeReport`]
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub source: PathBuf,
    pub object: PathBuf,
    pub outcome: UnitOutcome,
}

impl UnitReport {
    /// True when this unit contributed a compile error
    pub fn failed(&self) -> bool {
        matches!(
            self.outcome,
            UnitOutcome::SourceMissing
                | UnitOutcome::Compiled {
                    status: CompileStatus::Error,
                    ..
                }
        )
    }
}

/// Full result of one Make/Build invocation
#[derive(Debug, Clone)]
pub struct MakeReport {
    pub units: Vec<UnitReport>,
    pub compile: WholeCompileStatus,
    pub link: LinkStatus,
    /// Captured linker output, when the link step ran
    pub link_output: Option<String>,
    pub executable: ExecutableStatus,
}

impl MakeReport {
    /// True iff the build produced (or kept) a valid executable
    pub fn is_valid(&self) -> bool {
        self.executable == ExecutableStatus::Valid
    }
}

impl Build {
    pub(crate) fn emit(&mut self, message: &str) {
        (self.out)(message);
    }

    /// Incremental make: compile stale units, link if necessary
    pub fn make(&mut self, cache: &mut TimestampCache) -> MakeReport {
        let (units, compile) = self.compile_sources(cache);

        let (link, link_output) = if self.is_linking_required(compile) {
            let output = self.link_objects();
            let status = if output.indicates_error() {
                LinkStatus::Error
            } else {
                LinkStatus::Succeeded
            };
            (status, Some(output.text))
        } else {
            (LinkStatus::Skipped, None)
        };

        let executable = finalize(compile, link);
        info!(?compile, ?link, ?executable, target = %self.target.display(), "make finished");

        MakeReport {
            units,
            compile,
            link,
            link_output,
            executable,
        }
    }

    /// Full rebuild: clear every object directory, then make
    pub fn build(&mut self, cache: &mut TimestampCache) -> Result<MakeReport, EngineError> {
        self.clear()?;
        Ok(self.make(cache))
    }

    fn compile_sources(
        &mut self,
        cache: &mut TimestampCache,
    ) -> (Vec<UnitReport>, WholeCompileStatus) {
        let units = self.units.clone();
        let mut any_error = false;
        let mut any_compiled = false;
        let mut reports = Vec::with_capacity(units.len());

        for unit in &units {
            let outcome = if !unit.source.exists() {
                self.emit(&format!("Error: Could not find {}\n", unit.source.display()));
                any_error = true;
                UnitOutcome::SourceMissing
            } else if staleness::needs_compile(unit, cache) {
                any_compiled = true;
                let output = self.issue_compile_command(unit);
                let status = if output.indicates_error() {
                    any_error = true;
                    CompileStatus::Error
                } else {
                    CompileStatus::Succeeded
                };
                UnitOutcome::Compiled {
                    status,
                    output: output.text,
                }
            } else {
                self.emit(&format!("skip compiling {}\n", unit.object.display()));
                debug!(object = %unit.object.display(), "object up to date");
                UnitOutcome::Skipped
            };

            reports.push(UnitReport {
                source: unit.source.clone(),
                object: unit.object.clone(),
                outcome,
            });
        }

        let whole = if any_error {
            WholeCompileStatus::AtLeastOneCompileError
        } else if any_compiled {
            WholeCompileStatus::NoCompileError
        } else {
            WholeCompileStatus::NoCompiledFile
        };
        (reports, whole)
    }

    fn issue_compile_command(&mut self, unit: &BuildUnit) -> ToolOutput {
        // The object directory is created on demand, right before first use.
        if let Err(create_err) = fs::create_dir_all(unit.object_dir()) {
            let text = format!(
                "error: cannot create object directory {}: {create_err}\n",
                unit.object_dir().display()
            );
            self.emit(&text);
            return ToolOutput {
                command: String::new(),
                text,
            };
        }

        let mut args = unit.options.clone();
        args.extend(self.include_flags());
        args.push("-c".to_string());
        args.push(unit.source.display().to_string());
        args.push("-o".to_string());
        args.push(unit.object.display().to_string());

        let compiler = self.compiler.clone();
        let output = process::run_tool(&compiler, &args);
        self.emit(&format!("{}\n", output.command));
        self.emit(&output.text);
        output
    }

    fn is_linking_required(&mut self, compile: WholeCompileStatus) -> bool {
        match compile {
            WholeCompileStatus::NoCompileError => true,
            WholeCompileStatus::AtLeastOneCompileError => {
                self.emit("Skip linking, because at least one compile error happened.\n");
                false
            }
            WholeCompileStatus::NoCompiledFile => {
                if self.target.exists() {
                    self.emit("Skip linking, because nothing has been updated.\n");
                    false
                } else {
                    // Nothing recompiled but the executable is gone; relink.
                    true
                }
            }
        }
    }

    fn link_objects(&mut self) -> ToolOutput {
        let mut args = self.linker_options.clone();
        args.push("-o".to_string());
        args.push(self.target.display().to_string());
        for unit in &self.units {
            args.push(unit.object.display().to_string());
        }

        let linker = self.compiler.clone();
        let output = process::run_tool(&linker, &args);
        self.emit(&format!("{}\n", output.command));
        self.emit(&output.text);
        output
    }

    fn include_flags(&self) -> Vec<String> {
        let mut flags = Vec::with_capacity(self.include_paths.len() * 2);
        for path in &self.include_paths {
            flags.push("-I".to_string());
            flags.push(path.display().to_string());
        }
        flags
    }
}

fn finalize(compile: WholeCompileStatus, link: LinkStatus) -> ExecutableStatus {
    if compile == WholeCompileStatus::AtLeastOneCompileError || link == LinkStatus::Error {
        ExecutableStatus::Invalid
    } else {
        ExecutableStatus::Valid
    }
}
