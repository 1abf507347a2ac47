//! Test-runner orchestration around the build engine
//!
//! This layer is the engine's collaborator side: it resolves which modules
//! to build, layers global/harness/module configurations onto a
//! [`Build`], pre-invalidates objects that predate a configuration edit,
//! dispatches the requested run mode and finally executes the built test
//! binary, streaming its output lines upward for rendering.
//!
//! Concurrency discipline lives here, not in the engine: a
//! [`BuildSession`] allows one run in flight at a time and fails fast on a
//! second attempt instead of queuing.

use crate::config::ConfigError;
use crate::engine::{Build, EngineError, ExecutableStatus, MakeReport};
use crate::engine::process;
use crate::timestamp::{TimestampCache, TimestampError};
use clap::ValueEnum;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, TryLockError};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration file every build module carries
pub const MODULE_CONFIG_FILE: &str = "MakeConfig.jsonc";

/// Errors raised by the runner layer
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The requested run mode is not one of Make, Build, Clear
    #[error(
        "invalid run mode '{0}'. Please input Make or Build or Clear; \
         when omitted, Make is executed"
    )]
    InvalidRunMode(String),

    /// A configuration file failed to load; fatal to that module's build
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The engine failed while clearing artifacts
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A timestamp needed for pre-invalidation could not be read
    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    /// Filesystem access failed outside the engine
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another build is already in flight; the attempt is rejected, not queued
    #[error("a build is already running; try again once it finishes")]
    BuildInFlight,

    /// The coverage tool reported an error
    #[error("coverage report generation failed: {0}")]
    CoverageFailed(String),
}

/// How a run treats existing artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum RunMode {
    /// Incremental: compile only stale units
    Make,
    /// Full rebuild: clear artifacts, then make
    Build,
    /// Remove artifacts only
    Clear,
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Make
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Make => write!(f, "Make"),
            RunMode::Build => write!(f, "Build"),
            RunMode::Clear => write!(f, "Clear"),
        }
    }
}

impl FromStr for RunMode {
    type Err = RunnerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Make" => Ok(RunMode::Make),
            "Build" => Ok(RunMode::Build),
            "Clear" => Ok(RunMode::Clear),
            other => Err(RunnerError::InvalidRunMode(other.to_string())),
        }
    }
}

/// One requested run over a set of modules
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Directory containing the build modules
    pub test_root: PathBuf,
    /// Module directory names beneath `test_root`
    pub modules: Vec<String>,
    pub mode: RunMode,
    /// Shared settings applied before any module configuration
    pub global_config: Option<PathBuf>,
    /// Test-harness directory whose sources join every build
    pub harness_dir: Option<PathBuf>,
}

/// Result of building (and running) one module
#[derive(Debug)]
pub struct ModuleResult {
    pub module: String,
    pub target: PathBuf,
    pub executable_valid: bool,
    /// Engine report; absent for `Clear` runs
    pub report: Option<MakeReport>,
    /// Output lines of the executed test binary
    pub test_output: Vec<String>,
}

/// Lists the module directories beneath `root`, i.e. every subdirectory
/// carrying a [`MODULE_CONFIG_FILE`], sorted by name
pub fn discover_modules(root: &Path) -> Result<Vec<String>, RunnerError> {
    let entries = fs::read_dir(root).map_err(|source| RunnerError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut modules = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RunnerError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() && path.join(MODULE_CONFIG_FILE).exists() {
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                modules.push(name.to_string());
            }
        }
    }
    modules.sort();
    Ok(modules)
}

/// Resolves a module argument: the literal name, or every module under
/// `root` when the argument is `All`
pub fn resolve_modules(root: &Path, module: &str) -> Result<Vec<String>, RunnerError> {
    if module == "All" {
        discover_modules(root)
    } else {
        Ok(vec![module.to_string()])
    }
}

/// Applies one configuration file to `build` and pre-invalidates artifacts
/// that predate a configuration edit
///
/// If the configuration file is no longer the oldest input compared to the
/// object files it registered, those objects were produced under stale
/// settings and are deleted so the next make recompiles them.
pub fn prepare_module(
    build: &mut Build,
    cache: &mut TimestampCache,
    config_path: &Path,
) -> Result<(), RunnerError> {
    let objects = build.load_config(config_path)?;

    let existing: Vec<PathBuf> = objects.into_iter().filter(|obj| obj.exists()).collect();
    if existing.is_empty() {
        return Ok(());
    }

    if !cache.is_oldest(config_path, &existing)? {
        info!(
            config = %config_path.display(),
            "configuration edited after objects were built, invalidating them"
        );
        for object in &existing {
            fs::remove_file(object).map_err(|source| RunnerError::Io {
                path: object.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Serializes build runs: one in flight at a time, fail-fast on contention
#[derive(Debug, Default)]
pub struct BuildSession {
    lock: Mutex<()>,
}

impl BuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_acquire(&self) -> Result<MutexGuard<'_, ()>, RunnerError> {
        match self.lock.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(RunnerError::BuildInFlight),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    /// Runs the requested mode over every module in the request
    ///
    /// Each module gets a fresh [`Build`] and a fresh timestamp snapshot.
    /// A module whose configuration fails to load aborts that module (and
    /// the run) immediately; per-unit compile errors do not.
    pub fn run(&self, request: &RunRequest) -> Result<Vec<ModuleResult>, RunnerError> {
        let _guard = self.try_acquire()?;

        let mut results = Vec::with_capacity(request.modules.len());
        for module in &request.modules {
            info!(%module, mode = %request.mode, "processing module");
            results.push(self.run_module(request, module)?);
        }
        Ok(results)
    }

    fn run_module(&self, request: &RunRequest, module: &str) -> Result<ModuleResult, RunnerError> {
        let mut build = Build::default();
        let mut cache = TimestampCache::new();

        if let Some(global_config) = &request.global_config {
            build.load_config(global_config)?;
        }
        if let Some(harness_dir) = &request.harness_dir {
            prepare_module(&mut build, &mut cache, &harness_dir.join(MODULE_CONFIG_FILE))?;
        }
        let module_config = request.test_root.join(module).join(MODULE_CONFIG_FILE);
        prepare_module(&mut build, &mut cache, &module_config)?;

        let report = match request.mode {
            RunMode::Make => Some(build.make(&mut cache)),
            RunMode::Build => Some(build.build(&mut cache)?),
            RunMode::Clear => {
                build.clear()?;
                None
            }
        };

        let executable_valid = report
            .as_ref()
            .map(|report| report.executable == ExecutableStatus::Valid)
            .unwrap_or(false);

        let test_output = if executable_valid && request.mode != RunMode::Clear {
            info!(%module, target = %build.target().display(), "executing test binary");
            execute_test_binary(build.target())
        } else {
            if request.mode != RunMode::Clear {
                warn!(%module, "no valid executable, test run skipped");
            }
            Vec::new()
        };

        Ok(ModuleResult {
            module: module.to_string(),
            target: build.target().to_path_buf(),
            executable_valid,
            report,
            test_output,
        })
    }
}

/// Executes the built test binary and returns its output lines
///
/// The binary's own pass/fail summary is part of the returned text; the
/// runner does not interpret it, the report renderer downstream does.
pub fn execute_test_binary(target: &Path) -> Vec<String> {
    let output = process::run_tool(&target.display().to_string(), &[]);
    output.text.lines().map(str::to_string).collect()
}

/// Invokes `gcovr` to render a coverage report for `source_root`
pub fn generate_coverage_report(source_root: &Path, out_dir: &Path) -> Result<(), RunnerError> {
    let args = vec![
        "-r".to_string(),
        source_root.display().to_string(),
        "--html-details".to_string(),
        format!("--output={}/coverage.html", out_dir.display()),
    ];

    let output = process::run_tool("gcovr", &args);
    if output.indicates_error() {
        return Err(RunnerError::CoverageFailed(output.text));
    }
    Ok(())
}
