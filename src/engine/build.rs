//! The build aggregate: target, toolchain settings and registered units

use crate::config::{ConfigError, MakeConfig};
use crate::engine::unit::BuildUnit;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised by build maintenance operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// An artifact could not be removed while clearing an object directory
    #[error("cannot remove {path}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An object directory could not be enumerated while clearing
    #[error("cannot list object directory {path}: {source}")]
    ListObjectDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the engine sends its human-readable command/result lines
///
/// Defaults to stdout; the surrounding test runner may redirect the stream
/// into its own report pipeline.
pub type OutputSink = Box<dyn FnMut(&str) + Send>;

fn stdout_sink() -> OutputSink {
    Box::new(|message| print!("{message}"))
}

/// One build invocation: the target executable, the toolchain settings and
/// the ordered list of registered build units
///
/// Registration order is preserved and becomes link order, which matters
/// for linkers sensitive to symbol resolution order.
pub struct Build {
    pub(crate) target: PathBuf,
    pub(crate) compiler: String,
    pub(crate) include_paths: Vec<PathBuf>,
    pub(crate) linker_options: Vec<String>,
    pub(crate) units: Vec<BuildUnit>,
    pub(crate) out: OutputSink,
}

impl fmt::Debug for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Build")
            .field("target", &self.target)
            .field("compiler", &self.compiler)
            .field("include_paths", &self.include_paths)
            .field("linker_options", &self.linker_options)
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}

impl Default for Build {
    /// An empty build, expecting its settings from [`Build::load_config`]
    fn default() -> Self {
        Build {
            target: PathBuf::new(),
            compiler: "cc".to_string(),
            include_paths: Vec::new(),
            linker_options: Vec::new(),
            units: Vec::new(),
            out: stdout_sink(),
        }
    }
}

impl Build {
    /// Creates a build with explicit toolchain settings
    pub fn new(
        target: impl Into<PathBuf>,
        compiler: impl Into<String>,
        include_paths: Vec<PathBuf>,
        linker_options: Vec<String>,
    ) -> Build {
        Build {
            target: target.into(),
            compiler: compiler.into(),
            include_paths,
            linker_options,
            units: Vec::new(),
            out: stdout_sink(),
        }
    }

    /// Redirects the engine's textual output
    pub fn set_output_sink(&mut self, sink: OutputSink) {
        self.out = sink;
    }

    /// Path of the executable this build produces
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Registered units, in registration (= link) order
    pub fn units(&self) -> &[BuildUnit] {
        &self.units
    }

    /// Registers source files sharing compile options and an object directory
    ///
    /// Sources without a recognized native extension are skipped with a
    /// warning. A source whose derived object path collides with an already
    /// registered unit is skipped too; object paths are unique within a
    /// build. Returns the object paths registered by this call.
    pub fn add_sources(
        &mut self,
        sources: &[PathBuf],
        options: &[String],
        object_dir: &Path,
    ) -> Vec<PathBuf> {
        let mut registered = Vec::new();

        for source in sources {
            let Some(unit) = BuildUnit::for_source(source, options, object_dir) else {
                continue;
            };

            if self.units.iter().any(|known| known.object == unit.object) {
                warn!(
                    object = %unit.object.display(),
                    source = %source.display(),
                    "object path already registered, skipping duplicate"
                );
                continue;
            }

            registered.push(unit.object.clone());
            self.units.push(unit);
        }

        registered
    }

    /// Applies a declarative configuration to this build
    ///
    /// Settings present in the file override the current ones; absent
    /// settings are left alone, so a global configuration and a per-module
    /// configuration can be layered. Returns the object paths registered by
    /// this call so the caller can pre-invalidate artifacts that predate a
    /// configuration edit.
    pub fn load_config(&mut self, path: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let config = MakeConfig::load(path)?;
        debug!(config = %path.display(), "applying build configuration");

        if let Some(target) = config.target {
            self.target = target;
        }
        if let Some(compiler) = config.compiler {
            self.compiler = compiler;
        }
        self.include_paths.extend(config.include_paths);
        self.linker_options.extend(config.linker_options);

        let mut registered = Vec::new();
        for group in &config.source_groups {
            registered.extend(self.add_sources(&group.sources, &group.options, &group.object_dir));
        }
        Ok(registered)
    }

    /// Removes every file found in each unit's object directory
    ///
    /// The object directories are engine-owned by contract; whatever they
    /// currently contain is deleted. Used by `Build` (full rebuild) as a
    /// pre-step and exposed standalone as the `Clear` run mode.
    pub fn clear(&mut self) -> Result<(), EngineError> {
        let object_dirs: BTreeSet<PathBuf> = self
            .units
            .iter()
            .map(|unit| unit.object_dir().to_path_buf())
            .collect();

        for dir in object_dirs {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(source) if source.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(EngineError::ListObjectDir { path: dir, source }),
            };

            for entry in entries {
                let entry = entry.map_err(|source| EngineError::ListObjectDir {
                    path: dir.clone(),
                    source,
                })?;
                let path = entry.path();
                if path.is_file() {
                    fs::remove_file(&path)
                        .map_err(|source| EngineError::Clear { path: path.clone(), source })?;
                    info!(artifact = %path.display(), "removed");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_preserves_order_and_skips_bad_extensions() {
        let mut build = Build::default();
        let registered = build.add_sources(
            &[
                PathBuf::from("main.c"),
                PathBuf::from("README.md"),
                PathBuf::from("math/math.c"),
            ],
            &["-Wall".to_string()],
            Path::new("Obj"),
        );

        assert_eq!(
            registered,
            vec![PathBuf::from("Obj/main.o"), PathBuf::from("Obj/math.o")]
        );
        assert_eq!(build.units().len(), 2);
        assert_eq!(build.units()[0].source, PathBuf::from("main.c"));
        assert_eq!(build.units()[1].source, PathBuf::from("math/math.c"));
    }

    #[test]
    fn duplicate_object_paths_are_rejected() {
        let mut build = Build::default();
        build.add_sources(&[PathBuf::from("a/util.c")], &[], Path::new("Obj"));
        let second = build.add_sources(&[PathBuf::from("b/util.c")], &[], Path::new("Obj"));

        assert!(second.is_empty());
        assert_eq!(build.units().len(), 1);
        assert_eq!(build.units()[0].source, PathBuf::from("a/util.c"));
    }

    #[test]
    fn clear_on_missing_object_dir_is_a_no_op() {
        let mut build = Build::default();
        build.add_sources(
            &[PathBuf::from("main.c")],
            &[],
            Path::new("definitely/not/created"),
        );
        build.clear().unwrap();
    }
}
