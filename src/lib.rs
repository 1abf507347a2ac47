//! incremake - incremental compile/link engine for embedded C test harnesses
//!
//! This library decides, for a set of registered source files, which must be
//! recompiled and whether the final test executable must be relinked, based
//! on file modification timestamps and compiler-generated dependency
//! records.
//!
//! # Core Concepts
//!
//! - **Build unit**: one source file plus its derived object file,
//!   dependency record and per-file compile options
//! - **Staleness**: an object file older than at least one of its declared
//!   dependencies; stale units are recompiled, fresh ones skipped
//! - **Run mode**: `Make` (incremental), `Build` (full rebuild) or `Clear`
//!   (remove artifacts only)
//!
//! # Example Usage
//!
//! ```no_run
//! use incremake::engine::Build;
//! use incremake::timestamp::TimestampCache;
//! use std::path::{Path, PathBuf};
//!
//! let mut build = Build::new(
//!     "Obj/test.exe",
//!     "gcc",
//!     vec![PathBuf::from("math")],
//!     vec!["-MMD".into(), "-Wall".into(), "-O2".into()],
//! );
//! build.add_sources(
//!     &[PathBuf::from("main.c"), PathBuf::from("math/math.c")],
//!     &["-MMD".into(), "-Wall".into(), "-O2".into()],
//!     Path::new("Obj"),
//! );
//!
//! let mut cache = TimestampCache::new();
//! let report = build.make(&mut cache);
//! println!("executable valid: {}", report.is_valid());
//! ```
//!
//! # Project Structure
//!
//! - [`timestamp`]: memoized mtime cache and comparison predicates
//! - [`depfile`]: GNU-make-style dependency record parsing
//! - [`config`]: JSONC build-configuration loading
//! - [`engine`]: build units, staleness evaluation, compile/link orchestration
//! - [`runner`]: module discovery, run modes and test execution around the engine

// Public modules
pub mod cli;
pub mod config;
pub mod depfile;
pub mod engine;
pub mod runner;
pub mod timestamp;
pub mod util;

// Re-export key types for convenient access
pub use config::{ConfigError, MakeConfig, SourceGroup};
pub use depfile::{read_related_files, DepfileError};
pub use engine::{
    Build, BuildUnit, EngineError, ExecutableStatus, LinkStatus, MakeReport, WholeCompileStatus,
};
pub use runner::{BuildSession, ModuleResult, RunMode, RunRequest, RunnerError};
pub use timestamp::{CompareResult, TimestampCache, TimestampError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
