//! The incremental build engine
//!
//! A [`Build`] aggregates a target executable, toolchain settings and an
//! ordered list of [`BuildUnit`]s. `make` compiles only the units whose
//! objects are stale with respect to their dependency records, then links
//! when anything changed (or when the target is missing); `build` clears
//! the object directories first; `clear` stands alone as the third run
//! mode.
//!
//! Staleness is judged against a [`TimestampCache`](crate::timestamp::TimestampCache)
//! snapshot supplied by the caller; the engine itself holds no hidden
//! global state.

pub mod build;
pub mod make;
pub mod process;
pub mod staleness;
pub mod unit;

pub use build::{Build, EngineError, OutputSink};
pub use make::{
    CompileStatus, ExecutableStatus, LinkStatus, MakeReport, UnitOutcome, UnitReport,
    WholeCompileStatus,
};
pub use staleness::needs_compile;
pub use unit::BuildUnit;
