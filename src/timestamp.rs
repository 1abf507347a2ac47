//! File modification-time cache and comparison predicates
//!
//! The staleness evaluator asks many timestamp questions about the same
//! files (headers shared between translation units, the object files
//! themselves). This module memoizes `fs::metadata` mtime reads so each
//! path is stat'ed at most once per build run.
//!
//! # Snapshot semantics
//!
//! Once a path is cached, the cached value is returned for the rest of the
//! run even if the file changes on disk. A caller that touches files and
//! needs fresh data (test harnesses do this between cases) must call
//! [`TimestampCache::clear`]. Concurrent external modification during a
//! run is out of scope and not detected.
//!
//! # Example
//!
//! ```no_run
//! use incremake::timestamp::{TimestampCache, CompareResult};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), incremake::timestamp::TimestampError> {
//! let mut cache = TimestampCache::new();
//!
//! match cache.compare(Path::new("main.o"), Path::new("main.c"))? {
//!     CompareResult::FirstNewer => println!("object is up to date"),
//!     CompareResult::SecondNewer => println!("source changed, recompile"),
//!     CompareResult::SameTimestamp => println!("same instant"),
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::trace;

/// Errors raised while reading file timestamps
#[derive(Debug, Error)]
pub enum TimestampError {
    /// The file could not be stat'ed (typically: it does not exist)
    #[error("cannot read timestamp of {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TimestampError {
    /// Path the failed stat was issued against
    pub fn path(&self) -> &Path {
        match self {
            TimestampError::Stat { path, .. } => path,
        }
    }
}

/// Result of comparing two file timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    /// The first file is newer than the second
    FirstNewer,
    /// The second file is newer than the first
    SecondNewer,
    /// Both files carry the same modification time
    SameTimestamp,
}

/// Memoizing mtime cache, one instance per build session
///
/// Deliberately not shared between threads; the engine runs one build at a
/// time and the session lock in the runner enforces that discipline.
#[derive(Debug, Default)]
pub struct TimestampCache {
    saved: HashMap<PathBuf, SystemTime>,
}

impl TimestampCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the modification time of `path`, reading the filesystem
    /// only on the first query for that path
    pub fn get(&mut self, path: &Path) -> Result<SystemTime, TimestampError> {
        if let Some(mtime) = self.saved.get(path) {
            return Ok(*mtime);
        }

        let mtime = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| TimestampError::Stat {
                path: path.to_path_buf(),
                source,
            })?;

        trace!(path = %path.display(), ?mtime, "cached file timestamp");
        self.saved.insert(path.to_path_buf(), mtime);
        Ok(mtime)
    }

    /// Compares the modification times of two files
    pub fn compare(&mut self, first: &Path, second: &Path) -> Result<CompareResult, TimestampError> {
        let first_mtime = self.get(first)?;
        let second_mtime = self.get(second)?;

        if first_mtime < second_mtime {
            Ok(CompareResult::SecondNewer)
        } else if first_mtime > second_mtime {
            Ok(CompareResult::FirstNewer)
        } else {
            Ok(CompareResult::SameTimestamp)
        }
    }

    /// True iff no candidate is newer than `path`
    ///
    /// Vacuously true for an empty candidate list.
    pub fn is_latest<P>(&mut self, path: &Path, candidates: &[P]) -> Result<bool, TimestampError>
    where
        P: AsRef<Path>,
    {
        for candidate in candidates {
            if self.compare(path, candidate.as_ref())? == CompareResult::SecondNewer {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True iff no candidate is older than `path`
    ///
    /// Used by the runner to decide whether a configuration file is still
    /// the oldest input, i.e. whether existing objects survive a config edit.
    pub fn is_oldest<P>(&mut self, path: &Path, candidates: &[P]) -> Result<bool, TimestampError>
    where
        P: AsRef<Path>,
    {
        for candidate in candidates {
            if self.compare(path, candidate.as_ref())? == CompareResult::FirstNewer {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Drops every cached entry, forcing re-stat on the next query
    pub fn clear(&mut self) {
        self.saved.clear();
    }

    /// Number of cached paths, for diagnostics
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// True when the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}
