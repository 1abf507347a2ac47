//! Compiler-generated dependency file parsing
//!
//! Compilers invoked with `-MMD` emit GNU-make-style `.d` records next to
//! each object file:
//!
//! ```make
//! Obj/math.o: math/math.c math/math.h \
//!  harness/unity.h
//! ```
//!
//! [`read_related_files`] flattens such a record into the list of files the
//! object depends on: the target clause up to the `:` and the continuation
//! backslashes are stripped, remaining tokens are split on whitespace runs.
//!
//! Records are deliberately reparsed from disk on every staleness check;
//! they are small and the reparse keeps the evaluation free of a second
//! cache layer.

use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while reading a dependency record
#[derive(Debug, Error)]
pub enum DepfileError {
    /// The dependency file could not be opened or read
    #[error("cannot read dependency file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Target clause of a make rule, greedy to the last `:` on the line.
///
/// Greediness mirrors the record grammar: dependency paths only appear
/// after the final colon of the rule head, and continuation lines carry
/// no colon at all.
fn target_clause() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*:").unwrap())
}

/// Reads a `.d` record and returns every file path it names, in order
pub fn read_related_files(path: &Path) -> Result<Vec<PathBuf>, DepfileError> {
    let text = fs::read_to_string(path).map_err(|source| DepfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut related = Vec::new();
    for line in text.lines() {
        let line = target_clause().replace(line, "");
        let line = line.replace('\\', "");
        for token in line.split_whitespace() {
            related.push(PathBuf::from(token));
        }
    }
    Ok(related)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_depfile(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("unit.d");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    #[test]
    fn parses_single_line_rule() {
        let dir = TempDir::new().unwrap();
        let path = write_depfile(&dir, "Obj/main.o: main.c common.h\n");

        let related = read_related_files(&path).unwrap();
        assert_eq!(
            related,
            vec![PathBuf::from("main.c"), PathBuf::from("common.h")]
        );
    }

    #[test]
    fn parses_continuation_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_depfile(
            &dir,
            "Obj/math.o: math/math.c math/math.h \\\n harness/unity.h \\\n harness/unity_internals.h\n",
        );

        let related = read_related_files(&path).unwrap();
        assert_eq!(
            related,
            vec![
                PathBuf::from("math/math.c"),
                PathBuf::from("math/math.h"),
                PathBuf::from("harness/unity.h"),
                PathBuf::from("harness/unity_internals.h"),
            ]
        );
    }

    #[test]
    fn blank_and_target_only_lines_yield_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_depfile(&dir, "Obj/empty.o:\n\n");

        let related = read_related_files(&path).unwrap();
        assert!(related.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.d");

        let err = read_related_files(&missing).unwrap_err();
        let DepfileError::Io { path, .. } = err;
        assert_eq!(path, missing);
    }
}
