//! Build configuration loading (`MakeConfig.jsonc`)
//!
//! Build modules are described declaratively in JSON with C-style comments
//! (`/* ... */` and `// ...`). The comments are stripped by a small scanner
//! that understands string literals, so comment markers inside string
//! values survive intact, then the remainder is parsed with `serde_json`.
//!
//! # Structure
//!
//! ```jsonc
//! {
//!     // Path to the test executable this module produces
//!     "target": "Obj/test.exe",
//!     "compiler": "gcc",
//!     "includePaths": ["math"],
//!     "linkerOptions": ["-MMD", "-Wall", "-O2"],
//!     "sourceGroups": [
//!         {
//!             "sources": ["main.c", "math/math.c"],
//!             "options": ["-MMD", "-Wall", "-O2"],
//!             "objectDir": "Obj"
//!         }
//!     ]
//! }
//! ```
//!
//! Every field is optional so that a global configuration (compiler,
//! harness sources) and a per-module configuration (target, module sources)
//! can be layered onto the same build.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a build configuration
///
/// Configuration errors are fatal to the current module's build; nothing is
/// registered from a file that fails to load.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid JSON once comments are stripped
    #[error("malformed configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One group of sources sharing compile options and an object directory
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceGroup {
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub options: Vec<String>,
    pub object_dir: PathBuf,
}

/// Declarative description of (part of) a build
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeConfig {
    pub target: Option<PathBuf>,
    pub compiler: Option<String>,
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub linker_options: Vec<String>,
    #[serde(default)]
    pub source_groups: Vec<SourceGroup>,
}

impl MakeConfig {
    /// Loads a `.jsonc` configuration file
    pub fn load(path: &Path) -> Result<MakeConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let stripped = strip_comments(&text);
        serde_json::from_str(&stripped).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Removes C-style comments outside of JSON string literals
///
/// Newlines inside line comments are kept so `serde_json` error positions
/// still point at the right line of the original file.
fn strip_comments(text: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        InString { escaped: bool },
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(text.len());
    let mut state = State::Normal;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Normal => match ch {
                '"' => {
                    state = State::InString { escaped: false };
                    out.push(ch);
                }
                '/' => match chars.peek() {
                    Some('/') => {
                        chars.next();
                        state = State::LineComment;
                    }
                    Some('*') => {
                        chars.next();
                        state = State::BlockComment;
                    }
                    _ => out.push(ch),
                },
                _ => out.push(ch),
            },
            State::InString { escaped } => {
                if escaped {
                    state = State::InString { escaped: false };
                } else if ch == '\\' {
                    state = State::InString { escaped: true };
                } else if ch == '"' {
                    state = State::Normal;
                }
                out.push(ch);
            }
            State::LineComment => {
                if ch == '\n' {
                    state = State::Normal;
                    out.push(ch);
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Normal;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
    {
        /* block comment */
        "target": "Obj/test.exe", // trailing comment
        "compiler": "gcc",
        "includePaths": ["math"],
        "linkerOptions": ["-MMD", "-Wall", "-O2"],
        "sourceGroups": [
            {
                "sources": ["main.c", "math/math.c"],
                "options": ["-MMD", "-Wall", "-O2"],
                "objectDir": "Obj"
            }
        ]
    }
    "#;

    #[test]
    fn loads_commented_configuration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("MakeConfig.jsonc");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{SAMPLE}").unwrap();

        let config = MakeConfig::load(&path).unwrap();
        assert_eq!(config.target.as_deref(), Some(Path::new("Obj/test.exe")));
        assert_eq!(config.compiler.as_deref(), Some("gcc"));
        assert_eq!(config.source_groups.len(), 1);
        assert_eq!(config.source_groups[0].sources.len(), 2);
        assert_eq!(config.source_groups[0].object_dir, PathBuf::from("Obj"));
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let stripped = strip_comments(r#"{"url": "http://host/a", "glob": "src/*.c" /* real */}"#);
        assert_eq!(stripped, r#"{"url": "http://host/a", "glob": "src/*.c" }"#);
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let stripped = strip_comments(r#"{"s": "a\"// not a comment"} // comment"#);
        assert_eq!(stripped, r#"{"s": "a\"// not a comment"} "#);
    }

    #[test]
    fn block_comments_may_span_lines() {
        let stripped = strip_comments("{\n/* one\n two */\"n\": 3}");
        assert_eq!(stripped, "{\n\"n\": 3}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = MakeConfig::load(&dir.path().join("absent.jsonc")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonc");
        std::fs::write(&path, "{ not json ").unwrap();

        let err = MakeConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
