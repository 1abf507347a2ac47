//! Build units: one source file plus its derived artifacts

use std::path::{Path, PathBuf};
use tracing::warn;

/// File extensions accepted as native sources
const NATIVE_SOURCE_EXTENSIONS: &[&str] = &["c", "cpp"];

/// One source file together with its derived object file, dependency
/// record and per-file compile options
///
/// Immutable for the lifetime of a build invocation; owned by the
/// [`Build`](crate::engine::Build) that registered it.
#[derive(Debug, Clone)]
pub struct BuildUnit {
    pub source: PathBuf,
    pub object: PathBuf,
    pub depfile: PathBuf,
    pub options: Vec<String>,
}

impl BuildUnit {
    /// Derives a build unit from a source path, or rejects it
    ///
    /// Object and dependency paths are `object_dir/{stem}.o` and `.d`.
    /// Sources without a recognized native extension are skipped with a
    /// warning; the batch continues without them.
    pub fn for_source(source: &Path, options: &[String], object_dir: &Path) -> Option<BuildUnit> {
        let stem = source.file_stem().and_then(|stem| stem.to_str());
        let extension = source.extension().and_then(|ext| ext.to_str());

        match (stem, extension) {
            (Some(stem), Some(ext)) if NATIVE_SOURCE_EXTENSIONS.contains(&ext) => Some(BuildUnit {
                source: source.to_path_buf(),
                object: object_dir.join(format!("{stem}.o")),
                depfile: object_dir.join(format!("{stem}.d")),
                options: options.to_vec(),
            }),
            _ => {
                warn!(
                    source = %source.display(),
                    "not a recognized C/C++ source file, skipping registration"
                );
                None
            }
        }
    }

    /// Directory the object file lives in
    pub fn object_dir(&self) -> &Path {
        self.object.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_object_and_depfile_paths() {
        let unit = BuildUnit::for_source(
            Path::new("math/math.c"),
            &["-MMD".to_string()],
            Path::new("Obj"),
        )
        .unwrap();

        assert_eq!(unit.object, PathBuf::from("Obj/math.o"));
        assert_eq!(unit.depfile, PathBuf::from("Obj/math.d"));
        assert_eq!(unit.options, vec!["-MMD".to_string()]);
        assert_eq!(unit.object_dir(), Path::new("Obj"));
    }

    #[test]
    fn accepts_cpp_sources() {
        assert!(BuildUnit::for_source(Path::new("a.cpp"), &[], Path::new("Obj")).is_some());
    }

    #[test]
    fn rejects_unknown_extensions() {
        assert!(BuildUnit::for_source(Path::new("notes.txt"), &[], Path::new("Obj")).is_none());
        assert!(BuildUnit::for_source(Path::new("header.h"), &[], Path::new("Obj")).is_none());
        assert!(BuildUnit::for_source(Path::new("no_extension"), &[], Path::new("Obj")).is_none());
    }
}
