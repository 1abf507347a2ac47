//! End-to-end engine tests against a real C toolchain
//!
//! These tests drive `cc` on a small two-unit fixture (a main program and a
//! math helper behind a header) inside a temp tree, exercising the full
//! Clear/Build/Make flow: full rebuilds, no-op incremental makes, header
//! touches, injected compile errors and relinking after a deleted target.
//!
//! They run serially; the engine contract is one build in flight at a time.

use incremake::engine::{
    Build, CompileStatus, ExecutableStatus, LinkStatus, UnitOutcome, WholeCompileStatus,
};
use incremake::timestamp::TimestampCache;

use anyhow::Result;
use filetime::FileTime;
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const OPTIONS: &[&str] = &["-MMD", "-Wall", "-O2"];

const MAIN_C: &str = "\
#include <stdio.h>

int add(int a, int b);

int main(void) {
    printf(\"sum=%d\\n\", add(1, 2));
    return 0;
}
";

const MATH_C: &str = "\
#include \"math.h\"

int add(int a, int b) {
    return a + b;
}
";

const MATH_H: &str = "\
#ifndef MATH_H
#define MATH_H

int add(int a, int b);

#endif
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Result<Fixture> {
        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join("math"))?;
        fs::write(dir.path().join("main.c"), MAIN_C)?;
        fs::write(dir.path().join("math/math.c"), MATH_C)?;
        fs::write(dir.path().join("math/math.h"), MATH_H)?;
        Ok(Fixture { dir })
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn build(&self) -> Build {
        let options: Vec<String> = OPTIONS.iter().map(|opt| opt.to_string()).collect();
        let mut build = Build::new(
            self.path("Obj/test_bin"),
            "cc",
            vec![self.path("math")],
            options.clone(),
        );
        build.add_sources(
            &[self.path("main.c"), self.path("math/math.c")],
            &options,
            &self.path("Obj"),
        );
        // Keep test logs quiet; everything needed is in the report.
        build.set_output_sink(Box::new(|_| {}));
        build
    }

    /// Pushes a file's mtime past the newest object file
    fn touch_after_objects(&self, rel: &str) -> Result<()> {
        let object_mtime = fs::metadata(self.path("Obj/math.o"))?.modified()?;
        let bumped = FileTime::from_system_time(object_mtime + Duration::from_secs(10));
        filetime::set_file_mtime(self.path(rel), bumped)?;
        Ok(())
    }
}

fn outcome_for<'a>(
    report: &'a incremake::engine::MakeReport,
    object: &Path,
) -> &'a UnitOutcome {
    &report
        .units
        .iter()
        .find(|unit| unit.object == object)
        .expect("unit present in report")
        .outcome
}

#[test]
#[serial]
fn build_produces_valid_executable_and_make_is_a_no_op() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut build = fixture.build();

    let report = build.build(&mut TimestampCache::new())?;
    assert_eq!(report.compile, WholeCompileStatus::NoCompileError);
    assert_eq!(report.link, LinkStatus::Succeeded);
    assert_eq!(report.executable, ExecutableStatus::Valid);
    assert!(fixture.path("Obj/main.o").exists());
    assert!(fixture.path("Obj/math.o").exists());
    assert!(fixture.path("Obj/main.d").exists());
    assert!(fixture.path("Obj/math.d").exists());
    assert!(fixture.path("Obj/test_bin").exists());

    // Nothing changed: every unit skipped, link skipped, still valid.
    let report = build.make(&mut TimestampCache::new());
    assert_eq!(report.compile, WholeCompileStatus::NoCompiledFile);
    assert_eq!(report.link, LinkStatus::Skipped);
    assert_eq!(report.executable, ExecutableStatus::Valid);
    assert!(report
        .units
        .iter()
        .all(|unit| matches!(unit.outcome, UnitOutcome::Skipped)));
    Ok(())
}

#[test]
#[serial]
fn touched_header_recompiles_only_its_dependents() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut build = fixture.build();
    build.build(&mut TimestampCache::new())?;

    // Only math.c's dependency record names math.h.
    fixture.touch_after_objects("math/math.h")?;

    let report = build.make(&mut TimestampCache::new());
    assert_eq!(report.compile, WholeCompileStatus::NoCompileError);
    assert_eq!(report.link, LinkStatus::Succeeded);
    assert_eq!(report.executable, ExecutableStatus::Valid);
    assert!(matches!(
        outcome_for(&report, &fixture.path("Obj/main.o")),
        UnitOutcome::Skipped
    ));
    assert!(matches!(
        outcome_for(&report, &fixture.path("Obj/math.o")),
        UnitOutcome::Compiled {
            status: CompileStatus::Succeeded,
            ..
        }
    ));
    Ok(())
}

#[test]
#[serial]
fn injected_compile_error_invalidates_and_skips_linking() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut build = fixture.build();
    build.build(&mut TimestampCache::new())?;

    fs::write(fixture.path("math/math.c"), "this is not a C program\n")?;
    fixture.touch_after_objects("math/math.c")?;

    let report = build.make(&mut TimestampCache::new());
    assert_eq!(report.compile, WholeCompileStatus::AtLeastOneCompileError);
    assert_eq!(report.link, LinkStatus::Skipped);
    assert_eq!(report.executable, ExecutableStatus::Invalid);

    // The failing unit is identifiable and carries the compiler's message.
    match outcome_for(&report, &fixture.path("Obj/math.o")) {
        UnitOutcome::Compiled {
            status: CompileStatus::Error,
            output,
        } => assert!(output.contains("error")),
        other => panic!("expected a compile error, got {other:?}"),
    }
    Ok(())
}

#[test]
#[serial]
fn missing_target_forces_relink_without_recompiling() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut build = fixture.build();
    build.build(&mut TimestampCache::new())?;

    fs::remove_file(fixture.path("Obj/test_bin"))?;

    let report = build.make(&mut TimestampCache::new());
    assert_eq!(report.compile, WholeCompileStatus::NoCompiledFile);
    assert_eq!(report.link, LinkStatus::Succeeded);
    assert_eq!(report.executable, ExecutableStatus::Valid);
    assert!(fixture.path("Obj/test_bin").exists());
    Ok(())
}

#[test]
#[serial]
fn clear_removes_every_artifact() -> Result<()> {
    let fixture = Fixture::new()?;
    let mut build = fixture.build();
    build.build(&mut TimestampCache::new())?;
    assert!(fixture.path("Obj/main.o").exists());

    build.clear()?;
    assert!(!fixture.path("Obj/main.o").exists());
    assert!(!fixture.path("Obj/math.o").exists());
    assert!(!fixture.path("Obj/main.d").exists());
    assert!(!fixture.path("Obj/test_bin").exists());
    Ok(())
}
