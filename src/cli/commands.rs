use crate::runner::RunMode;
use clap::Parser;
use std::path::PathBuf;

/// Incremental compile/link engine for embedded C test harnesses
#[derive(Parser, Debug)]
#[command(
    name = "incremake",
    about = "Incremental compile/link engine for embedded C test harnesses",
    version,
    long_about = "incremake builds C/C++ test modules incrementally: it compares object \
                  files against compiler-generated dependency records and recompiles only \
                  what changed, then relinks and runs the resulting test binary.\n\n\
                  Examples:\n  \
                  incremake LedDriver\n  \
                  incremake LedDriver Build\n  \
                  incremake All Clear --test-root ./TestCode"
)]
pub struct CliArgs {
    #[arg(
        value_name = "MODULE",
        help = "Test module to process, or 'All' for every module under the test root"
    )]
    pub module: String,

    #[arg(
        value_name = "MODE",
        value_enum,
        default_value_t = RunMode::Make,
        help = "Run mode: Make (incremental), Build (full rebuild) or Clear (remove artifacts)"
    )]
    pub mode: RunMode,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "./TestCode",
        help = "Directory containing the test modules"
    )]
    pub test_root: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        help = "Test-harness directory whose sources join every module build"
    )]
    pub harness: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Global configuration applied before any module configuration"
    )]
    pub global_config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Generate a gcovr coverage report into this directory after the run"
    )]
    pub coverage_out: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}
