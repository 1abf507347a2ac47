use incremake::cli::CliArgs;
use incremake::runner::{self, BuildSession, ModuleResult, RunMode, RunRequest};
use incremake::util::logging::{self, LoggingConfig};
use incremake::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("incremake v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    std::process::exit(run(&args));
}

fn run(args: &CliArgs) -> i32 {
    let modules = match runner::resolve_modules(&args.test_root, &args.module) {
        Ok(modules) => modules,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    if modules.is_empty() {
        eprintln!(
            "No test module found under {}. Please input the test module as the first parameter.",
            args.test_root.display()
        );
        return 1;
    }

    let request = RunRequest {
        test_root: args.test_root.clone(),
        modules,
        mode: args.mode,
        global_config: args.global_config.clone(),
        harness_dir: args.harness.clone(),
    };

    let session = BuildSession::new();
    let results = match session.run(&request) {
        Ok(results) => results,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    for result in &results {
        print_module_result(args.mode, result);
    }

    if let Some(coverage_out) = &args.coverage_out {
        if let Err(err) = runner::generate_coverage_report(&args.test_root, coverage_out) {
            eprintln!("{err}");
            return 1;
        }
    }

    let all_valid = results.iter().all(|result| result.executable_valid);
    if args.mode == RunMode::Clear || all_valid {
        0
    } else {
        1
    }
}

fn print_module_result(mode: RunMode, result: &ModuleResult) {
    if mode == RunMode::Clear {
        println!("\n***** Clear Done  *****\n");
        return;
    }

    if result.executable_valid {
        println!("\n***** Now execute {} test code! *****\n", result.module);
        for line in &result.test_output {
            println!("{line}");
        }
    } else {
        println!("\n***** Some Errors detected...  *****\n");
    }
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        logging::parse_level(level_str).unwrap_or_else(|| {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        })
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        env::var("INCREMAKE_LOG_LEVEL")
            .ok()
            .and_then(|value| logging::parse_level(&value))
            .unwrap_or(Level::INFO)
    };

    logging::init_logging(&LoggingConfig::with_level(level));
}
