//! External tool invocation and output classification
//!
//! Compilers and linkers are opaque processes: the engine runs them,
//! captures their merged stdout/stderr, and classifies success by looking
//! for the substring `"error"` in the captured text. The exit status is
//! logged for diagnostics but never drives the pass/fail decision, because
//! some toolchains exit non-zero for warnings; downstream tooling relies on
//! the textual rule.
//!
//! A process that cannot even be spawned (compiler not installed) is
//! reported as synthesized output text that the same classifier marks as a
//! failure.

use std::process::Command;
use tracing::debug;

/// Captured result of one tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// The command line, as displayed to the user
    pub command: String,
    /// Merged stdout/stderr text
    pub text: String,
}

impl ToolOutput {
    /// True iff the captured text matches the error classifier
    pub fn indicates_error(&self) -> bool {
        message_indicates_error(&self.text)
    }
}

/// The sole success/failure signal for subprocess invocations:
/// a case-sensitive substring search for `"error"`.
pub fn message_indicates_error(message: &str) -> bool {
    message.contains("error")
}

/// Runs `program` with `args`, blocking until it exits
///
/// Stdout and stderr are both captured and concatenated. A non-zero exit
/// does not abort the build; a spawn failure is folded into the output text.
pub fn run_tool(program: &str, args: &[String]) -> ToolOutput {
    let command = display_command(program, args);
    debug!(%command, "invoking external tool");

    match Command::new(program).args(args).output() {
        Ok(output) => {
            debug!(status = ?output.status.code(), "external tool exited");
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            ToolOutput { command, text }
        }
        Err(spawn_err) => ToolOutput {
            command,
            text: format!("error: failed to invoke '{program}': {spawn_err}\n"),
        },
    }
}

/// Renders a program and its arguments as one displayable line
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
