//! Command runner abstraction.
//!
//! Provisioning steps never spawn processes directly; they go through
//! [`CommandRunner`] so tests can substitute [`MockRunner`](super::MockRunner)
//! and assert on exactly which commands a run would issue.

use crate::error::Result;

use super::command::{execute, CommandOptions, CommandResult};

/// Executes shell command lines.
pub trait CommandRunner {
    /// Run `command` with `options`.
    ///
    /// A non-zero exit is reported through [`CommandResult::success`], not
    /// as an `Err`; `Err` means the command could not be started at all.
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult>;

    /// Run with captured output and default options.
    fn run_captured(&self, command: &str) -> Result<CommandResult> {
        self.run(command, &CommandOptions::captured())
    }
}

/// Runs commands on the real host.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    show_output: bool,
}

impl SystemRunner {
    /// Create a runner.
    ///
    /// With `show_output`, child output streams straight to the terminal
    /// instead of being captured for error messages.
    pub fn new(show_output: bool) -> Self {
        Self { show_output }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult> {
        if self.show_output {
            let mut streamed = options.clone();
            streamed.capture_stdout = false;
            streamed.capture_stderr = false;
            execute(command, &streamed)
        } else {
            execute(command, options)
        }
    }
}
