//! Mock command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning anything.
//! Every command line is recorded; results are chosen by the first
//! configured rule whose pattern is a substring of the command.
//!
//! # Example
//!
//! ```
//! use hostprep::shell::{CommandRunner, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.fail_on("apt-get update", 100);
//!
//! assert!(runner.run_captured("apt-get install -y git").unwrap().success);
//! assert!(!runner.run_captured("apt-get update").unwrap().success);
//! assert_eq!(runner.commands().len(), 2);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::Result;

use super::command::{CommandOptions, CommandResult};
use super::runner::CommandRunner;

#[derive(Debug)]
struct Rule {
    pattern: String,
    results: VecDeque<CommandResult>,
    fallback: CommandResult,
}

/// A command invocation captured by [`MockRunner`].
#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub command: String,
    pub cwd: Option<std::path::PathBuf>,
    pub stdin: Option<String>,
}

/// Mock runner that records commands and returns scripted results.
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: RefCell<Vec<Rule>>,
    recorded: RefCell<Vec<RecordedCommand>>,
}

impl MockRunner {
    /// Create a runner where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands matching `pattern` always exit with `code`.
    pub fn fail_on(&self, pattern: &str, code: i32) {
        self.push_rule(pattern, VecDeque::new(), failed(code));
    }

    /// Commands matching `pattern` fail `times` times, then succeed.
    pub fn fail_times(&self, pattern: &str, times: usize, code: i32) {
        let results = (0..times).map(|_| failed(code)).collect();
        self.push_rule(pattern, results, succeeded(String::new()));
    }

    /// Commands matching `pattern` succeed with `stdout`.
    pub fn respond(&self, pattern: &str, stdout: &str) {
        self.push_rule(pattern, VecDeque::new(), succeeded(stdout.to_string()));
    }

    fn push_rule(&self, pattern: &str, results: VecDeque<CommandResult>, fallback: CommandResult) {
        self.rules.borrow_mut().push(Rule {
            pattern: pattern.to_string(),
            results,
            fallback,
        });
    }

    /// All recorded commands, in order.
    pub fn commands(&self) -> Vec<String> {
        self.recorded
            .borrow()
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    /// All recorded invocations with their options.
    pub fn invocations(&self) -> Vec<RecordedCommand> {
        self.recorded.borrow().clone()
    }

    /// Whether any recorded command contains `fragment`.
    pub fn ran(&self, fragment: &str) -> bool {
        self.recorded
            .borrow()
            .iter()
            .any(|r| r.command.contains(fragment))
    }

    /// Number of recorded commands containing `fragment`.
    pub fn count(&self, fragment: &str) -> usize {
        self.recorded
            .borrow()
            .iter()
            .filter(|r| r.command.contains(fragment))
            .count()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult> {
        self.recorded.borrow_mut().push(RecordedCommand {
            command: command.to_string(),
            cwd: options.cwd.clone(),
            stdin: options.stdin.clone(),
        });

        let mut rules = self.rules.borrow_mut();
        let result = match rules.iter_mut().find(|r| command.contains(&r.pattern)) {
            Some(rule) => rule
                .results
                .pop_front()
                .unwrap_or_else(|| rule.fallback.clone()),
            None => succeeded(String::new()),
        };
        Ok(result)
    }
}

fn succeeded(stdout: String) -> CommandResult {
    CommandResult::success(stdout, String::new(), Duration::ZERO)
}

fn failed(code: i32) -> CommandResult {
    CommandResult::failure(
        Some(code),
        String::new(),
        format!("mock failure ({})", code),
        Duration::ZERO,
    )
}
