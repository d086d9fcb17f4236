//! User interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI/headless environments
//! - [`MockUI`] for tests
//!
//! # Example
//!
//! ```
//! use hostprep::ui::{create_ui, OutputMode};
//!
//! // Use non-interactive mode for testability
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("Provisioning");
//! ui.success("Host ready");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod progress;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use progress::{format_duration, format_elapsed};
pub use prompts::{ask_confirm, prompt_term};
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{colors_enabled, Theme};

use crate::error::Result;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &Prompt) -> Result<bool>;

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);

    /// Mark as skipped.
    fn finish_skipped(&mut self, msg: &str);

    /// Remove the spinner without printing a final line.
    fn clear(&mut self);
}

/// A yes/no question.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Unique key, used for `HOSTPREP_PROMPT_<KEY>` overrides and test lookup.
    pub key: String,
    /// The question to display.
    pub question: String,
    /// Answer used when the user just presses enter or can't be asked.
    pub default: bool,
}

impl Prompt {
    /// Create a prompt.
    pub fn new(key: &str, question: impl Into<String>, default: bool) -> Self {
        Self {
            key: key.to_string(),
            question: question.into(),
            default,
        }
    }
}

/// Interpret a textual answer as yes/no.
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_new_sets_fields() {
        let prompt = Prompt::new("unsupported_platform", "Continue?", false);
        assert_eq!(prompt.key, "unsupported_platform");
        assert_eq!(prompt.question, "Continue?");
        assert!(!prompt.default);
    }

    #[test]
    fn parse_answer_accepts_common_forms() {
        assert_eq!(parse_answer("Y"), Some(true));
        assert_eq!(parse_answer("yes"), Some(true));
        assert_eq!(parse_answer("1"), Some(true));
        assert_eq!(parse_answer("n"), Some(false));
        assert_eq!(parse_answer(" No "), Some(false));
        assert_eq!(parse_answer("maybe"), None);
    }
}
