//! Interactive prompts.
//!
//! Prompts are drawn on stderr so stdout carries only command output.

use console::Term;
use dialoguer::Confirm;

use crate::error::{ProvisionError, Result};

use super::Prompt;

/// Terminal prompts are drawn on.
pub fn prompt_term() -> Term {
    Term::stderr()
}

/// Ask a yes/no question on the prompt terminal.
pub fn ask_confirm(prompt: &Prompt) -> Result<bool> {
    Confirm::new()
        .with_prompt(&prompt.question)
        .default(prompt.default)
        .interact_on(&prompt_term())
        .map_err(|e| ProvisionError::Io(e.into()))
}
