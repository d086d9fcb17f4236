//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::Result;

use super::{parse_answer, OutputMode, Prompt, SpinnerHandle, UserInterface};

/// Prefix of environment variables that answer prompts, e.g.
/// `HOSTPREP_PROMPT_UNSUPPORTED_PLATFORM=yes`.
pub const PROMPT_ENV_PREFIX: &str = "HOSTPREP_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `HOSTPREP_PROMPT_<KEY>` variables, falling
/// back to the prompt's default.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.prints_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.prints_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.prints_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        let answer = self
            .env_overrides
            .get(&env_key)
            .and_then(|value| parse_answer(value))
            .unwrap_or(prompt.default);

        if self.mode.prints_status() {
            println!(
                "{} [non-interactive: {}]",
                prompt.question,
                if answer { "yes" } else { "no" }
            );
        }
        Ok(answer)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.prints_status() {
            println!("  {}", message);
        }
        Box::new(NoopSpinner {
            show: self.mode.prints_status(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.prints_status() {
            println!("\n{}\n", title);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints only the final line.
struct NoopSpinner {
    show: bool,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn finish_skipped(&mut self, msg: &str) {
        if self.show {
            println!("○ {}", msg);
        }
    }

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(default: bool) -> Prompt {
        Prompt::new("unsupported_platform", "Attempt anyway?", default)
    }

    #[test]
    fn confirm_uses_default_without_override() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        assert!(!ui.confirm(&prompt(false)).unwrap());
        assert!(ui.confirm(&prompt(true)).unwrap());
    }

    #[test]
    fn confirm_reads_env_override() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "HOSTPREP_PROMPT_UNSUPPORTED_PLATFORM".to_string(),
            "yes".to_string(),
        );
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);
        assert!(ui.confirm(&prompt(false)).unwrap());
    }

    #[test]
    fn unparseable_override_falls_back_to_default() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "HOSTPREP_PROMPT_UNSUPPORTED_PLATFORM".to_string(),
            "perhaps".to_string(),
        );
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);
        assert!(!ui.confirm(&prompt(false)).unwrap());
    }

    #[test]
    fn is_not_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.is_interactive());
    }
}
