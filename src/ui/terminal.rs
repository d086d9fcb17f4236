//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;

use super::{
    ask_confirm, NonInteractiveUI, OutputMode, ProgressSpinner, Prompt, SpinnerHandle, Theme,
    UserInterface,
};

/// UI for a person at a terminal: colored status lines, spinners and
/// real confirmation prompts.
///
/// Messages and successes go to stdout. Warnings, errors and prompts go
/// to stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: Theme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode) -> Self {
        let out = Term::stdout();
        Self {
            theme: Theme::for_term(&out),
            err: Term::stderr(),
            out,
            mode,
        }
    }

    fn status(&self, line: String) {
        if self.mode.prints_status() {
            writeln!(&self.out, "{}", line).ok();
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.status(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.status(self.theme.format_success(msg));
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.prints_status() {
            writeln!(&self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(&self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn confirm(&mut self, prompt: &Prompt) -> Result<bool> {
        ask_confirm(prompt)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.animates() {
            return Box::new(ProgressSpinner::new(message, self.theme.clone()));
        }
        self.status(self.theme.dim.apply_to(message).to_string());
        Box::new(ProgressSpinner::hidden())
    }

    fn show_header(&mut self, title: &str) {
        self.status(format!("\n{}\n", self.theme.format_section(title)));
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Pick the UI for this run.
///
/// The terminal UI needs stderr to be a terminal, since that is where
/// prompts and spinners are drawn.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stderr().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_request_never_prompts() {
        let ui = create_ui(false, OutputMode::Silent);
        assert!(!ui.is_interactive());
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }

    #[test]
    fn terminal_ui_keeps_its_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet);
        assert!(ui.is_interactive());
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }
}
