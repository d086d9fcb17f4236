//! Colors and status glyphs.

use console::{Style, Term};

/// Styles for status lines.
#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Secondary text such as skipped steps and elapsed times.
    pub dim: Style,
    /// The `==>` marker in front of section titles.
    pub accent: Style,
}

impl Theme {
    /// Colored theme when `term` is a terminal and `NO_COLOR` is unset.
    pub fn for_term(term: &Term) -> Self {
        if colors_enabled(term) {
            Self {
                success: Style::new().green(),
                warning: Style::new().yellow(),
                error: Style::new().red().bold(),
                dim: Style::new().dim(),
                accent: Style::new().blue().bold(),
            }
        } else {
            Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            accent: Style::new(),
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        self.success.apply_to(format!("✓ {}", msg)).to_string()
    }

    pub fn format_warning(&self, msg: &str) -> String {
        self.warning.apply_to(format!("⚠ {}", msg)).to_string()
    }

    pub fn format_error(&self, msg: &str) -> String {
        self.error.apply_to(format!("✗ {}", msg)).to_string()
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        self.dim.apply_to(format!("○ {}", msg)).to_string()
    }

    /// Section title, e.g. `==> Provisioning development host`.
    pub fn format_section(&self, title: &str) -> String {
        format!("{} {}", self.accent.apply_to("==>"), title)
    }
}

/// Colors are used only on a terminal, and never when `NO_COLOR` is set.
///
/// `--no-color` sets `NO_COLOR` at startup.
pub fn colors_enabled(term: &Term) -> bool {
    std::env::var_os("NO_COLOR").is_none() && term.is_term()
}
