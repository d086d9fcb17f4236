//! Persistent environment bindings.
//!
//! An [`EnvironmentBinding`] is an `export NAME=value` line that must be
//! present in some file: a shell startup file or a project `.env`.
//! [`ensure_binding`] reads the file first and only appends when an
//! identical assignment isn't already there, so re-running never stacks
//! duplicate exports.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::EnvFileParser;
use crate::error::{ProvisionError, Result};
use crate::host::HostContext;
use crate::shell::ShellType;

/// A variable assignment persisted to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentBinding {
    pub variable_name: String,
    /// Value as the shell should see it; `$VAR` references are kept.
    pub value: String,
    pub persist_file: PathBuf,
}

/// Result of [`ensure_binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingOutcome {
    Appended,
    AlreadyPresent,
}

impl EnvironmentBinding {
    pub fn new(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        persist_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            value: value.into(),
            persist_file: persist_file.into(),
        }
    }

    /// The line written to the file.
    ///
    /// Values with characters the shell would split or glob are
    /// double-quoted so `$VAR` references still expand.
    pub fn export_line(&self) -> String {
        let plain = self
            .value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:@%,".contains(c));
        if plain && !self.value.is_empty() {
            format!("export {}={}", self.variable_name, self.value)
        } else {
            format!(
                "export {}=\"{}\"",
                self.variable_name,
                self.value.replace('"', "\\\"")
            )
        }
    }

    /// `PATH` lines accumulate, so any matching line counts. For every
    /// other variable the last assignment is the one the shell keeps.
    fn is_satisfied_by(&self, content: &str) -> bool {
        let entries = EnvFileParser::entries(content);
        let mut assigned = entries
            .iter()
            .filter(|(name, _)| *name == self.variable_name);
        if self.variable_name == "PATH" {
            assigned.any(|(_, value)| *value == self.value)
        } else {
            assigned.last().is_some_and(|(_, value)| *value == self.value)
        }
    }
}

/// Append `binding` to its file unless an identical assignment exists.
///
/// Creates the file when missing. A file without a trailing newline gets
/// one before the appended line.
pub fn ensure_binding(binding: &EnvironmentBinding) -> Result<BindingOutcome> {
    let path = &binding.persist_file;
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };

    if binding.is_satisfied_by(&existing) {
        tracing::debug!(
            "{} already set in {}",
            binding.variable_name,
            path.display()
        );
        return Ok(BindingOutcome::AlreadyPresent);
    }

    let mut line = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        line.push('\n');
    }
    line.push_str(&binding.export_line());
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    tracing::info!("Added {} to {}", binding.variable_name, path.display());
    Ok(BindingOutcome::Appended)
}

/// The shell startup file for the host's login shell.
///
/// # Errors
///
/// `UnknownShell` for anything but zsh and bash, including an unset
/// `$SHELL`.
pub fn startup_file_for(host: &HostContext) -> Result<PathBuf> {
    let shell = host.shell.clone().unwrap_or_default();
    ShellType::from_executable(&shell)
        .startup_file(&host.home)
        .ok_or(ProvisionError::UnknownShell { shell })
}

/// `PATH` value that appends `dir`, written relative to `$HOME` when
/// possible.
pub fn path_value(host: &HostContext, dir: &Path) -> String {
    let dir = match dir.strip_prefix(&host.home) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            format!("$HOME/{}", relative.display())
        }
        _ => dir.display().to_string(),
    };
    format!("$PATH:{}", dir)
}

/// Configures the user's shell startup file.
pub struct ShellProfileConfigurator<'a> {
    host: &'a HostContext,
}

impl<'a> ShellProfileConfigurator<'a> {
    pub fn new(host: &'a HostContext) -> Self {
        Self { host }
    }

    /// Make `dir` part of `PATH` in future shells.
    ///
    /// Returns the binding alongside the outcome so callers can print
    /// manual instructions when the shell is unknown.
    pub fn ensure_path_entry(&self, dir: &Path) -> Result<(EnvironmentBinding, BindingOutcome)> {
        let startup = startup_file_for(self.host)?;
        let binding = EnvironmentBinding::new("PATH", path_value(self.host, dir), startup);
        let outcome = ensure_binding(&binding)?;
        Ok((binding, outcome))
    }

    /// Command the user runs to pick up the changes in the current shell.
    pub fn reload_hint(&self) -> String {
        match startup_file_for(self.host) {
            Ok(path) => format!("source {}", path.display()),
            Err(_) => "restart your shell".to_string(),
        }
    }
}
