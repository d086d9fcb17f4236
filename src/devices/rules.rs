//! Writing device permission rules and reloading the device manager.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};
use crate::platform::{PlatformProfile, PrivilegeContext};
use crate::shell::{quote_arg, CommandOptions, CommandRunner};

use super::catalog::DeviceRule;

/// Command that makes the device manager re-read its rules.
pub const RELOAD_COMMANDS: [&str; 2] = ["udevadm control --reload-rules", "udevadm trigger"];

/// What a rules installation did.
#[derive(Debug, Default)]
pub struct RulesReport {
    /// Files overwritten, in write order.
    pub files_written: Vec<PathBuf>,
    /// Files skipped because their directory doesn't exist.
    pub skipped: Vec<PathBuf>,
    /// The reload failure, if any. Never fatal.
    pub reload_error: Option<ProvisionError>,
}

impl RulesReport {
    pub fn reloaded(&self) -> bool {
        !self.files_written.is_empty() && self.reload_error.is_none()
    }
}

/// Render the contents of each target file.
///
/// Files appear in the order their first rule does; lines keep catalog
/// order with repeats dropped, each newline terminated.
pub fn render_files(rules: &[DeviceRule]) -> Vec<(PathBuf, String)> {
    let mut files: Vec<(PathBuf, Vec<&str>)> = Vec::new();
    for rule in rules {
        let index = match files.iter().position(|(path, _)| *path == rule.target_file) {
            Some(index) => index,
            None => {
                files.push((rule.target_file.clone(), Vec::new()));
                files.len() - 1
            }
        };
        let lines = &mut files[index].1;
        if !lines.contains(&rule.rule_line.as_str()) {
            lines.push(&rule.rule_line);
        }
    }

    files
        .into_iter()
        .map(|(path, lines)| {
            let mut content = lines.join("\n");
            content.push('\n');
            (path, content)
        })
        .collect()
}

/// Installs device permission rules on Linux hosts.
pub struct DeviceRuleInstaller<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> DeviceRuleInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Overwrite every target file with its rendered rules, then reload.
    ///
    /// Does nothing off Linux. Re-running produces identical files.
    ///
    /// # Errors
    ///
    /// `DeviceRuleWrite` if a file can't be written directly or through the
    /// elevation helper. A failed reload is reported in
    /// [`RulesReport::reload_error`] instead.
    pub fn install_rules(
        &self,
        rules: &[DeviceRule],
        profile: &PlatformProfile,
        privilege: &PrivilegeContext,
    ) -> Result<RulesReport> {
        let mut report = RulesReport::default();
        if !profile.is_linux() {
            tracing::debug!("Skipping device rules on {}", profile.os_family);
            return Ok(report);
        }

        for (path, content) in render_files(rules) {
            let dir_exists = path.parent().is_some_and(Path::is_dir);
            if !dir_exists {
                tracing::warn!(
                    "Rules directory for {} does not exist; skipping",
                    path.display()
                );
                report.skipped.push(path);
                continue;
            }

            self.write_file(&path, &content, privilege)?;
            tracing::info!("Wrote {}", path.display());
            report.files_written.push(path);
        }

        if !report.files_written.is_empty() {
            if let Err(err) = self.reload(privilege) {
                tracing::warn!("{}", err);
                report.reload_error = Some(err);
            }
        }

        Ok(report)
    }

    fn write_file(&self, path: &Path, content: &str, privilege: &PrivilegeContext) -> Result<()> {
        match fs::write(path, content) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::PermissionDenied && !privilege.is_root => {
                tracing::debug!("Writing {} through elevation helper", path.display());
                self.write_privileged(path, content, privilege)
            }
            Err(err) => Err(ProvisionError::DeviceRuleWrite {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    fn write_privileged(
        &self,
        path: &Path,
        content: &str,
        privilege: &PrivilegeContext,
    ) -> Result<()> {
        let target = path.to_string_lossy();
        let command = format!(
            "{} > /dev/null",
            privilege.wrap(&format!("tee {}", quote_arg(&target)))
        );
        let options = CommandOptions::captured().with_stdin(content);
        let result = self.runner.run(&command, &options)?;
        if result.success {
            Ok(())
        } else {
            Err(ProvisionError::DeviceRuleWrite {
                path: path.to_path_buf(),
                message: result.failure_summary(),
            })
        }
    }

    /// Ask the device manager to reload rules and re-trigger devices.
    pub fn reload(&self, privilege: &PrivilegeContext) -> Result<()> {
        let command = RELOAD_COMMANDS
            .iter()
            .map(|c| privilege.wrap(c))
            .collect::<Vec<_>>()
            .join(" && ");
        let result = self.runner.run(&command, &CommandOptions::captured())?;
        if result.success {
            Ok(())
        } else {
            Err(ProvisionError::DeviceManagerReload {
                message: result.failure_summary(),
            })
        }
    }
}
