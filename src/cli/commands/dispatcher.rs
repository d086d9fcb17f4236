//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::{load_config, ProvisionConfig};
use crate::error::Result;
use crate::host::HostContext;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    host: HostContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root and host.
    pub fn new(project_root: PathBuf, host: HostContext) -> Self {
        Self {
            project_root,
            config_path: None,
            host,
        }
    }

    /// Use an explicit config file instead of `.hostprep/config.yml`.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Load the configuration and apply its host overrides.
    pub fn load(&self) -> Result<(HostContext, ProvisionConfig)> {
        let config = load_config(&self.project_root, self.config_path.as_deref())?;
        let host = match &config.settings.os_release_path {
            Some(path) => self.host.clone().with_os_release_path(path),
            None => self.host.clone(),
        };
        Ok((host, config))
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if let Some(Commands::Completions(args)) = &cli.command {
            return super::completions::CompletionsCommand::new(args.clone()).execute(ui);
        }

        let (host, config) = self.load()?;
        match &cli.command {
            Some(Commands::Detect(args)) => {
                super::detect::DetectCommand::new(&host, args.clone()).execute(ui)
            }
            Some(Commands::Run(args)) => {
                super::run::RunCommand::new(&self.project_root, &host, &config, args.clone())
                    .execute(ui)
            }
            Some(Commands::Completions(_)) | None => {
                super::run::RunCommand::new(&self.project_root, &host, &config, RunArgs::default())
                    .execute(ui)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn host() -> HostContext {
        HostContext {
            kernel_name: "Linux".into(),
            arch: "x86_64".into(),
            os_release_path: PathBuf::from("/etc/os-release"),
            home: PathBuf::from("/home/dev"),
            shell: None,
            is_root: false,
            path_var: String::new(),
            is_ci: true,
            target_arch: None,
            publish: false,
        }
    }

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn load_without_config_keeps_host() {
        let temp = TempDir::new().unwrap();
        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf(), host());

        let (host, config) = dispatcher.load().unwrap();

        assert_eq!(host.os_release_path, PathBuf::from("/etc/os-release"));
        assert_eq!(config, ProvisionConfig::default());
        assert_eq!(dispatcher.project_root(), temp.path());
    }

    #[test]
    fn load_applies_os_release_override() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("custom.yml");
        fs::write(
            &config_path,
            "settings:\n  os_release_path: /tmp/fake-os-release\n",
        )
        .unwrap();

        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf(), host())
            .with_config_path(Some(config_path));
        let (host, _) = dispatcher.load().unwrap();

        assert_eq!(host.os_release_path, PathBuf::from("/tmp/fake-os-release"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf(), host())
            .with_config_path(Some(temp.path().join("nope.yml")));
        assert!(dispatcher.load().is_err());
    }
}
