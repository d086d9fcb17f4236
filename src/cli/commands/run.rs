//! Run command implementation.
//!
//! The `hostprep run` command provisions the host. It is also what a bare
//! `hostprep` invocation does.

use std::path::{Path, PathBuf};

use crate::cli::args::RunArgs;
use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::host::HostContext;
use crate::orchestrator::{ProvisionOrchestrator, RunOptions, RunReport, StepOutcome};
use crate::runtime::{HttpFetcher, ScriptFetcher};
use crate::shell::{CommandRunner, SystemRunner};
use crate::ui::{format_duration, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand<'a> {
    project_root: PathBuf,
    host: &'a HostContext,
    config: &'a ProvisionConfig,
    args: RunArgs,
}

impl<'a> RunCommand<'a> {
    /// Create a new run command.
    pub fn new(
        project_root: &Path,
        host: &'a HostContext,
        config: &'a ProvisionConfig,
        args: RunArgs,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            host,
            config,
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Run against the given command runner and script fetcher.
    pub fn execute_with(
        &self,
        runner: &dyn CommandRunner,
        fetcher: &dyn ScriptFetcher,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let options = RunOptions {
            assume_yes: self.args.yes,
            project_root: self.project_root.clone(),
        };
        let orchestrator =
            ProvisionOrchestrator::new(self.host, self.config, runner, fetcher, options);
        let outcome = orchestrator.execute(ui);

        if self.args.json {
            let json = serde_json::to_string_pretty(&outcome.report)
                .map_err(|e| anyhow::anyhow!("Failed to serialize run report: {}", e))?;
            println!("{}", json);
        } else {
            show_summary(&outcome.report, ui);
        }

        match outcome.error {
            Some(err) => {
                ui.error(&err.to_string());
                Ok(CommandResult::failure(1))
            }
            None => Ok(CommandResult::success()),
        }
    }
}

impl Command for RunCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let runner = SystemRunner::new(ui.output_mode().streams_commands());
        let fetcher = HttpFetcher::new()?;
        self.execute_with(&runner, &fetcher, ui)
    }
}

fn show_summary(report: &RunReport, ui: &mut dyn UserInterface) {
    let completed = report.steps_with(StepOutcome::Success).len();
    let failed = report.steps_with(StepOutcome::Failed);
    let duration = format_duration(std::time::Duration::from_secs_f64(report.total_seconds));

    if report.success {
        ui.message(&format!("{} steps completed in {}", completed, duration));
    } else if let Some(step) = failed.last() {
        ui.message(&format!(
            "Stopped at '{}' after {} ({} steps completed)",
            step, duration, completed
        ));
    }
    if !report.warnings.is_empty() {
        ui.message(&format!("{} warning(s) during the run", report.warnings.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticFetcher;
    use crate::shell::MockRunner;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn unreadable_host(temp: &TempDir) -> HostContext {
        HostContext {
            kernel_name: "Linux".into(),
            arch: "x86_64".into(),
            os_release_path: temp.path().join("missing-os-release"),
            home: temp.path().to_path_buf(),
            shell: None,
            is_root: true,
            path_var: String::new(),
            is_ci: true,
            target_arch: None,
            publish: false,
        }
    }

    #[test]
    fn fatal_error_maps_to_exit_code_one() {
        let temp = TempDir::new().unwrap();
        let host = unreadable_host(&temp);
        let config = ProvisionConfig::default();
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::new("echo");
        let mut ui = MockUI::new();

        let cmd = RunCommand::new(temp.path(), &host, &config, RunArgs::default());
        let result = cmd.execute_with(&runner, &fetcher, &mut ui).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("detect platform"));
        assert!(ui.has_message("Stopped at 'detect platform'"));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn unsupported_platform_declined_in_non_interactive_mode() {
        let temp = TempDir::new().unwrap();
        let os_release = temp.path().join("os-release");
        fs::write(
            &os_release,
            "ID=debian\nVERSION_ID=\"11\"\nVERSION_CODENAME=bullseye\n",
        )
        .unwrap();
        let mut host = unreadable_host(&temp);
        host.os_release_path = os_release;

        let config = ProvisionConfig::default();
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::new("echo");
        let mut ui = MockUI::new();
        ui.set_interactive(false);

        let cmd = RunCommand::new(temp.path(), &host, &config, RunArgs::default());
        let result = cmd.execute_with(&runner, &fetcher, &mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("unsupported"));
        assert!(!runner.ran("apt-get"));
    }
}
