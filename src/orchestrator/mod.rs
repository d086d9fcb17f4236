//! Provisioning run orchestration.
//!
//! [`ProvisionOrchestrator`] runs the fixed step sequence: detect the
//! platform, then on Linux resolve privileges, install system packages and
//! device rules; on macOS install Homebrew packages. Every platform then
//! bootstraps the runtime environment, and macOS finishes by putting the
//! runtime manager on the shell's `PATH`.
//!
//! The run stops at the first fatal error. Nothing is rolled back; every
//! step is safe to repeat, so re-running resumes the work.

pub mod report;
pub mod step;

pub use report::RunReport;
pub use step::{RunTelemetry, Step, StepOutcome};

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;

use crate::config::ProvisionConfig;
use crate::devices::{default_rules, DeviceRuleInstaller};
use crate::error::{ProvisionError, Result};
use crate::host::HostContext;
use crate::packages::{batches_for, InstallReport, PackageManager, SystemPackageInstaller};
use crate::platform::{self, PlatformProfile, PrivilegeContext};
use crate::profile::{path_value, EnvironmentBinding, ShellProfileConfigurator};
use crate::retry::{retry_fixed, RetryPolicy};
use crate::runtime::{RuntimeEnvironmentBootstrapper, ScriptFetcher};
use crate::shell::CommandRunner;
use crate::ui::UserInterface;

/// Options for a provisioning run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Treat the unsupported-platform prompt as answered "yes".
    pub assume_yes: bool,
    /// Project whose lockfile is synced.
    pub project_root: PathBuf,
}

/// A finished run: the report, plus the fatal error that stopped it.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub error: Option<ProvisionError>,
}

/// Step timing and console log.
struct Timeline {
    started: Instant,
    steps: Vec<RunTelemetry>,
    warnings: Vec<String>,
}

impl Timeline {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Run a fatal step. Any error is tagged with the step and returned.
    fn step<T>(
        &mut self,
        step: Step,
        ui: &mut dyn UserInterface,
        f: impl FnOnce(&mut dyn UserInterface) -> Result<T>,
    ) -> Result<T> {
        debug_assert!(step.criticality().is_fatal());
        match self.attempt(step, ui, f) {
            Ok(value) => {
                self.record(step, StepOutcome::Success, ui);
                Ok(value)
            }
            Err(err) => {
                self.record(step, StepOutcome::Failed, ui);
                Err(err.in_step(step.name()))
            }
        }
    }

    /// Run a step whose failure is logged and skipped over.
    fn optional_step<T>(
        &mut self,
        step: Step,
        ui: &mut dyn UserInterface,
        f: impl FnOnce(&mut dyn UserInterface) -> Result<T>,
    ) -> Option<T> {
        match self.attempt(step, ui, f) {
            Ok(value) => {
                self.record(step, StepOutcome::Success, ui);
                Some(value)
            }
            Err(err) => {
                self.warn(ui, format!("{}: {}", step, err));
                self.record(step, StepOutcome::Failed, ui);
                None
            }
        }
    }

    fn attempt<T>(
        &mut self,
        step: Step,
        ui: &mut dyn UserInterface,
        f: impl FnOnce(&mut dyn UserInterface) -> Result<T>,
    ) -> Result<T> {
        tracing::info!("Starting {}", step);
        // Prompts can't share the line with a spinner.
        let mut spinner = (!step.may_prompt()).then(|| ui.start_spinner(step.name()));
        let result = f(ui);
        if let Some(spinner) = spinner.as_mut() {
            spinner.clear();
        }
        result
    }

    fn skip(&mut self, step: Step, ui: &mut dyn UserInterface) {
        tracing::debug!("Skipping {}", step);
        self.record(step, StepOutcome::Skipped, ui);
    }

    fn warn(&mut self, ui: &mut dyn UserInterface, message: String) {
        tracing::warn!("{}", message);
        ui.warning(&message);
        self.warnings.push(message);
    }

    fn record(&mut self, step: Step, outcome: StepOutcome, ui: &mut dyn UserInterface) {
        let telemetry = RunTelemetry {
            step_name: step.name().to_string(),
            elapsed_seconds: self.started.elapsed().as_secs_f64(),
            outcome,
        };
        ui.message(&telemetry.log_line());
        self.steps.push(telemetry);
    }
}

/// Drives a provisioning run on one host.
pub struct ProvisionOrchestrator<'a> {
    host: &'a HostContext,
    config: &'a ProvisionConfig,
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn ScriptFetcher,
    options: RunOptions,
}

impl<'a> ProvisionOrchestrator<'a> {
    pub fn new(
        host: &'a HostContext,
        config: &'a ProvisionConfig,
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn ScriptFetcher,
        options: RunOptions,
    ) -> Self {
        Self {
            host,
            config,
            runner,
            fetcher,
            options,
        }
    }

    /// Provision the host, failing on the first fatal error.
    pub fn run(&self, ui: &mut dyn UserInterface) -> Result<RunReport> {
        let outcome = self.execute(ui);
        match outcome.error {
            Some(err) => Err(err),
            None => Ok(outcome.report),
        }
    }

    /// Provision the host and return the report even when a step failed.
    pub fn execute(&self, ui: &mut dyn UserInterface) -> RunOutcome {
        let mut report = RunReport::new(Utc::now());
        let mut timeline = Timeline::new();

        let error = self.provision(ui, &mut timeline, &mut report).err();
        if let Some(err) = &error {
            tracing::error!("{}", err);
        }

        report.total_seconds = timeline.started.elapsed().as_secs_f64();
        report.steps = timeline.steps;
        report.warnings = timeline.warnings;
        report.success = error.is_none();
        RunOutcome { report, error }
    }

    fn provision(
        &self,
        ui: &mut dyn UserInterface,
        timeline: &mut Timeline,
        report: &mut RunReport,
    ) -> Result<()> {
        ui.show_header("Provisioning development host");
        if let Some(arch) = &self.host.target_arch {
            tracing::info!("Target architecture for image builds: {}", arch);
        }
        if self.host.publish {
            tracing::info!("Image publishing requested for downstream builds");
        }

        let profile = timeline.step(Step::DetectPlatform, ui, |_| platform::detect(self.host))?;
        tracing::info!("Platform: {}", profile.display_name());
        report.platform = Some(profile.clone());

        let installer = SystemPackageInstaller::new(self.host, self.runner, self.fetcher)
            .with_download_policy(self.download_policy());

        if profile.is_linux() {
            let privilege =
                timeline.step(Step::ResolvePrivilege, ui, |_| platform::resolve(self.host))?;
            let packages = timeline.step(Step::InstallSystemPackages, ui, |ui| {
                self.install_system_packages(&installer, &profile, &privilege, ui)
            })?;
            report.packages = Some(packages);

            let rules = timeline.step(Step::InstallDeviceRules, ui, |_| {
                DeviceRuleInstaller::new(self.runner).install_rules(
                    &default_rules(&self.config.settings.rules_dir),
                    &profile,
                    &privilege,
                )
            })?;
            for path in &rules.skipped {
                timeline.warn(
                    ui,
                    format!("{} not written: directory does not exist", path.display()),
                );
            }
            if let Some(err) = &rules.reload_error {
                timeline.warn(ui, err.to_string());
            }
            report.record_rules(&rules);
        } else {
            timeline.skip(Step::ResolvePrivilege, ui);
            timeline.skip(Step::InstallSystemPackages, ui);
            timeline.skip(Step::InstallDeviceRules, ui);
        }

        if profile.is_darwin() {
            let privilege = PrivilegeContext {
                can_elevate: false,
                is_root: self.host.is_root,
            };
            let batches = batches_for(PackageManager::Homebrew, &self.config.packages);
            let packages = timeline.step(Step::InstallHomebrewPackages, ui, |ui| {
                installer.install(&batches, &profile, &privilege, ui, self.options.assume_yes)
            })?;
            report.packages = Some(packages);
        } else {
            timeline.skip(Step::InstallHomebrewPackages, ui);
        }

        if !profile.is_linux() && !profile.is_darwin() {
            timeline.warn(
                ui,
                format!(
                    "No system package manager for {}; install build dependencies manually",
                    profile.display_name()
                ),
            );
        }

        let bootstrapper = RuntimeEnvironmentBootstrapper::new(
            self.host,
            &self.config.runtime,
            self.runner,
            self.fetcher,
        );
        let runtime = timeline.step(Step::BootstrapRuntime, ui, |_| {
            bootstrapper.bootstrap(&self.options.project_root, &profile)
        })?;
        if !runtime.self_updated {
            timeline.warn(
                ui,
                format!(
                    "{} self update failed; continuing with the installed version",
                    self.config.runtime.manager
                ),
            );
        }
        report.runtime = Some(runtime);

        if profile.is_darwin() {
            self.configure_shell(&bootstrapper.bin_dir(), timeline, report, ui);
        } else {
            timeline.skip(Step::ConfigureShellProfile, ui);
        }

        let elapsed = timeline.started.elapsed();
        ui.success(&format!(
            "Host provisioned in {}",
            crate::ui::format_duration(elapsed)
        ));
        ui.message(&self.reload_instruction(&profile));
        Ok(())
    }

    /// Confirm the platform, refresh the index with retries, install batches.
    fn install_system_packages(
        &self,
        installer: &SystemPackageInstaller<'_>,
        profile: &PlatformProfile,
        privilege: &PrivilegeContext,
        ui: &mut dyn UserInterface,
    ) -> Result<InstallReport> {
        installer.confirm_platform(profile, ui, self.options.assume_yes)?;

        let manager = PackageManager::AptGet;
        let policy = RetryPolicy::new(
            self.config.settings.index_refresh_attempts,
            self.config.runtime.retry_delay(),
        );
        retry_fixed(
            policy,
            "package index refresh",
            ProvisionError::is_transient,
            |_| installer.refresh_index(manager, privilege),
        )
        .map_err(|exhausted| exhausted.last_error)?;

        let batches = batches_for(manager, &self.config.packages);
        let installed = installer.install_batches(&batches, privilege)?;
        Ok(InstallReport {
            manager,
            refreshed: true,
            batches: installed,
        })
    }

    fn configure_shell(
        &self,
        bin_dir: &std::path::Path,
        timeline: &mut Timeline,
        report: &mut RunReport,
        ui: &mut dyn UserInterface,
    ) {
        let configurator = ShellProfileConfigurator::new(self.host);
        let configured = timeline.optional_step(Step::ConfigureShellProfile, ui, |_| {
            configurator.ensure_path_entry(bin_dir)
        });

        match configured {
            Some((_, outcome)) => report.shell_profile = Some(outcome),
            None => {
                let line = EnvironmentBinding::new(
                    "PATH",
                    path_value(self.host, bin_dir),
                    PathBuf::new(),
                )
                .export_line();
                ui.message(&format!(
                    "Add this line to your shell startup file manually:\n  {}",
                    line
                ));
            }
        }
    }

    fn reload_instruction(&self, profile: &PlatformProfile) -> String {
        if profile.is_darwin() {
            let hint = ShellProfileConfigurator::new(self.host).reload_hint();
            format!("Reload your shell to finish: {}", hint)
        } else {
            "Reload your shell to finish: exec $SHELL -l".to_string()
        }
    }

    fn download_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.runtime.download_attempts,
            self.config.runtime.retry_delay(),
        )
    }
}
