//! Provisioning steps and their telemetry.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::Criticality;
use crate::ui::format_elapsed;

/// One stage of a provisioning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    DetectPlatform,
    ResolvePrivilege,
    InstallSystemPackages,
    InstallDeviceRules,
    InstallHomebrewPackages,
    BootstrapRuntime,
    ConfigureShellProfile,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::DetectPlatform => "detect platform",
            Step::ResolvePrivilege => "resolve privileges",
            Step::InstallSystemPackages => "install system packages",
            Step::InstallDeviceRules => "install device rules",
            Step::InstallHomebrewPackages => "install homebrew packages",
            Step::BootstrapRuntime => "bootstrap runtime environment",
            Step::ConfigureShellProfile => "configure shell profile",
        }
    }

    /// Whether a failure of this step aborts the run.
    ///
    /// A fatal step still tolerates errors that are themselves non-fatal.
    pub fn criticality(self) -> Criticality {
        match self {
            Step::ConfigureShellProfile => Criticality::NonFatal,
            _ => Criticality::Fatal,
        }
    }

    /// Whether the step may stop to ask the user something: a confirmation,
    /// or a `sudo` password for a privileged command.
    pub fn may_prompt(self) -> bool {
        matches!(self, Step::InstallSystemPackages | Step::InstallDeviceRules)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Failed,
    Skipped,
}

impl StepOutcome {
    fn marker(self) -> char {
        match self {
            StepOutcome::Success => '✓',
            StepOutcome::Failed => '✗',
            StepOutcome::Skipped => '-',
        }
    }
}

/// Timing record for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTelemetry {
    pub step_name: String,
    /// Seconds since the run started, taken when the step ended.
    pub elapsed_seconds: f64,
    pub outcome: StepOutcome,
}

impl RunTelemetry {
    /// Console line, e.g. `[✓] install device rules (t=42s)`.
    pub fn log_line(&self) -> String {
        let elapsed = Duration::from_secs_f64(self.elapsed_seconds.max(0.0));
        format!(
            "[{}] {} ({})",
            self.outcome.marker(),
            self.step_name,
            format_elapsed(elapsed)
        )
    }
}
