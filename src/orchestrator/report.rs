//! Run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::devices::RulesReport;
use crate::packages::InstallReport;
use crate::platform::PlatformProfile;
use crate::profile::BindingOutcome;
use crate::runtime::BootstrapReport;

use super::step::{RunTelemetry, StepOutcome};

/// Everything a provisioning run did, for `--json` and the final summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub platform: Option<PlatformProfile>,
    pub steps: Vec<RunTelemetry>,
    pub total_seconds: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<InstallReport>,
    /// Rules files written.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub device_rules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<BootstrapReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_profile: Option<BindingOutcome>,
    /// Non-fatal problems, in the order they occurred.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            platform: None,
            steps: Vec::new(),
            total_seconds: 0.0,
            success: false,
            packages: None,
            device_rules: Vec::new(),
            runtime: None,
            shell_profile: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn record_rules(&mut self, rules: &RulesReport) {
        self.device_rules = rules
            .files_written
            .iter()
            .map(|p| p.display().to_string())
            .collect();
    }

    /// Telemetry for `step_name`, if it ran.
    pub fn step(&self, step_name: &str) -> Option<&RunTelemetry> {
        self.steps.iter().find(|s| s.step_name == step_name)
    }

    /// Names of steps that ended with `outcome`.
    pub fn steps_with(&self, outcome: StepOutcome) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.outcome == outcome)
            .map(|s| s.step_name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry(name: &str, outcome: StepOutcome) -> RunTelemetry {
        RunTelemetry {
            step_name: name.to_string(),
            elapsed_seconds: 1.0,
            outcome,
        }
    }

    #[test]
    fn lookup_by_step_and_outcome() {
        let mut report = RunReport::new(Utc::now());
        report.steps.push(telemetry("detect platform", StepOutcome::Success));
        report.steps.push(telemetry("configure shell profile", StepOutcome::Skipped));

        assert!(report.step("detect platform").is_some());
        assert!(report.step("install device rules").is_none());
        assert_eq!(
            report.steps_with(StepOutcome::Skipped),
            vec!["configure shell profile"]
        );
    }

    #[test]
    fn json_omits_empty_sections() {
        let report = RunReport::new(Utc::now());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("started_at").is_some());
        assert!(json.get("runtime").is_none());
        assert!(json.get("warnings").is_none());
        assert_eq!(json["success"], false);
    }
}
