//! Error types for provisioning operations.
//!
//! This module defines [`ProvisionError`], the primary error type used
//! throughout the crate, a [`Result`] type alias, and the [`Criticality`]
//! tag that decides whether an error aborts the run.
//!
//! # Error Handling Strategy
//!
//! - Every variant maps to one failure mode of one provisioning step
//! - `criticality()` is the single source of truth for fail-fast decisions
//! - Use `anyhow::Error` (via `ProvisionError::Other`) for unexpected errors

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a failure aborts the run or is logged and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Abort the run immediately.
    Fatal,
    /// Log a warning and continue.
    NonFatal,
}

impl Criticality {
    pub fn is_fatal(self) -> bool {
        matches!(self, Criticality::Fatal)
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criticality::Fatal => write!(f, "fatal"),
            Criticality::NonFatal => write!(f, "non-fatal"),
        }
    }
}

/// Core error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// No os-release descriptor or kernel name could identify the host.
    #[error("Cannot identify host platform: {message}")]
    PlatformUnreadable { message: String },

    /// The distribution is not on the allow-list and the user declined to continue.
    #[error("{distribution} {version} is unsupported; this setup targets a recent Ubuntu LTS")]
    UnsupportedPlatform {
        distribution: String,
        version: String,
    },

    /// Not root and no elevation helper on PATH.
    #[error("Not running as root and '{helper}' was not found; install {helper} or run as root")]
    NoPrivilegeEscalation { helper: String },

    /// The package index could not be refreshed (usually a network blip).
    #[error("Failed to refresh {manager} package index: {message}")]
    PackageIndexRefresh { manager: String, message: String },

    /// A package batch failed to install.
    #[error("Failed to install {batch} packages with {manager}: {message}")]
    PackageInstall {
        batch: String,
        manager: String,
        message: String,
    },

    /// A device rules file could not be written.
    #[error("Failed to write device rules to {path}: {message}")]
    DeviceRuleWrite { path: PathBuf, message: String },

    /// The device manager did not reload its rules.
    #[error("Device manager reload failed: {message}")]
    DeviceManagerReload { message: String },

    /// A package manager could not be installed within the retry budget.
    #[error("Failed to install {manager} after {attempts} attempts: {message}")]
    RuntimeManagerInstall {
        manager: String,
        attempts: u32,
        message: String,
    },

    /// The project environment could not be materialized from the lockfile.
    #[error("Failed to sync environment in {path}: {message}")]
    EnvironmentSync { path: PathBuf, message: String },

    /// The active shell has no recognized startup file.
    #[error("Unrecognized shell '{shell}'; add the binding to your shell profile manually")]
    UnknownShell { shell: String },

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A fatal step failure, tagged with the step that raised it.
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<ProvisionError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProvisionError {
    /// Classify this error for the fail-fast policy.
    pub fn criticality(&self) -> Criticality {
        match self {
            ProvisionError::DeviceManagerReload { .. } | ProvisionError::UnknownShell { .. } => {
                Criticality::NonFatal
            }
            ProvisionError::StepFailed { source, .. } => source.criticality(),
            _ => Criticality::Fatal,
        }
    }

    /// Whether the caller may retry the operation that produced this error.
    pub fn is_transient(&self) -> bool {
        match self {
            ProvisionError::PackageIndexRefresh { .. } => true,
            ProvisionError::StepFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Attach the name of the step that failed.
    pub fn in_step(self, step: &str) -> Self {
        match self {
            already @ ProvisionError::StepFailed { .. } => already,
            other => ProvisionError::StepFailed {
                step: step.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;
