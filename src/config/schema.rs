//! Configuration schema definitions.
//!
//! This module contains the structs that map to the optional
//! `.hostprep/config.yml` file. Every field has a default, so an empty or
//! absent file yields the stock provisioning behavior.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionConfig {
    /// Host-level settings
    pub settings: Settings,

    /// Runtime package manager settings
    pub runtime: RuntimeSettings,

    /// Package catalog additions
    pub packages: PackageSettings,
}

/// Host-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory device rules files are written to
    pub rules_dir: PathBuf,

    /// os-release descriptor to read (overrides `/etc/os-release`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_release_path: Option<PathBuf>,

    /// Attempts for the package index refresh before giving up
    pub index_refresh_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from(DEFAULT_RULES_DIR),
            os_release_path: None,
            index_refresh_attempts: default_index_refresh_attempts(),
        }
    }
}

/// Default udev rules directory.
pub const DEFAULT_RULES_DIR: &str = "/etc/udev/rules.d";

fn default_index_refresh_attempts() -> u32 {
    3
}

/// Runtime package manager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    /// Manager binary name
    pub manager: String,

    /// Installer script URL
    pub installer_url: String,

    /// Download attempts before giving up
    pub download_attempts: u32,

    /// Fixed delay between download attempts, in seconds
    pub retry_delay_secs: u64,

    /// Directory the installer places the manager in (default `~/.local/bin`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,

    /// Lockfile name, relative to the project root
    pub lockfile: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            manager: "uv".to_string(),
            installer_url: "https://astral.sh/uv/install.sh".to_string(),
            download_attempts: 5,
            retry_delay_secs: 5,
            bin_dir: None,
            lockfile: "uv.lock".to_string(),
        }
    }
}

impl RuntimeSettings {
    /// Delay between download attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Additions to the built-in package catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
    /// Extra apt packages, installed with the project-specific batch
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_apt: Vec<String>,

    /// Extra Homebrew formulae, installed with the project-specific batch
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_brew: Vec<String>,
}
