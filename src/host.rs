//! Host inspection performed once per process.
//!
//! [`HostContext`] snapshots everything the provisioning steps need to know
//! about the machine they run on: kernel name, os-release location, home
//! directory, shell, effective user and `PATH`. It is built once in `main`
//! and handed to every component by reference.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::shell::{find_program_in, is_ci, is_elevated};

/// Default location of the os-release descriptor.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Environment variable naming the image architecture for downstream builds.
pub const TARGET_ARCH_VAR: &str = "TARGET_ARCHITECTURE";

/// Environment variable requesting that built images also be published.
pub const PUBLISH_VAR: &str = "PUSH_IMAGE";

/// Read-only facts about the host.
#[derive(Debug, Clone)]
pub struct HostContext {
    /// Kernel name as reported by `uname -s` ("Linux", "Darwin", ...).
    pub kernel_name: String,
    /// Machine architecture ("x86_64", "arm64", ...).
    pub arch: String,
    /// Path of the os-release descriptor to read.
    pub os_release_path: PathBuf,
    /// The invoking user's home directory.
    pub home: PathBuf,
    /// Value of `$SHELL`, if set.
    pub shell: Option<String>,
    /// Whether the effective user is root.
    pub is_root: bool,
    /// `PATH` at startup.
    pub path_var: String,
    /// Whether a CI environment was detected.
    pub is_ci: bool,
    /// Architecture override for downstream image builds.
    pub target_arch: Option<String>,
    /// Whether downstream builds should publish their image.
    pub publish: bool,
}

impl HostContext {
    /// Inspect the running host.
    pub fn detect() -> Self {
        Self {
            kernel_name: uname("-s").unwrap_or_else(|| fallback_kernel_name().to_string()),
            arch: uname("-m").unwrap_or_else(|| std::env::consts::ARCH.to_string()),
            os_release_path: PathBuf::from(OS_RELEASE_PATH),
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")),
            shell: std::env::var("SHELL").ok().filter(|s| !s.is_empty()),
            is_root: is_elevated(),
            path_var: std::env::var("PATH").unwrap_or_default(),
            is_ci: is_ci(),
            target_arch: std::env::var(TARGET_ARCH_VAR)
                .ok()
                .filter(|s| !s.is_empty()),
            publish: std::env::var(PUBLISH_VAR).is_ok_and(|v| is_truthy(&v)),
        }
    }

    /// Replace the os-release path (config override).
    pub fn with_os_release_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.os_release_path = path.into();
        self
    }

    /// Look up a program on the startup `PATH`.
    pub fn find_program(&self, name: &str) -> Option<PathBuf> {
        find_program_in(name, &self.path_var)
    }

    /// Whether the kernel is Darwin.
    pub fn is_darwin(&self) -> bool {
        self.kernel_name == "Darwin"
    }

    /// Path under the home directory.
    pub fn home_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.home.join(relative)
    }
}

fn uname(flag: &str) -> Option<String> {
    let output = Command::new("uname").arg(flag).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

fn fallback_kernel_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        other => other,
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
