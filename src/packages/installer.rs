//! System package installation.
//!
//! [`SystemPackageInstaller`] turns the catalog into package manager
//! invocations. The index refresh is exposed separately from batch
//! installation so the orchestrator can retry it without repeating the
//! confirmation prompt or the installs.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ProvisionError, Result};
use crate::host::HostContext;
use crate::platform::{PlatformProfile, PrivilegeContext, SUPPORTED_CODENAMES};
use crate::retry::RetryPolicy;
use crate::runtime::fetch::{fetch_and_run, ScriptFetcher};
use crate::shell::{is_executable, CommandOptions, CommandRunner};
use crate::ui::{Prompt, UserInterface};

use super::catalog::{PackageBatch, PackageManager};

/// Official Homebrew installer.
pub const HOMEBREW_INSTALLER_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Where the Homebrew installer puts `brew` (Apple silicon, then Intel).
const HOMEBREW_LOCATIONS: [&str; 2] = ["/opt/homebrew/bin/brew", "/usr/local/bin/brew"];

/// Prompt key for continuing on an unsupported distribution.
pub const UNSUPPORTED_PLATFORM_PROMPT: &str = "unsupported_platform";

/// What a package installation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub manager: PackageManager,
    /// Whether the package index refresh succeeded.
    pub refreshed: bool,
    /// Installed batches as (batch name, package count), in order.
    pub batches: Vec<(String, usize)>,
}

/// The package manager used on `profile`, if any.
pub fn manager_for(profile: &PlatformProfile) -> Option<PackageManager> {
    if profile.is_linux() {
        Some(PackageManager::AptGet)
    } else if profile.is_darwin() {
        Some(PackageManager::Homebrew)
    } else {
        None
    }
}

/// Installs system packages through the host's package manager.
pub struct SystemPackageInstaller<'a> {
    host: &'a HostContext,
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn ScriptFetcher,
    download_policy: RetryPolicy,
}

impl<'a> SystemPackageInstaller<'a> {
    pub fn new(
        host: &'a HostContext,
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn ScriptFetcher,
    ) -> Self {
        Self {
            host,
            runner,
            fetcher,
            download_policy: RetryPolicy::new(5, Duration::from_secs(5)),
        }
    }

    /// Retry policy for downloading the Homebrew installer.
    pub fn with_download_policy(mut self, policy: RetryPolicy) -> Self {
        self.download_policy = policy;
        self
    }

    /// Gate installation on an unsupported Linux distribution.
    ///
    /// Supported platforms and non-Linux hosts pass straight through.
    /// Otherwise `assume_yes` or an explicit "yes" is required; the prompt
    /// defaults to "no", so a non-interactive run without `assume_yes`
    /// aborts.
    pub fn confirm_platform(
        &self,
        profile: &PlatformProfile,
        ui: &mut dyn UserInterface,
        assume_yes: bool,
    ) -> Result<()> {
        if !profile.is_linux() || profile.supported {
            return Ok(());
        }

        let name = profile.display_name();
        if assume_yes {
            ui.warning(&format!(
                "{} is not a supported release; continuing because --yes was given",
                name
            ));
            return Ok(());
        }

        let prompt = Prompt::new(
            UNSUPPORTED_PLATFORM_PROMPT,
            format!(
                "{} is not a supported release (expected one of {}). Continue anyway?",
                name,
                SUPPORTED_CODENAMES.join(", ")
            ),
            false,
        );
        if ui.confirm(&prompt)? {
            tracing::info!("Continuing on unsupported platform {}", name);
            return Ok(());
        }

        let version = if profile.version_id.is_empty() {
            profile.version_codename.clone()
        } else {
            profile.version_id.clone()
        };
        Err(ProvisionError::UnsupportedPlatform {
            distribution: profile.distribution_id.clone(),
            version,
        })
    }

    /// Program used to invoke `manager`.
    ///
    /// For Homebrew this is the absolute path when `brew` is found outside
    /// `PATH`, which is the case right after a fresh install.
    pub fn program(&self, manager: PackageManager) -> String {
        match manager {
            PackageManager::AptGet => manager.program().to_string(),
            PackageManager::Homebrew => self
                .find_brew()
                .unwrap_or_else(|| manager.program().to_string()),
        }
    }

    fn find_brew(&self) -> Option<String> {
        if let Some(path) = self.host.find_program("brew") {
            return Some(path.to_string_lossy().into_owned());
        }
        HOMEBREW_LOCATIONS
            .iter()
            .find(|p| is_executable(Path::new(p)))
            .map(|p| p.to_string())
    }

    /// Install Homebrew if `brew` can't be found; returns the program to use.
    ///
    /// # Errors
    ///
    /// `RuntimeManagerInstall` once every download attempt has failed.
    pub fn ensure_homebrew(&self) -> Result<String> {
        if let Some(brew) = self.find_brew() {
            tracing::debug!("Found Homebrew at {}", brew);
            return Ok(brew);
        }

        tracing::info!("Installing Homebrew");
        let options = CommandOptions::captured().with_env("NONINTERACTIVE", "1");
        fetch_and_run(
            self.fetcher,
            self.runner,
            HOMEBREW_INSTALLER_URL,
            "/bin/bash",
            &options,
            self.download_policy,
        )
        .map_err(|exhausted| ProvisionError::RuntimeManagerInstall {
            manager: PackageManager::Homebrew.program().to_string(),
            attempts: exhausted.attempts,
            message: exhausted.last_error,
        })?;

        match self.find_brew() {
            Some(brew) => Ok(brew),
            None => {
                tracing::warn!("Homebrew installer finished but brew was not found; using PATH");
                Ok(PackageManager::Homebrew.program().to_string())
            }
        }
    }

    /// Refresh the package index once.
    ///
    /// # Errors
    ///
    /// `PackageIndexRefresh`, which is transient; callers decide whether
    /// to retry.
    pub fn refresh_index(
        &self,
        manager: PackageManager,
        privilege: &PrivilegeContext,
    ) -> Result<()> {
        let command = self.privileged(
            manager,
            privilege,
            manager.refresh_command(&self.program(manager)),
        );
        let result = self.runner.run(&command, &CommandOptions::captured())?;
        if result.success {
            Ok(())
        } else {
            Err(ProvisionError::PackageIndexRefresh {
                manager: manager.to_string(),
                message: result.failure_summary(),
            })
        }
    }

    /// Install each non-empty batch in order with one command per batch.
    ///
    /// # Errors
    ///
    /// `PackageInstall` naming the first batch that failed.
    pub fn install_batches(
        &self,
        batches: &[PackageBatch],
        privilege: &PrivilegeContext,
    ) -> Result<Vec<(String, usize)>> {
        let mut installed = Vec::new();
        for batch in batches.iter().filter(|b| !b.is_empty()) {
            let manager = batch.manager;
            let mut command = manager.install_command(&self.program(manager), &batch.names());
            if manager == PackageManager::AptGet {
                command = format!("DEBIAN_FRONTEND=noninteractive {}", command);
            }
            let command = self.privileged(manager, privilege, command);

            tracing::info!("Installing {} packages ({})", batch.name, batch.len());
            let result = self.runner.run(&command, &CommandOptions::captured())?;
            if !result.success {
                return Err(ProvisionError::PackageInstall {
                    batch: batch.name.clone(),
                    manager: manager.to_string(),
                    message: result.failure_summary(),
                });
            }
            installed.push((batch.name.clone(), batch.len()));
        }
        Ok(installed)
    }

    /// Confirm, refresh once, then install every batch.
    ///
    /// A failed Homebrew refresh is logged and installation continues; a
    /// failed apt refresh is returned to the caller.
    pub fn install(
        &self,
        batches: &[PackageBatch],
        profile: &PlatformProfile,
        privilege: &PrivilegeContext,
        ui: &mut dyn UserInterface,
        assume_yes: bool,
    ) -> Result<InstallReport> {
        let Some(manager) = manager_for(profile) else {
            return Ok(InstallReport {
                manager: PackageManager::AptGet,
                refreshed: false,
                batches: Vec::new(),
            });
        };

        self.confirm_platform(profile, ui, assume_yes)?;

        if manager == PackageManager::Homebrew {
            self.ensure_homebrew()?;
        }

        let refreshed = match self.refresh_index(manager, privilege) {
            Ok(()) => true,
            Err(err) if manager == PackageManager::Homebrew => {
                tracing::warn!("{}", err);
                ui.warning(&err.to_string());
                false
            }
            Err(err) => return Err(err),
        };

        let batches = self.install_batches(batches, privilege)?;
        Ok(InstallReport {
            manager,
            refreshed,
            batches,
        })
    }

    fn privileged(
        &self,
        manager: PackageManager,
        privilege: &PrivilegeContext,
        command: String,
    ) -> String {
        if manager.needs_privilege() {
            privilege.wrap(&command)
        } else {
            command
        }
    }
}
