//! Language runtime environment bootstrapping.
//!
//! Installs the runtime package manager when it is missing, then
//! materializes the project's environment from its lockfile.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::RuntimeSettings;
use crate::error::{ProvisionError, Result};
use crate::host::HostContext;
use crate::platform::PlatformProfile;
use crate::profile::{ensure_binding, BindingOutcome, EnvironmentBinding};
use crate::retry::RetryPolicy;
use crate::shell::{is_executable, quote_arg, CommandOptions, CommandRunner};

use super::fetch::{fetch_and_run, ScriptFetcher};
use super::lockfile::LockfileSnapshot;

/// Variable the macOS Objective-C runtime checks before aborting forked
/// children.
pub const FORK_SAFETY_VAR: &str = "OBJC_DISABLE_INITIALIZE_FORK_SAFETY";

/// Project file holding per-project environment variables.
pub const PROJECT_ENV_FILE: &str = ".env";

/// What the bootstrap did.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    /// Absolute path of the manager binary used.
    pub manager_path: PathBuf,
    /// Whether the manager was installed during this run.
    pub installed_manager: bool,
    /// Whether the manager's self-update succeeded.
    pub self_updated: bool,
    pub lockfile: LockfileSnapshot,
    /// Outcome of the `.env` binding; macOS only.
    pub env_binding: Option<BindingOutcome>,
}

/// Installs the runtime manager and syncs the project environment.
pub struct RuntimeEnvironmentBootstrapper<'a> {
    host: &'a HostContext,
    settings: &'a RuntimeSettings,
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn ScriptFetcher,
}

impl<'a> RuntimeEnvironmentBootstrapper<'a> {
    pub fn new(
        host: &'a HostContext,
        settings: &'a RuntimeSettings,
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn ScriptFetcher,
    ) -> Self {
        Self {
            host,
            settings,
            runner,
            fetcher,
        }
    }

    /// Directory the installer puts the manager in.
    pub fn bin_dir(&self) -> PathBuf {
        self.settings
            .bin_dir
            .clone()
            .unwrap_or_else(|| self.host.home_path(".local/bin"))
    }

    /// Find the manager on `PATH` or in [`Self::bin_dir`].
    pub fn locate_manager(&self) -> Option<PathBuf> {
        let name = &self.settings.manager;
        self.host.find_program(name).or_else(|| {
            let candidate = self.bin_dir().join(name);
            is_executable(&candidate).then_some(candidate)
        })
    }

    /// Return the manager path, installing it first when absent.
    ///
    /// The boolean is true when this call installed it.
    ///
    /// # Errors
    ///
    /// `RuntimeManagerInstall` once every download attempt has failed, or
    /// when the installer succeeded but the binary still can't be found.
    pub fn ensure_manager(&self) -> Result<(PathBuf, bool)> {
        if let Some(path) = self.locate_manager() {
            tracing::debug!("Found {} at {}", self.settings.manager, path.display());
            return Ok((path, false));
        }

        let bin_dir = self.bin_dir();
        tracing::info!(
            "Installing {} into {}",
            self.settings.manager,
            bin_dir.display()
        );
        let policy = RetryPolicy::new(
            self.settings.download_attempts,
            self.settings.retry_delay(),
        );
        let options = CommandOptions::captured()
            .with_env("UV_INSTALL_DIR", &bin_dir.to_string_lossy())
            .with_env("UV_NO_MODIFY_PATH", "1");
        fetch_and_run(
            self.fetcher,
            self.runner,
            &self.settings.installer_url,
            "sh",
            &options,
            policy,
        )
        .map_err(|exhausted| ProvisionError::RuntimeManagerInstall {
            manager: self.settings.manager.clone(),
            attempts: exhausted.attempts,
            message: exhausted.last_error,
        })?;

        match self.locate_manager() {
            Some(path) => Ok((path, true)),
            None => Err(ProvisionError::RuntimeManagerInstall {
                manager: self.settings.manager.clone(),
                attempts: 1,
                message: format!(
                    "installer finished but nothing was found in {}",
                    bin_dir.display()
                ),
            }),
        }
    }

    /// Options for manager invocations: the bin directory leads `PATH`.
    fn manager_options(&self) -> CommandOptions {
        let path = format!("{}:{}", self.bin_dir().display(), self.host.path_var);
        CommandOptions::captured().with_env("PATH", &path)
    }

    /// Run the manager's self-update; failures are logged only.
    pub fn self_update(&self, manager: &Path) -> bool {
        let command = format!("{} self update", quote_arg(&manager.to_string_lossy()));
        match self.runner.run(&command, &self.manager_options()) {
            Ok(result) if result.success => true,
            Ok(result) => {
                tracing::warn!(
                    "{} self update failed ({}); continuing",
                    self.settings.manager,
                    result.failure_summary()
                );
                false
            }
            Err(err) => {
                tracing::warn!(
                    "{} self update failed ({}); continuing",
                    self.settings.manager,
                    err
                );
                false
            }
        }
    }

    /// Install exactly what the lockfile pins into the project environment.
    ///
    /// # Errors
    ///
    /// `EnvironmentSync` if the lockfile is missing or the sync fails.
    /// Never retried.
    pub fn sync(&self, manager: &Path, project_root: &Path) -> Result<LockfileSnapshot> {
        let lockfile = LockfileSnapshot::read(&project_root.join(&self.settings.lockfile))?;
        tracing::info!(
            "Syncing {} pinned packages (lockfile {})",
            lockfile.len(),
            &lockfile.digest[..12]
        );

        let command = format!(
            "{} sync --frozen --all-extras",
            quote_arg(&manager.to_string_lossy())
        );
        let options = self.manager_options().in_dir(project_root);
        let result = self.runner.run(&command, &options)?;
        if result.success {
            Ok(lockfile)
        } else {
            Err(ProvisionError::EnvironmentSync {
                path: project_root.to_path_buf(),
                message: result.failure_summary(),
            })
        }
    }

    /// Ensure the manager, update it, sync the project, and on macOS bind
    /// the fork-safety variable in the project `.env`.
    pub fn bootstrap(
        &self,
        project_root: &Path,
        profile: &PlatformProfile,
    ) -> Result<BootstrapReport> {
        let (manager_path, installed_manager) = self.ensure_manager()?;
        let self_updated = self.self_update(&manager_path);
        let lockfile = self.sync(&manager_path, project_root)?;

        let env_binding = if profile.is_darwin() {
            let binding = EnvironmentBinding::new(
                FORK_SAFETY_VAR,
                "YES",
                project_root.join(PROJECT_ENV_FILE),
            );
            Some(ensure_binding(&binding)?)
        } else {
            None
        };

        Ok(BootstrapReport {
            manager_path,
            installed_manager,
            self_updated,
            lockfile,
            env_binding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::OsFamily;
    use crate::runtime::fetch::StaticFetcher;
    use crate::shell::MockRunner;
    use std::fs;
    use tempfile::TempDir;

    const LOCK: &str = "version = 1\n\n[[package]]\nname = \"numpy\"\nversion = \"1.26.4\"\n";

    struct Fixture {
        _temp: TempDir,
        host: HostContext,
        settings: RuntimeSettings,
        project: PathBuf,
        bin_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        let bin_dir = temp.path().join("bin");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(&bin_dir).unwrap();
        fs::write(project.join("uv.lock"), LOCK).unwrap();

        let mut host = HostContext::detect();
        host.home = temp.path().to_path_buf();
        host.path_var = String::new();

        let settings = RuntimeSettings {
            bin_dir: Some(bin_dir.clone()),
            retry_delay_secs: 0,
            ..RuntimeSettings::default()
        };

        Fixture {
            _temp: temp,
            host,
            settings,
            project,
            bin_dir,
        }
    }

    #[cfg(unix)]
    fn install_fake_uv(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let uv = dir.join("uv");
        fs::write(&uv, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&uv, fs::Permissions::from_mode(0o755)).unwrap();
        uv
    }

    fn profile(os_family: OsFamily) -> PlatformProfile {
        PlatformProfile {
            os_family,
            distribution_id: "ubuntu".into(),
            version_codename: "noble".into(),
            version_id: "24.04".into(),
            supported: true,
        }
    }

    #[test]
    fn default_bin_dir_is_under_home() {
        let f = fixture();
        let settings = RuntimeSettings::default();
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &settings, &runner, &fetcher);
        assert_eq!(bootstrapper.bin_dir(), f.host.home.join(".local/bin"));
    }

    #[cfg(unix)]
    #[test]
    fn existing_manager_is_used_without_download() {
        let f = fixture();
        let uv = install_fake_uv(&f.bin_dir);
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        let report = bootstrapper
            .bootstrap(&f.project, &profile(OsFamily::Linux))
            .unwrap();

        assert_eq!(report.manager_path, uv);
        assert!(!report.installed_manager);
        assert!(report.self_updated);
        assert_eq!(report.lockfile.version_of("numpy"), Some("1.26.4"));
        assert!(report.env_binding.is_none());
        assert_eq!(fetcher.calls(), 0);

        let calls = runner.invocations();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].command.ends_with("uv self update"));
        assert!(calls[1].command.ends_with("uv sync --frozen --all-extras"));
        assert_eq!(calls[1].cwd.as_deref(), Some(f.project.as_path()));
        assert!(!f.project.join(PROJECT_ENV_FILE).exists());
    }

    #[test]
    fn download_exhaustion_after_five_attempts() {
        let f = fixture();
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        let err = bootstrapper
            .bootstrap(&f.project, &profile(OsFamily::Linux))
            .unwrap_err();

        match &err {
            ProvisionError::RuntimeManagerInstall { attempts, manager, .. } => {
                assert_eq!(*attempts, 5);
                assert_eq!(manager, "uv");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.criticality().is_fatal());
        assert_eq!(fetcher.calls(), 5);
        assert!(!runner.ran("sync"));
    }

    #[test]
    fn installer_success_without_binary_is_an_error() {
        let f = fixture();
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::flaky("#!/bin/sh\necho uv", 4);
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        // The mock installer never creates the binary.
        let err = bootstrapper.ensure_manager().unwrap_err();
        assert!(err.to_string().contains("nothing was found"));
        assert_eq!(fetcher.calls(), 5);
        let calls = runner.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "sh");
    }

    #[cfg(unix)]
    #[test]
    fn transient_download_failures_then_install_completes() {
        use crate::shell::SystemRunner;

        let f = fixture();
        let script = "mkdir -p \"$UV_INSTALL_DIR\"\n\
                      printf '#!/bin/sh\\nexit 0\\n' > \"$UV_INSTALL_DIR/uv\"\n\
                      chmod +x \"$UV_INSTALL_DIR/uv\"\n";
        let runner = SystemRunner::new(false);
        let fetcher = StaticFetcher::flaky(script, 4);
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        let report = bootstrapper
            .bootstrap(&f.project, &profile(OsFamily::Linux))
            .unwrap();

        assert!(report.installed_manager);
        assert_eq!(report.manager_path, f.bin_dir.join("uv"));
        assert_eq!(fetcher.calls(), 5);
        assert_eq!(report.lockfile.version_of("numpy"), Some("1.26.4"));
    }

    #[cfg(unix)]
    #[test]
    fn self_update_failure_is_not_fatal() {
        let f = fixture();
        install_fake_uv(&f.bin_dir);
        let runner = MockRunner::new();
        runner.fail_on("self update", 2);
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        let report = bootstrapper
            .bootstrap(&f.project, &profile(OsFamily::Linux))
            .unwrap();
        assert!(!report.self_updated);
        assert!(runner.ran("sync --frozen"));
    }

    #[cfg(unix)]
    #[test]
    fn sync_failure_is_fatal_and_not_retried() {
        let f = fixture();
        install_fake_uv(&f.bin_dir);
        let runner = MockRunner::new();
        runner.fail_on("sync", 1);
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        let err = bootstrapper
            .bootstrap(&f.project, &profile(OsFamily::Linux))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::EnvironmentSync { .. }));
        assert!(!err.is_transient());
        assert_eq!(runner.count("sync"), 1);
    }

    #[cfg(unix)]
    #[test]
    fn missing_lockfile_is_sync_error() {
        let f = fixture();
        install_fake_uv(&f.bin_dir);
        fs::remove_file(f.project.join("uv.lock")).unwrap();
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        let err = bootstrapper
            .bootstrap(&f.project, &profile(OsFamily::Linux))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::EnvironmentSync { .. }));
        assert!(!runner.ran("sync"));
    }

    #[cfg(unix)]
    #[test]
    fn macos_writes_env_binding_once() {
        let f = fixture();
        install_fake_uv(&f.bin_dir);
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);
        let mac = profile(OsFamily::Darwin);

        let first = bootstrapper.bootstrap(&f.project, &mac).unwrap();
        assert_eq!(first.env_binding, Some(BindingOutcome::Appended));
        let second = bootstrapper.bootstrap(&f.project, &mac).unwrap();
        assert_eq!(second.env_binding, Some(BindingOutcome::AlreadyPresent));

        assert_eq!(
            fs::read_to_string(f.project.join(PROJECT_ENV_FILE)).unwrap(),
            "export OBJC_DISABLE_INITIALIZE_FORK_SAFETY=YES\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn manager_commands_see_bin_dir_on_path() {
        let f = fixture();
        install_fake_uv(&f.bin_dir);
        let runner = MockRunner::new();
        let fetcher = StaticFetcher::failing();
        let bootstrapper =
            RuntimeEnvironmentBootstrapper::new(&f.host, &f.settings, &runner, &fetcher);

        let options = bootstrapper.manager_options();
        let path = options.env.get("PATH").unwrap();
        assert!(path.starts_with(&f.bin_dir.display().to_string()));
    }
}
