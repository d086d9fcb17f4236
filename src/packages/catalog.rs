//! Built-in package catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PackageSettings;
use crate::shell::quote_arg;

/// Name of the first batch: compilers and core tools.
pub const BASE_TOOLCHAIN: &str = "base toolchain";

/// Name of the second batch: libraries the project links against.
pub const PROJECT_SPECIFIC: &str = "project-specific";

const APT_BASE: &[&str] = &[
    "ca-certificates",
    "clang",
    "build-essential",
    "curl",
    "libcurl4-openssl-dev",
    "locales",
    "git",
    "git-lfs",
    "xvfb",
];

const APT_PROJECT: &[&str] = &[
    "python3-dev",
    "python3-venv",
    "capnproto",
    "libcapnp-dev",
    "libeigen3-dev",
    "libffi-dev",
    "libglfw3-dev",
    "libncurses5-dev",
    "libusb-1.0-0-dev",
    "libzmq3-dev",
    "libzstd-dev",
    "libsqlite3-dev",
    "opencl-headers",
    "ocl-icd-opencl-dev",
    "portaudio19-dev",
    "qtbase5-dev",
    "qtmultimedia5-dev",
    "libqt5svg5-dev",
];

const BREW_BASE: &[&str] = &["coreutils", "git-lfs", "libtool", "llvm", "openssl@3"];

const BREW_PROJECT: &[&str] = &[
    "capnp",
    "eigen",
    "ffmpeg",
    "glfw",
    "libusb",
    "portaudio",
    "qt@5",
    "zeromq",
];

/// System package manager a package is installed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManager {
    AptGet,
    Homebrew,
}

impl PackageManager {
    /// Executable name.
    pub fn program(self) -> &'static str {
        match self {
            PackageManager::AptGet => "apt-get",
            PackageManager::Homebrew => "brew",
        }
    }

    /// Whether commands for this manager run through the elevation helper.
    pub fn needs_privilege(self) -> bool {
        matches!(self, PackageManager::AptGet)
    }

    /// Command line that refreshes the package index.
    pub fn refresh_command(self, program: &str) -> String {
        format!("{} update", quote_arg(program))
    }

    /// Command line that installs `packages`; installed packages are no-ops.
    ///
    /// Every name is shell-quoted, so each one stays a single argument.
    pub fn install_command(self, program: &str, packages: &[&str]) -> String {
        let program = quote_arg(program);
        let names = packages
            .iter()
            .map(|p| quote_arg(p))
            .collect::<Vec<_>>()
            .join(" ");
        match self {
            PackageManager::AptGet => {
                format!("{} install -y --no-install-recommends {}", program, names)
            }
            PackageManager::Homebrew => format!("{} install {}", program, names),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// One package in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub manager: PackageManager,
}

/// An ordered group of packages installed with a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBatch {
    pub name: String,
    pub manager: PackageManager,
    pub packages: Vec<PackageSpec>,
}

impl PackageBatch {
    /// Build a batch from package names, dropping repeats.
    pub fn new<S: AsRef<str>>(
        name: &str,
        manager: PackageManager,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut packages: Vec<PackageSpec> = Vec::new();
        for pkg in names {
            let pkg = pkg.as_ref().trim();
            if pkg.is_empty() || packages.iter().any(|p| p.name == pkg) {
                continue;
            }
            packages.push(PackageSpec {
                name: pkg.to_string(),
                manager,
            });
        }
        Self {
            name: name.to_string(),
            manager,
            packages,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

/// The catalog for `manager`, with configured extras appended to the
/// project-specific batch.
pub fn batches_for(manager: PackageManager, extras: &PackageSettings) -> Vec<PackageBatch> {
    let (base, project, extra) = match manager {
        PackageManager::AptGet => (APT_BASE, APT_PROJECT, &extras.extra_apt),
        PackageManager::Homebrew => (BREW_BASE, BREW_PROJECT, &extras.extra_brew),
    };

    vec![
        PackageBatch::new(BASE_TOOLCHAIN, manager, base.iter().copied()),
        PackageBatch::new(
            PROJECT_SPECIFIC,
            manager,
            project.iter().copied().chain(extra.iter().map(String::as_str)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apt_catalog_has_two_ordered_batches() {
        let batches = batches_for(PackageManager::AptGet, &PackageSettings::default());
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].name, BASE_TOOLCHAIN);
        assert_eq!(batches[1].name, PROJECT_SPECIFIC);
        assert!(batches[0].names().contains(&"build-essential"));
        assert!(batches[1].names().contains(&"libzmq3-dev"));
        assert!(batches
            .iter()
            .flat_map(|b| &b.packages)
            .all(|p| p.manager == PackageManager::AptGet));
    }

    #[test]
    fn extras_join_project_batch_without_duplicates() {
        let extras = PackageSettings {
            extra_apt: vec!["htop".into(), "libzmq3-dev".into(), " ".into()],
            extra_brew: vec![],
        };
        let batches = batches_for(PackageManager::AptGet, &extras);
        let project = &batches[1];
        assert_eq!(project.names().last(), Some(&"htop"));
        assert_eq!(
            project.names().iter().filter(|n| **n == "libzmq3-dev").count(),
            1
        );
        assert_eq!(project.len(), APT_PROJECT.len() + 1);
    }

    #[test]
    fn brew_catalog_uses_brew_extras() {
        let extras = PackageSettings {
            extra_apt: vec!["htop".into()],
            extra_brew: vec!["tmux".into()],
        };
        let batches = batches_for(PackageManager::Homebrew, &extras);
        assert!(batches[1].names().contains(&"tmux"));
        assert!(!batches[1].names().contains(&"htop"));
        assert!(batches[0].names().contains(&"git-lfs"));
    }

    #[test]
    fn install_commands() {
        assert_eq!(
            PackageManager::AptGet.install_command("apt-get", &["git", "curl"]),
            "apt-get install -y --no-install-recommends git curl"
        );
        assert_eq!(
            PackageManager::Homebrew.install_command("/opt/homebrew/bin/brew", &["capnp"]),
            "/opt/homebrew/bin/brew install capnp"
        );
        assert_eq!(
            PackageManager::AptGet.refresh_command("apt-get"),
            "apt-get update"
        );
    }

    #[test]
    fn install_command_quotes_each_name() {
        let command = PackageManager::AptGet
            .install_command("apt-get", &["htop; touch /tmp/owned", "git"]);
        assert_eq!(
            command,
            "apt-get install -y --no-install-recommends 'htop; touch /tmp/owned' git"
        );

        let command = PackageManager::Homebrew
            .install_command("/Users/dev/my brew/bin/brew", &["$(id)"]);
        assert_eq!(command, "'/Users/dev/my brew/bin/brew' install '$(id)'");
    }

    #[test]
    fn only_apt_needs_privilege() {
        assert!(PackageManager::AptGet.needs_privilege());
        assert!(!PackageManager::Homebrew.needs_privilege());
        assert_eq!(PackageManager::Homebrew.to_string(), "brew");
    }
}
