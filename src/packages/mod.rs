//! System package catalog and installation.
//!
//! - [`catalog`] - The static package batches per package manager
//! - [`installer`] - Runs the package manager for those batches

pub mod catalog;
pub mod installer;

pub use catalog::{
    batches_for, PackageBatch, PackageManager, PackageSpec, BASE_TOOLCHAIN, PROJECT_SPECIFIC,
};
pub use installer::{
    manager_for, InstallReport, SystemPackageInstaller, HOMEBREW_INSTALLER_URL,
    UNSUPPORTED_PLATFORM_PROMPT,
};
