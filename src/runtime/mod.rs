//! Runtime environment bootstrapping.
//!
//! - [`fetch`] - Installer script downloads
//! - [`lockfile`] - Pinned dependency snapshots
//! - [`bootstrap`] - Manager install and environment sync

pub mod bootstrap;
pub mod fetch;
pub mod lockfile;

pub use bootstrap::{
    BootstrapReport, RuntimeEnvironmentBootstrapper, FORK_SAFETY_VAR, PROJECT_ENV_FILE,
};
pub use fetch::{fetch_and_run, HttpFetcher, ScriptFetcher, StaticFetcher};
pub use lockfile::{LockfileSnapshot, PinnedPackage};
