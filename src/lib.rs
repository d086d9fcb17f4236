//! hostprep - Development host provisioning.
//!
//! hostprep brings a bare Linux or macOS machine to the point where a
//! project's build can run: system packages, USB device permissions, the
//! Python runtime manager and a synced project environment.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Optional YAML configuration
//! - [`devices`] - Device permission rules
//! - [`error`] - Error types and result aliases
//! - [`host`] - Host facts gathered once at startup
//! - [`orchestrator`] - The provisioning step sequence
//! - [`packages`] - System package catalog and installation
//! - [`platform`] - Platform detection and privilege resolution
//! - [`profile`] - Shell startup file bindings
//! - [`retry`] - Fixed-delay retries
//! - [`runtime`] - Runtime manager install and environment sync
//! - [`shell`] - Shell command execution
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use hostprep::config::EnvFileParser;
//! use hostprep::platform::from_os_release;
//!
//! let vars = EnvFileParser::parse("ID=ubuntu\nVERSION_ID=\"22.04\"\nVERSION_CODENAME=jammy\n");
//! let profile = from_os_release("Linux", &vars);
//! assert!(profile.supported);
//! assert_eq!(profile.display_name(), "ubuntu 22.04 (jammy)");
//! ```
//!
//! For complete provisioning runs, see the integration tests.

pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod packages;
pub mod platform;
pub mod profile;
pub mod retry;
pub mod runtime;
pub mod shell;
pub mod ui;

pub use error::{ProvisionError, Result};
