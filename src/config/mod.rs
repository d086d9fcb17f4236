//! Configuration loading and parsing.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - `KEY=value` file parsing in [`env_file`]
//!
//! # Example
//!
//! ```
//! use hostprep::config::load_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".hostprep");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "runtime:\n  download_attempts: 3\n").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! assert_eq!(config.runtime.download_attempts, 3);
//! ```

pub mod env_file;
pub mod loader;
pub mod schema;

pub use env_file::EnvFileParser;
pub use loader::{load_config, load_config_file, parse_config, project_config_path};
pub use schema::{PackageSettings, ProvisionConfig, RuntimeSettings, Settings};
