//! Configuration file discovery and loading.

use crate::config::schema::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding project-level configuration.
pub const CONFIG_DIR: &str = ".hostprep";

/// Project config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yml";

/// Default project config location.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load configuration for a project.
///
/// An `explicit` path must exist. Without one, the project config is
/// optional and defaults apply when it is absent.
///
/// # Errors
///
/// Returns `ConfigNotFound` if `explicit` doesn't exist.
/// Returns `ConfigParse` if the YAML is invalid.
pub fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<ProvisionConfig> {
    match explicit {
        Some(path) => load_config_file(path),
        None => {
            let path = project_config_path(project_root);
            if path.exists() {
                load_config_file(&path)
            } else {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(ProvisionConfig::default())
            }
        }
    }
}

/// Load a single config file.
pub fn load_config_file(path: &Path) -> Result<ProvisionConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProvisionError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ProvisionError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into a config.
///
/// An empty document is treated as all defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ProvisionConfig> {
    if content.trim().is_empty() {
        return Ok(ProvisionConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ProvisionError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
