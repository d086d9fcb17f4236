//! Privilege escalation discovery.

use serde::Serialize;

use crate::error::{ProvisionError, Result};
use crate::host::HostContext;

/// Elevation helper used when not running as root.
pub const ELEVATION_HELPER: &str = "sudo";

/// How privileged commands are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrivilegeContext {
    /// An elevation helper is available (or not needed).
    pub can_elevate: bool,
    /// The process already runs as root.
    pub is_root: bool,
}

impl PrivilegeContext {
    /// Context for a process running as root.
    pub fn root() -> Self {
        Self {
            can_elevate: true,
            is_root: true,
        }
    }

    /// Context for a user with the elevation helper available.
    pub fn with_helper() -> Self {
        Self {
            can_elevate: true,
            is_root: false,
        }
    }

    /// Prefix `command` with the elevation helper unless already root.
    pub fn wrap(&self, command: &str) -> String {
        if self.is_root {
            command.to_string()
        } else {
            format!("{} {}", ELEVATION_HELPER, command)
        }
    }
}

/// Decide how to run privileged commands on this host.
///
/// # Errors
///
/// `NoPrivilegeEscalation` when not root and the helper isn't on `PATH`.
pub fn resolve(host: &HostContext) -> Result<PrivilegeContext> {
    if host.is_root {
        return Ok(PrivilegeContext::root());
    }

    match host.find_program(ELEVATION_HELPER) {
        Some(path) => {
            tracing::debug!("Using {} for privileged commands", path.display());
            Ok(PrivilegeContext::with_helper())
        }
        None => Err(ProvisionError::NoPrivilegeEscalation {
            helper: ELEVATION_HELPER.to_string(),
        }),
    }
}
