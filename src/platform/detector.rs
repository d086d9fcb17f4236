//! Host platform classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EnvFileParser;
use crate::error::{ProvisionError, Result};
use crate::host::HostContext;

/// Ubuntu release codenames this setup is written for.
pub const SUPPORTED_CODENAMES: [&str; 3] = ["jammy", "kinetic", "noble"];

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Darwin,
    Other,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Linux => write!(f, "linux"),
            OsFamily::Darwin => write!(f, "darwin"),
            OsFamily::Other => write!(f, "other"),
        }
    }
}

/// What the host is, decided once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub os_family: OsFamily,
    /// os-release `ID` ("ubuntu", "debian", ...), or "macos".
    pub distribution_id: String,
    /// os-release `VERSION_CODENAME`; empty on macOS.
    pub version_codename: String,
    /// os-release `VERSION_ID`; empty on macOS.
    pub version_id: String,
    pub supported: bool,
}

impl PlatformProfile {
    pub fn is_linux(&self) -> bool {
        self.os_family == OsFamily::Linux
    }

    pub fn is_darwin(&self) -> bool {
        self.os_family == OsFamily::Darwin
    }

    /// Human-readable name, e.g. "ubuntu 24.04 (noble)".
    pub fn display_name(&self) -> String {
        match (self.version_id.is_empty(), self.version_codename.is_empty()) {
            (false, false) => format!(
                "{} {} ({})",
                self.distribution_id, self.version_id, self.version_codename
            ),
            (false, true) => format!("{} {}", self.distribution_id, self.version_id),
            (true, false) => format!("{} ({})", self.distribution_id, self.version_codename),
            (true, true) => self.distribution_id.clone(),
        }
    }
}

/// Whether `codename` is on the allow-list.
pub fn is_supported_codename(codename: &str) -> bool {
    SUPPORTED_CODENAMES.contains(&codename)
}

/// Classify the host.
///
/// Darwin is identified by kernel name alone. Every other kernel needs an
/// os-release descriptor; without one the host is unreadable.
pub fn detect(host: &HostContext) -> Result<PlatformProfile> {
    if host.is_darwin() {
        return Ok(PlatformProfile {
            os_family: OsFamily::Darwin,
            distribution_id: "macos".to_string(),
            version_codename: String::new(),
            version_id: String::new(),
            supported: true,
        });
    }

    let path = &host.os_release_path;
    if !path.is_file() {
        return Err(ProvisionError::PlatformUnreadable {
            message: format!(
                "no {} on a {} host; make sure you're running on Ubuntu or similar",
                path.display(),
                host.kernel_name
            ),
        });
    }

    let vars = EnvFileParser::load(path)?;
    let profile = from_os_release(&host.kernel_name, &vars);
    tracing::debug!("Detected platform {:?}", profile);
    Ok(profile)
}

/// Build a profile from parsed os-release variables.
pub fn from_os_release(
    kernel_name: &str,
    vars: &std::collections::HashMap<String, String>,
) -> PlatformProfile {
    let get = |key: &str| vars.get(key).cloned().unwrap_or_default();

    let os_family = if kernel_name == "Linux" {
        OsFamily::Linux
    } else {
        OsFamily::Other
    };

    let mut codename = get("VERSION_CODENAME");
    if codename.is_empty() {
        codename = get("UBUNTU_CODENAME");
    }

    let supported = os_family == OsFamily::Linux && is_supported_codename(&codename);

    PlatformProfile {
        os_family,
        distribution_id: get("ID"),
        version_codename: codename,
        version_id: get("VERSION_ID"),
        supported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn host_with_release(kernel: &str, release: Option<&str>) -> (TempDir, HostContext) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("os-release");
        if let Some(content) = release {
            fs::write(&path, content).unwrap();
        }
        let mut host = HostContext::detect().with_os_release_path(path);
        host.kernel_name = kernel.to_string();
        (temp, host)
    }

    fn release(codename: &str) -> String {
        format!("ID=ubuntu\nVERSION_ID=\"x\"\nVERSION_CODENAME={codename}\n")
    }

    #[test]
    fn supported_codenames_are_supported() {
        for codename in SUPPORTED_CODENAMES {
            let (_temp, host) = host_with_release("Linux", Some(&release(codename)));
            let profile = detect(&host).unwrap();
            assert!(profile.supported, "{codename} should be supported");
            assert_eq!(profile.os_family, OsFamily::Linux);
            assert_eq!(profile.version_codename, codename);
        }
    }

    #[test]
    fn other_codenames_are_unsupported() {
        for codename in ["focal", "bionic", "bookworm", "oracular", ""] {
            let (_temp, host) = host_with_release("Linux", Some(&release(codename)));
            let profile = detect(&host).unwrap();
            assert!(!profile.supported, "{codename:?} should be unsupported");
        }
    }

    #[test]
    fn noble_profile_fields() {
        let content = "ID=ubuntu\nVERSION_ID=\"24.04\"\nVERSION_CODENAME=noble\n";
        let (_temp, host) = host_with_release("Linux", Some(content));
        let profile = detect(&host).unwrap();
        assert_eq!(
            profile,
            PlatformProfile {
                os_family: OsFamily::Linux,
                distribution_id: "ubuntu".to_string(),
                version_codename: "noble".to_string(),
                version_id: "24.04".to_string(),
                supported: true,
            }
        );
        assert_eq!(profile.display_name(), "ubuntu 24.04 (noble)");
    }

    #[test]
    fn falls_back_to_ubuntu_codename() {
        let content = "ID=pop\nUBUNTU_CODENAME=jammy\n";
        let (_temp, host) = host_with_release("Linux", Some(content));
        let profile = detect(&host).unwrap();
        assert_eq!(profile.version_codename, "jammy");
        assert!(profile.supported);
    }

    #[test]
    fn missing_os_release_is_unreadable() {
        let (_temp, host) = host_with_release("Linux", None);
        let err = detect(&host).unwrap_err();
        assert!(matches!(err, ProvisionError::PlatformUnreadable { .. }));
    }

    #[test]
    fn darwin_needs_no_os_release() {
        let (_temp, host) = host_with_release("Darwin", None);
        let profile = detect(&host).unwrap();
        assert!(profile.is_darwin());
        assert!(profile.supported);
        assert_eq!(profile.display_name(), "macos");
    }

    #[test]
    fn unknown_kernel_with_os_release_is_other() {
        let (_temp, host) = host_with_release("FreeBSD", Some(&release("noble")));
        let profile = detect(&host).unwrap();
        assert_eq!(profile.os_family, OsFamily::Other);
        assert!(!profile.supported);
    }

    #[test]
    fn unknown_kernel_without_os_release_is_unreadable() {
        let mut host = HostContext::detect().with_os_release_path(PathBuf::from("/nonexistent"));
        host.kernel_name = "SunOS".to_string();
        assert!(detect(&host).is_err());
    }

    #[test]
    fn profile_serializes_lowercase_family() {
        let profile = PlatformProfile {
            os_family: OsFamily::Darwin,
            distribution_id: "macos".to_string(),
            version_codename: String::new(),
            version_id: String::new(),
            supported: true,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"os_family\":\"darwin\""));
    }
}
