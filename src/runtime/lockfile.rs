//! Lockfile snapshots.
//!
//! A [`LockfileSnapshot`] is what the environment sync will pin: the set of
//! `(name, version)` pairs from the lockfile's `[[package]]` tables plus a
//! digest of the file bytes. Two hosts with the same lockfile produce the
//! same snapshot.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{ProvisionError, Result};

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(name|version)\s*=\s*"([^"]*)"\s*$"#).expect("KEY_VALUE must compile")
});

/// A pinned dependency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PinnedPackage {
    pub name: String,
    /// Empty for packages without a static version.
    pub version: String,
}

/// The pinned dependency set of a lockfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockfileSnapshot {
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the file contents.
    pub digest: String,
    pub packages: BTreeSet<PinnedPackage>,
}

impl LockfileSnapshot {
    /// Read and parse the lockfile at `path`.
    ///
    /// # Errors
    ///
    /// `EnvironmentSync` if the lockfile is missing or unreadable.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProvisionError::EnvironmentSync {
            path: path.to_path_buf(),
            message: format!("cannot read lockfile: {}", e),
        })?;
        Ok(Self::parse(path, &content))
    }

    /// Build a snapshot from lockfile text.
    pub fn parse(path: &Path, content: &str) -> Self {
        let hash = Sha256::digest(content.as_bytes());
        Self {
            path: path.to_path_buf(),
            digest: hex::encode(&hash[..]),
            packages: parse_packages(content),
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Version pinned for `name`, if present.
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.packages
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.version.as_str())
    }
}

fn parse_packages(content: &str) -> BTreeSet<PinnedPackage> {
    let mut packages = BTreeSet::new();
    let mut current: Option<(Option<String>, Option<String>)> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            flush(&mut current, &mut packages);
            // Sub-tables like [package.metadata] end the package's own keys.
            if line == "[[package]]" {
                current = Some((None, None));
            }
            continue;
        }

        let Some((name, version)) = current.as_mut() else {
            continue;
        };
        if let Some(caps) = KEY_VALUE.captures(line) {
            let slot = if &caps[1] == "name" { name } else { version };
            if slot.is_none() {
                *slot = Some(caps[2].to_string());
            }
        }
    }
    flush(&mut current, &mut packages);
    packages
}

fn flush(
    current: &mut Option<(Option<String>, Option<String>)>,
    packages: &mut BTreeSet<PinnedPackage>,
) {
    if let Some((Some(name), version)) = current.take() {
        packages.insert(PinnedPackage {
            name,
            version: version.unwrap_or_default(),
        });
    }
}
