//! Platform detection and privilege resolution.
//!
//! - [`detector`] - Classifies the host into a [`PlatformProfile`]
//! - [`privilege`] - Decides how privileged commands are run

pub mod detector;
pub mod privilege;

pub use detector::{
    detect, from_os_release, is_supported_codename, OsFamily, PlatformProfile,
    SUPPORTED_CODENAMES,
};
pub use privilege::{resolve, PrivilegeContext, ELEVATION_HELPER};
