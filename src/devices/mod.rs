//! Hardware permission rules.
//!
//! - [`catalog`] - The USB rules the supported devices need
//! - [`rules`] - Writes rules files and reloads the device manager

pub mod catalog;
pub mod rules;

pub use catalog::{default_rules, DeviceRule, DEVICE_MODE};
pub use rules::{render_files, DeviceRuleInstaller, RulesReport, RELOAD_COMMANDS};
