//! USB permission rules for the supported hardware.

use std::path::{Path, PathBuf};

/// Permission bits granted to matching devices.
pub const DEVICE_MODE: u32 = 0o666;

const VENDORS: [&str; 2] = ["bbaa", "3801"];

/// (file name, product ids), in the order files are written.
const RULE_FILES: [(&str, [&str; 2]); 2] = [
    ("12-panda_jungle.rules", ["ddcf", "ddef"]),
    ("11-panda.rules", ["ddcc", "ddee"]),
];

/// One device permission rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRule {
    pub target_file: PathBuf,
    pub vendor_id: String,
    pub product_id: String,
    pub permission_mode: u32,
    pub rule_line: String,
}

impl DeviceRule {
    /// A rule matching a USB device by vendor and product id.
    pub fn usb(target_file: PathBuf, vendor_id: &str, product_id: &str, mode: u32) -> Self {
        let rule_line = format!(
            "SUBSYSTEM==\"usb\", ATTRS{{idVendor}}==\"{}\", ATTRS{{idProduct}}==\"{}\", MODE=\"{:04o}\"",
            vendor_id, product_id, mode
        );
        Self {
            target_file,
            vendor_id: vendor_id.to_string(),
            product_id: product_id.to_string(),
            permission_mode: mode,
            rule_line,
        }
    }
}

/// Every rule for the supported devices, targeting files in `rules_dir`.
pub fn default_rules(rules_dir: &Path) -> Vec<DeviceRule> {
    let mut rules = Vec::new();
    for (file, products) in RULE_FILES {
        let target = rules_dir.join(file);
        for vendor in VENDORS {
            for product in products {
                rules.push(DeviceRule::usb(target.clone(), vendor, product, DEVICE_MODE));
            }
        }
    }
    rules
}
