//! Detect command implementation.
//!
//! The `hostprep detect` command shows what a run would see, without
//! changing anything on the host.

use crate::cli::args::DetectArgs;
use crate::error::Result;
use crate::host::HostContext;
use crate::packages::manager_for;
use crate::platform::{self, PlatformProfile};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The detect command implementation.
pub struct DetectCommand<'a> {
    host: &'a HostContext,
    args: DetectArgs,
}

impl<'a> DetectCommand<'a> {
    /// Create a new detect command.
    pub fn new(host: &'a HostContext, args: DetectArgs) -> Self {
        Self { host, args }
    }

    fn show(&self, profile: &PlatformProfile, ui: &mut dyn UserInterface) {
        ui.show_header("Host platform");
        ui.message(&format!("Platform:        {}", profile.display_name()));
        ui.message(&format!("Family:          {}", profile.os_family));
        ui.message(&format!("Architecture:    {}", self.host.arch));
        let manager = manager_for(profile)
            .map(|m| m.to_string())
            .unwrap_or_else(|| "none".to_string());
        ui.message(&format!("Package manager: {}", manager));

        if profile.supported {
            ui.success("Supported platform");
        } else {
            ui.warning("Unsupported platform; `hostprep run` will ask before continuing");
        }
    }
}

impl Command for DetectCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let profile = platform::detect(self.host)?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&profile)
                .map_err(|e| anyhow::anyhow!("Failed to serialize platform: {}", e))?;
            println!("{}", json);
        } else {
            self.show(&profile, ui);
        }

        Ok(CommandResult::success())
    }
}
