//! Output verbosity.

/// How much a run prints, chosen from the global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Package manager and installer output goes straight to the terminal.
    Verbose,
    #[default]
    Normal,
    /// Step results and the final summary.
    Quiet,
    /// Errors only. Used with `--json` so stdout holds the report alone.
    Silent,
}

impl OutputMode {
    /// Resolve the mode from `--json`, `--quiet` and `--verbose`.
    ///
    /// JSON output wins over both, and quiet wins over verbose.
    pub fn from_flags(json: bool, quiet: bool, verbose: bool) -> Self {
        match (json, quiet, verbose) {
            (true, _, _) => Self::Silent,
            (false, true, _) => Self::Quiet,
            (false, false, true) => Self::Verbose,
            _ => Self::Normal,
        }
    }

    /// Whether child processes inherit stdout/stderr instead of being captured.
    pub fn streams_commands(self) -> bool {
        self == Self::Verbose
    }

    /// Whether long steps get an animated spinner.
    ///
    /// Streamed child output would tear the spinner line, so verbose runs
    /// print a plain line instead.
    pub fn animates(self) -> bool {
        matches!(self, Self::Normal | Self::Quiet)
    }

    pub fn prints_status(self) -> bool {
        self != Self::Silent
    }
}
