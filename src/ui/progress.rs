//! Duration formatting for step logs.

use std::time::Duration;

/// Format a step duration compactly ("850ms", "12.3s", "4.5m").
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

/// Format wall-clock time since the run started, as whole seconds.
pub fn format_elapsed(d: Duration) -> String {
    format!("t={}s", d.as_secs())
}
