//! Small helpers shared by the binary and the library.

use std::time::Duration;

/// Render a duration as `"{h}h {m}m {s}s {ms}ms"`
pub fn format_execution_time(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{hours}h {minutes}m {seconds}s {millis}ms")
}
