//! Human-readable timing for builds and jobs

use chrono::{DateTime, Utc};

/// Format a duration as a short human-readable string
///
/// Negative durations (clock skew between Buildkite timestamps) collapse
/// to "0s".
pub fn humanize_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds().max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Format the span between two lifecycle timestamps
///
/// Returns `None` when the span hasn't begun; an open end is measured
/// against now (e.g., a job still running).
pub fn timespan(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<String> {
    let start = start?;
    let end = end.unwrap_or_else(Utc::now);
    Some(humanize_duration(end - start))
}
