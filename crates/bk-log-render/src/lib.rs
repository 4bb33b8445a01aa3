//! Buildkite log rendering
//!
//! Converts raw Buildkite job logs (ANSI escape codes, Buildkite's own
//! inline timestamp markers) into HTML suitable for the public-log page,
//! and formats build/job timing for humans.

mod ansi;
mod timing;

pub use ansi::{ansi_to_html, html_escape};
pub use timing::{humanize_duration, timespan};
