//! ANSI-to-HTML conversion for Buildkite job logs
//!
//! Buildkite interleaves two kinds of escapes in raw logs: ordinary SGR
//! color/intensity codes, and its own application program commands of the
//! form `ESC _bk;t=<millis> BEL` carrying per-line timestamps. The
//! timestamp markers are stripped; SGR codes become `<span>` elements with
//! `term-*` classes that the stylesheet maps back to colors.

use ansi_parser::{AnsiParser, AnsiSequence, Output};
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

/// Current SGR state while walking a log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SgrState {
    bold: bool,
    fg: Option<u8>,
    bg: Option<u8>,
}

impl SgrState {
    fn is_plain(&self) -> bool {
        *self == SgrState::default()
    }

    fn apply(&mut self, code: u8) {
        match code {
            0 => *self = SgrState::default(),
            1 => self.bold = true,
            22 => self.bold = false,
            30..=37 | 90..=97 => self.fg = Some(code),
            39 => self.fg = None,
            40..=47 | 100..=107 => self.bg = Some(code),
            49 => self.bg = None,
            // Unsupported attributes (underline, italics, 256-color
            // introducers) render as unstyled text
            _ => {}
        }
    }

    fn classes(&self) -> String {
        let mut classes = Vec::new();
        if self.bold {
            classes.push("term-bold".to_string());
        }
        if let Some(fg) = self.fg {
            classes.push(format!("term-fg{fg}"));
        }
        if let Some(bg) = self.bg {
            classes.push(format!("term-bg{bg}"));
        }
        classes.join(" ")
    }
}

fn bk_timestamp_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\u{1b}_bk;[^\u{07}]*\u{07}").expect("static regex"))
}

/// Escape text for inclusion in HTML element content
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a raw Buildkite job log as HTML
///
/// Output is a sequence of escaped text and `<span class="term-...">`
/// elements, newlines preserved; the caller wraps it in `<pre>`.
pub fn ansi_to_html(log: &str) -> String {
    let cleaned = bk_timestamp_marker().replace_all(log, "");

    let mut html = String::with_capacity(cleaned.len());
    let mut state = SgrState::default();

    for block in cleaned.ansi_parse() {
        match block {
            Output::TextBlock(text) => {
                if text.is_empty() {
                    continue;
                }
                if state.is_plain() {
                    html.push_str(&html_escape(text));
                } else {
                    let _ = write!(
                        html,
                        "<span class=\"{}\">{}</span>",
                        state.classes(),
                        html_escape(text)
                    );
                }
            }
            Output::Escape(AnsiSequence::SetGraphicsMode(modes)) => {
                if modes.is_empty() {
                    // ESC[m is shorthand for reset
                    state = SgrState::default();
                } else {
                    for &code in modes.iter() {
                        state.apply(code);
                    }
                }
            }
            // Cursor movement and erase sequences carry no text
            Output::Escape(_) => {}
        }
    }

    html
}
