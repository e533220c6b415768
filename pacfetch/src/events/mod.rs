//! Progress events for the installer UI.
//!
//! Events are `(kind, text)` pairs pushed onto a bounded queue that a UI
//! thread drains. Producers never wait on the queue:
//!
//! ```text
//! DownloadCoordinator ──┐
//!                       ├──► EventReporter ──► EventSink ══(bounded)══► EventReceiver ──► UI
//! DownloadBackend ──────┘    (dedup per kind)   (try_push)
//! ```
//!
//! Every producer owns its own [`EventReporter`], so the "last emitted text
//! per kind" map is never shared between a coordinator and its backend or
//! between two sessions.

mod reporter;
mod sink;

pub use reporter::EventReporter;
pub use sink::{EventReceiver, EventSink, DEFAULT_QUEUE_CAPACITY};

use std::fmt;

use serde::Serialize;

/// Kind of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Overall progress of the current step, as a ratio text (`"0.5"`).
    Percent,
    /// Status line text. An empty text clears the status line.
    Info,
    /// Non-fatal error text for the user.
    Error,
    /// Progress of the download itself, as a ratio text.
    DownloadsPercent,
    /// Per-file download progress text (`"3/10"`).
    DownloadsProgress,
}

impl EventKind {
    /// Wire name of the kind as seen by event consumers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Info => "info",
            Self::Error => "error",
            Self::DownloadsPercent => "downloads_percent",
            Self::DownloadsProgress => "downloads_progress",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event delivered to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Event text.
    pub text: String,
}

impl ProgressEvent {
    /// Create a new event.
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Format a completion ratio the way progress consumers expect it.
///
/// The ratio is rounded to two decimals and always carries a fractional
/// part, so `1/2` is `"0.5"` and `2/2` is `"1.0"`. Rounding applies to the
/// exact binary value of the quotient: `1/40` is `"0.03"` because the double
/// nearest to 0.025 lies just above it.
pub fn format_ratio(done: usize, total: usize) -> String {
    if total == 0 {
        return format_fraction(1.0);
    }
    format_fraction(done as f64 / total as f64)
}

/// Format a fraction in `[0, 1]` as [`format_ratio`] does.
pub fn format_fraction(fraction: f64) -> String {
    let mut text = format!("{:.2}", fraction.clamp(0.0, 1.0));
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(EventKind::Percent.as_str(), "percent");
        assert_eq!(EventKind::Info.as_str(), "info");
        assert_eq!(EventKind::DownloadsPercent.to_string(), "downloads_percent");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(1, 2), "0.5");
        assert_eq!(format_ratio(2, 2), "1.0");
        assert_eq!(format_ratio(1, 3), "0.33");
        assert_eq!(format_ratio(2, 3), "0.67");
        assert_eq!(format_ratio(0, 4), "0.0");
    }

    #[test]
    fn test_format_ratio_rounds_ties_to_even() {
        // 1/8 = 0.125 exactly
        assert_eq!(format_ratio(1, 8), "0.12");
    }

    #[test]
    fn test_format_ratio_rounds_the_binary_quotient() {
        assert_eq!(format_ratio(1, 40), "0.03");
        assert_eq!(format_ratio(3, 40), "0.07");
        assert_eq!(format_ratio(9, 40), "0.23");
        assert_eq!(format_ratio(4, 40), "0.1");
    }

    #[test]
    fn test_format_ratio_empty_total_is_complete() {
        assert_eq!(format_ratio(0, 0), "1.0");
    }

    #[test]
    fn test_format_fraction_clamps() {
        assert_eq!(format_fraction(1.7), "1.0");
        assert_eq!(format_fraction(-0.2), "0.0");
        assert_eq!(format_fraction(0.456), "0.46");
    }

    #[test]
    fn test_progress_event_serializes_kind_as_wire_name() {
        let event = ProgressEvent::new(EventKind::DownloadsProgress, "1/3");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"kind":"downloads_progress","text":"1/3"}"#);
    }
}
