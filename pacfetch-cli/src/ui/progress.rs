//! Renders progress events on the terminal.
//!
//! A consumer thread drains the event queue until every sender is gone.
//! On a terminal `percent` drives an `indicatif` bar and `info` becomes the
//! bar message; otherwise events are printed as plain lines.

use std::io::{self, IsTerminal};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pacfetch::events::{EventKind, EventReceiver, ProgressEvent};

/// Bar length; `percent` values are scaled onto it.
const BAR_LENGTH: u64 = 100;

/// Applies events to the terminal.
pub struct EventDisplay {
    bar: ProgressBar,
    plain: bool,
    errors: usize,
}

impl EventDisplay {
    /// Create a display, choosing bar or plain output from stderr.
    pub fn new() -> Self {
        if io::stderr().is_terminal() {
            Self::with_bar(Self::styled_bar())
        } else {
            Self::plain()
        }
    }

    /// Display drawing on the given bar.
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            plain: false,
            errors: 0,
        }
    }

    /// Display printing one line per event.
    pub fn plain() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            plain: true,
            errors: 0,
        }
    }

    fn styled_bar() -> ProgressBar {
        let bar = ProgressBar::new(BAR_LENGTH);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>7} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }

    /// Number of error events seen.
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// The underlying bar.
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// Render one event.
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event.kind {
            EventKind::Percent => {
                if let Some(position) = percent_position(&event.text) {
                    self.bar.set_position(position);
                }
            }
            EventKind::Info => {
                if self.plain {
                    if !event.text.is_empty() {
                        eprintln!("{}", event.text);
                    }
                } else {
                    self.bar.set_message(event.text.clone());
                }
            }
            EventKind::Error => {
                self.errors += 1;
                let line = format!("{} {}", style("error:").red().bold(), event.text);
                if self.plain {
                    eprintln!("{}", line);
                } else {
                    self.bar.println(line);
                }
            }
            EventKind::DownloadsProgress => self.bar.set_prefix(event.text.clone()),
            EventKind::DownloadsPercent => {}
        }
    }

    /// Clear the bar.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for EventDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Bar position for a `percent` event text such as `"0.5"`.
fn percent_position(text: &str) -> Option<u64> {
    let value: f64 = text.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64)
}

/// Background thread draining the event queue into an [`EventDisplay`].
pub struct ProgressConsumer {
    handle: JoinHandle<usize>,
}

impl ProgressConsumer {
    /// Start draining `receiver`.
    pub fn spawn(mut receiver: EventReceiver, mut display: EventDisplay) -> Self {
        let handle = thread::spawn(move || {
            while let Some(event) = receiver.recv_blocking() {
                display.apply(&event);
            }
            display.finish();
            display.errors()
        });
        Self { handle }
    }

    /// Wait until every sender is dropped and the queue is drained.
    ///
    /// Returns the number of error events shown.
    pub fn join(self) -> usize {
        self.handle.join().unwrap_or_else(|_| {
            tracing::warn!("Progress display thread panicked");
            0
        })
    }
}
