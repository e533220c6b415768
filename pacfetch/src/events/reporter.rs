//! Deduplicating event reporter.

use std::collections::HashMap;

use super::{EventKind, EventSink, ProgressEvent};

/// Forwards events to an [`EventSink`], skipping repeats.
///
/// An event is delivered only when its text differs from the last text
/// delivered for the same kind by this reporter. Delivery is best effort:
/// a full queue drops the event.
///
/// Without a sink, events other than [`EventKind::Percent`] go to the debug
/// log instead.
#[derive(Debug, Default)]
pub struct EventReporter {
    sink: Option<EventSink>,
    last_event: HashMap<EventKind, String>,
}

impl EventReporter {
    /// Create a reporter feeding `sink`, or the debug log when `None`.
    pub fn new(sink: Option<EventSink>) -> Self {
        Self {
            sink,
            last_event: HashMap::new(),
        }
    }

    /// The sink this reporter feeds, if any.
    pub fn sink(&self) -> Option<&EventSink> {
        self.sink.as_ref()
    }

    /// Queue an event for the UI.
    pub fn queue_event(&mut self, kind: EventKind, text: impl Into<String>) {
        let text = text.into();

        let Some(sink) = &self.sink else {
            if kind != EventKind::Percent {
                tracing::debug!("{}:{}", kind, text);
            }
            return;
        };

        if self.last_event.get(&kind) == Some(&text) {
            return;
        }
        self.last_event.insert(kind, text.clone());

        sink.try_push(ProgressEvent::new(kind, text));
    }

    /// Last text delivered for `kind`.
    pub fn last_text(&self, kind: EventKind) -> Option<&str> {
        self.last_event.get(&kind).map(String::as_str)
    }
}
