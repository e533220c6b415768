//! Bounded, non-blocking event queue.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use super::ProgressEvent;

/// Default number of events the queue holds before new events are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Producer side of the event queue.
///
/// Cheap to clone; clones feed the same queue and may be used from any
/// thread concurrently.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::Sender<ProgressEvent>,
}

/// Consumer side of the event queue.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: mpsc::Receiver<ProgressEvent>,
}

impl EventSink {
    /// Create a bounded queue holding at most `capacity` events (minimum 1).
    pub fn bounded(capacity: usize) -> (EventSink, EventReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (EventSink { sender }, EventReceiver { receiver })
    }

    /// Enqueue an event without blocking.
    ///
    /// Returns `false` when the event was dropped because the queue is full
    /// or the consumer has gone away.
    pub fn try_push(&self, event: ProgressEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::trace!(kind = %event.kind, "event queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

impl EventReceiver {
    /// Take the next queued event, if any, without blocking.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the next event arrives.
    ///
    /// Returns `None` once every [`EventSink`] has been dropped and the queue
    /// is empty. Must not be called from inside an async runtime.
    pub fn recv_blocking(&mut self) -> Option<ProgressEvent> {
        self.receiver.blocking_recv()
    }

    /// Take every event currently queued.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
