//! Terminal presentation of download progress.

mod progress;

pub use progress::{EventDisplay, ProgressConsumer};
