//! Terminal feedback while recording
//!
//! A spinner built with indicatif shows how many bytes and events the running
//! session has handled.

mod progress;

pub use progress::{create_capture_spinner, describe};
