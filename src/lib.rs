pub mod capture;
pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod midi;
pub mod session;
pub mod smf;
pub mod timebase;
pub mod ui;

pub use capture::CaptureLoop;
pub use cli::Args;
pub use error::{LogError, Result};
pub use session::{LogSession, SessionStats};
pub use timebase::{ManualClock, MonotonicClock, TimeSource, MIDI_BAUD_RATE};
