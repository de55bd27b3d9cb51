use std::error::Error;
use std::fmt;
use std::io;

/// Error type for logging sessions and their surroundings
#[derive(Debug)]
pub enum LogError {
    /// The output sink could not be opened
    SinkUnavailable(io::Error),
    /// Writing to or seeking in an open sink failed
    Io(io::Error),
    /// Opening or talking to a MIDI device failed
    Device(String),
    /// Settings could not be loaded or are out of range
    Config(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::SinkUnavailable(e) => write!(f, "MIDI log sink unavailable: {}", e),
            LogError::Io(e) => write!(f, "MIDI log I/O error: {}", e),
            LogError::Device(msg) => write!(f, "MIDI device error: {}", msg),
            LogError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl Error for LogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LogError::SinkUnavailable(e) | LogError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        LogError::Io(e)
    }
}

impl From<::config::ConfigError> for LogError {
    fn from(e: ::config::ConfigError) -> Self {
        LogError::Config(e.to_string())
    }
}

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LogError>;
