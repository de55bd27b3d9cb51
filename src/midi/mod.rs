//! MIDI byte sources and destinations
//!
//! Bytes reach a logging session from one of two places:
//! - [`MidiInputSource`], a live input port opened through midir, which
//!   forwards every received message into a channel as [`InputEvent::Bytes`]
//! - [`replay`], which feeds a raw byte dump (e.g. captured from a serial
//!   line) paced at the MIDI wire speed
//!
//! While capturing live, received bytes can also be passed on unchanged to a
//! [`ThruPort`] such as [`MidiThru`], a live output port.

mod input;
mod output;
mod replay;

use crate::error::Result;

pub use input::MidiInputSource;
pub use output::MidiThru;
pub use replay::replay;

/// Messages for the capture loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Bytes in wire order
    Bytes(Vec<u8>),
    /// Stop capturing and finalize the file
    Stop,
}

/// Destination for received bytes, passed on as they arrive
pub trait ThruPort {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

#[cfg(not(feature = "test-mock"))]
pub fn list_input_devices(client_name: &str) -> Vec<String> {
    input::port_names(client_name)
}

#[cfg(feature = "test-mock")]
pub fn list_input_devices(_client_name: &str) -> Vec<String> {
    // Mock implementation for tests
    vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
}

#[cfg(not(feature = "test-mock"))]
pub fn list_output_devices(client_name: &str) -> Vec<String> {
    output::port_names(client_name)
}

#[cfg(feature = "test-mock")]
pub fn list_output_devices(_client_name: &str) -> Vec<String> {
    vec!["Mock Output 1".to_string()]
}
