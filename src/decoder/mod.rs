//! MIDI byte stream decoder
//!
//! [`CommandDecoder`] turns a raw MIDI byte stream into complete messages,
//! one byte at a time, the way a serial receiver delivers them:
//! - running status: data bytes without a status byte reuse the last channel
//!   status, and the committed message omits the status byte as well
//! - SysEx: collected until 0xF7, or until any other status byte, which ends
//!   the SysEx and starts a new message
//! - system common and realtime messages have no place in a MIDI file and are
//!   dropped, while 0xFF (reset) is recorded as a "Device Reset" marker
//!
//! Completed messages are handed to a [`CommandSink`].

mod tables;

pub use tables::{data_bytes, VARIABLE};

use log::{debug, trace};
use tables::{is_status, is_sysex, is_unrepresentable};

/// Upper bound on a buffered message; longer SysEx data is cut here
pub const MAX_COMMAND_LEN: usize = 0x2000;

const META_MARKER: u8 = 0x06;
const DEVICE_RESET_TEXT: &[u8] = b"Device Reset";

/// Receives the output of a [`CommandDecoder`]
pub trait CommandSink {
    /// Called when the byte just received starts a new message.
    fn message_started(&mut self);

    /// Called with every complete message.
    fn commit(&mut self, command: &[u8]);
}

#[derive(Debug)]
pub struct CommandDecoder {
    last_status: u8,
    current_status: u8,
    remaining: u32,
    buffer: Vec<u8>,
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self {
            last_status: 0,
            current_status: 0,
            remaining: 0,
            buffer: Vec::with_capacity(64),
        }
    }

    /// Feeds one received byte.
    pub fn push<S: CommandSink>(&mut self, byte: u8, sink: &mut S) {
        // A byte is handled again when it turns out to belong to a different
        // message than the one in progress; at most twice.
        let mut pending = Some(byte);
        while let Some(byte) = pending.take() {
            pending = if self.remaining == 0 {
                self.begin(byte, sink)
            } else {
                self.collect(byte, sink)
            };
        }
    }

    /// Commits whatever has been collected so far, complete or not.
    pub fn flush<S: CommandSink>(&mut self, sink: &mut S) {
        self.commit(sink);
        self.remaining = 0;
    }

    pub fn is_at_boundary(&self) -> bool {
        self.remaining == 0
    }

    /// Running status in effect, if any
    #[cfg(test)]
    fn running_status(&self) -> Option<u8> {
        (self.last_status != 0).then_some(self.last_status)
    }

    /// Bytes collected for the message in progress
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    fn begin<S: CommandSink>(&mut self, byte: u8, sink: &mut S) -> Option<u8> {
        self.commit(sink);

        if is_status(byte) {
            self.current_status = byte;
            if byte < 0xF0 {
                self.last_status = byte;
            }
        } else if self.last_status == 0 {
            trace!("Dropping data byte {:02X}: no running status", byte);
            return None;
        } else {
            self.current_status = self.last_status;
        }

        self.remaining = data_bytes(self.current_status);
        sink.message_started();

        if self.current_status == 0xFF {
            self.buffer.extend_from_slice(&[0xFF, META_MARKER, DEVICE_RESET_TEXT.len() as u8]);
            self.buffer.extend_from_slice(DEVICE_RESET_TEXT);
            self.commit(sink);
            return None;
        }
        if is_unrepresentable(self.current_status) {
            trace!("Dropping system message {:02X}", self.current_status);
            return None;
        }

        if is_status(byte) {
            self.buffer.push(byte);
            None
        } else {
            Some(byte)
        }
    }

    fn collect<S: CommandSink>(&mut self, byte: u8, sink: &mut S) -> Option<u8> {
        self.remaining -= 1;

        if is_sysex(self.current_status) && is_status(byte) {
            self.remaining = 0;
            if byte != 0xF7 {
                trace!("SysEx ended by status {:02X}", byte);
                self.commit(sink);
                return Some(byte);
            }
        } else if is_unrepresentable(self.current_status) {
            trace!(
                "Dropping data byte {:02X} of system message {:02X}",
                byte,
                self.current_status
            );
            return None;
        }

        self.buffer.push(byte);
        if self.buffer.len() >= MAX_COMMAND_LEN && self.remaining != 0 {
            debug!(
                "Message {:02X} reached {} bytes, truncating",
                self.current_status, MAX_COMMAND_LEN
            );
            self.remaining = 0;
        }

        if self.remaining == 0 {
            self.commit(sink);
        }
        None
    }

    fn commit<S: CommandSink>(&mut self, sink: &mut S) {
        if self.buffer.is_empty() {
            return;
        }
        sink.commit(&self.buffer);
        self.buffer.clear();
    }
}
