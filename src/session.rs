//! Logging session
//!
//! A [`LogSession`] owns everything needed to turn received MIDI bytes into a
//! MIDI file: the decoder, the timebase and the file writer. It is fed one
//! byte at a time through [`LogSession::on_byte_received`] and finalized by
//! [`LogSession::close`] (or on drop), which always leaves a complete file.

use crate::decoder::{CommandDecoder, CommandSink};
use crate::error::{LogError, Result};
use crate::smf::{SmfWriter, END_OF_TRACK};
use crate::timebase::{TimeSource, Timebase};
use log::{debug, error, info};
use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;

/// Counters describing a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub bytes_received: u64,
    pub events_written: u64,
    pub write_errors: u64,
    /// Size of the track chunk, known once the session is closed
    pub track_length: Option<u32>,
}

enum SessionState<W: Write + Seek> {
    Recording(SmfWriter<W>),
    Unavailable(LogError),
    Closed,
}

pub struct LogSession<W: Write + Seek, T: TimeSource> {
    state: SessionState<W>,
    decoder: CommandDecoder,
    timebase: Timebase<T>,
    stats: SessionStats,
}

impl<T: TimeSource> LogSession<BufWriter<File>, T> {
    /// Creates the file at `path` and starts logging into it.
    ///
    /// If the file cannot be created the error is logged and an inactive
    /// session is returned which ignores every byte.
    pub fn create(path: &Path, time: T, resolution: u32) -> Self {
        let session = Self::open(File::create(path).map(BufWriter::new), time, resolution);
        if session.is_active() {
            info!(
                "MIDI log opened: {} at {} ticks/s",
                path.display(),
                session.timebase.resolution()
            );
        }
        session
    }
}

impl<W: Write + Seek, T: TimeSource> LogSession<W, T> {
    /// Starts logging into `sink`.
    pub fn start(sink: W, time: T, resolution: u32) -> Self {
        Self::open(Ok(sink), time, resolution)
    }

    fn open(sink: io::Result<W>, time: T, resolution: u32) -> Self {
        let timebase = Timebase::new(time, resolution);
        let state = match sink.and_then(|sink| SmfWriter::create(sink, timebase.division())) {
            Ok(writer) => SessionState::Recording(writer),
            Err(e) => {
                error!("Cannot open MIDI log, received bytes will be dropped: {}", e);
                SessionState::Unavailable(LogError::SinkUnavailable(e))
            }
        };

        Self {
            state,
            decoder: CommandDecoder::new(),
            timebase,
            stats: SessionStats::default(),
        }
    }

    /// Whether received bytes are being written
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Recording(_))
    }

    /// Why the session never started recording, if it did not
    pub fn unavailable_reason(&self) -> Option<&LogError> {
        match &self.state {
            SessionState::Unavailable(e) => Some(e),
            _ => None,
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Processes one byte as delivered by the receiver.
    pub fn on_byte_received(&mut self, byte: u8) {
        let SessionState::Recording(writer) = &mut self.state else {
            return;
        };

        self.stats.bytes_received += 1;
        let mut recorder = Recorder {
            writer,
            timebase: &mut self.timebase,
            stats: &mut self.stats,
        };
        self.decoder.push(byte, &mut recorder);
    }

    pub fn on_bytes_received(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.on_byte_received(byte);
        }
    }

    /// Finalizes the file: writes out any unfinished message, appends the end
    /// of track event and fills in the track length.
    ///
    /// Returns the sink on the first call and `None` afterwards.
    pub fn close(&mut self) -> Result<Option<W>> {
        let mut writer = match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Recording(writer) => writer,
            other => {
                self.state = other;
                return Ok(None);
            }
        };

        let mut recorder = Recorder {
            writer: &mut writer,
            timebase: &mut self.timebase,
            stats: &mut self.stats,
        };
        if !self.decoder.is_at_boundary() {
            debug!(
                "Writing out unfinished message of {} bytes",
                self.decoder.pending().len()
            );
        }
        self.decoder.flush(&mut recorder);
        recorder.message_started();
        recorder.commit(&END_OF_TRACK);

        let (sink, track_length) = writer.finish()?;
        self.stats.track_length = Some(track_length);
        info!(
            "MIDI log closed: {} bytes received, {} events, track length {}",
            self.stats.bytes_received, self.stats.events_written, track_length
        );
        if self.stats.write_errors > 0 {
            error!("MIDI log had {} write errors", self.stats.write_errors);
        }
        Ok(Some(sink))
    }
}

impl<W: Write + Seek, T: TimeSource> Drop for LogSession<W, T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Failed to finalize MIDI log: {}", e);
        }
    }
}

/// Writes committed messages with their delta times
struct Recorder<'a, W: Write + Seek, T: TimeSource> {
    writer: &'a mut SmfWriter<W>,
    timebase: &'a mut Timebase<T>,
    stats: &'a mut SessionStats,
}

impl<W: Write + Seek, T: TimeSource> CommandSink for Recorder<'_, W, T> {
    fn message_started(&mut self) {
        self.timebase.sample();
    }

    fn commit(&mut self, command: &[u8]) {
        let Some(&lead) = command.first() else {
            return;
        };

        // a lost event's gap carries into the next delta
        let delta = self.timebase.pending_delta();
        match self.writer.write_event(delta, command) {
            Ok(()) => {
                self.timebase.take_delta();
                self.stats.events_written += 1;
                debug!(
                    "Event {:02X} at tick {} (+{}), {} bytes",
                    lead,
                    self.timebase.committed_tick(),
                    delta,
                    command.len()
                );
            }
            Err(e) => {
                self.stats.write_errors += 1;
                if self.stats.write_errors == 1 {
                    error!("Failed to write MIDI event: {}", e);
                }
            }
        }
    }
}
