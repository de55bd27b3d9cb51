use super::varlen::write_varlen;
use log::debug;
use std::io::{self, Seek, SeekFrom, Write};

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
const HEADER_LENGTH: u32 = 6;
const FORMAT_SINGLE_TRACK: u16 = 0;

/// Meta event closing every track
pub const END_OF_TRACK: [u8; 3] = [0xFF, 0x2F, 0x00];

/// Streams a Format 0 Standard MIDI File into a seekable sink.
///
/// The track chunk is opened with a zero length which `finish` patches once
/// the real size is known. The track only ever grows by whole events: an
/// event that fails to write is rewound, so the next one overwrites it.
pub struct SmfWriter<W: Write + Seek> {
    sink: W,
    track_data_start: u64,
    /// Offset just past the last complete event
    track_end: u64,
}

impl<W: Write + Seek> SmfWriter<W> {
    /// Writes the header chunk and opens the track chunk.
    pub fn create(mut sink: W, division: u16) -> io::Result<Self> {
        sink.write_all(HEADER_TAG)?;
        sink.write_all(&HEADER_LENGTH.to_be_bytes())?;
        sink.write_all(&FORMAT_SINGLE_TRACK.to_be_bytes())?;
        sink.write_all(&1u16.to_be_bytes())?;
        sink.write_all(&division.to_be_bytes())?;

        sink.write_all(TRACK_TAG)?;
        sink.write_all(&0u32.to_be_bytes())?;
        let track_data_start = sink.stream_position()?;

        debug!(
            "SMF header written, division {}, track data at offset {}",
            division, track_data_start
        );

        Ok(Self {
            sink,
            track_data_start,
            track_end: track_data_start,
        })
    }

    /// Writes one track event: the delta time followed by the message.
    ///
    /// SysEx messages (leading 0xF0 or 0xF7) get their length inserted after
    /// the leading byte, as the file format requires. On error nothing of the
    /// event is kept in the track.
    pub fn write_event(&mut self, delta: u32, message: &[u8]) -> io::Result<()> {
        if message.is_empty() {
            return Ok(());
        }

        match self.write_event_bytes(delta, message) {
            Ok(written) => {
                self.track_end += written as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(seek_err) = self.sink.seek(SeekFrom::Start(self.track_end)) {
                    debug!("Cannot rewind failed event: {}", seek_err);
                }
                Err(e)
            }
        }
    }

    fn write_event_bytes(&mut self, delta: u32, message: &[u8]) -> io::Result<usize> {
        let mut written = write_varlen(&mut self.sink, delta)?;
        match message.split_first() {
            Some((&lead, rest)) if lead == 0xF0 || lead == 0xF7 => {
                self.sink.write_all(&[lead])?;
                written += 1 + write_varlen(&mut self.sink, rest.len() as u32)?;
                self.sink.write_all(rest)?;
                written += rest.len();
            }
            _ => {
                self.sink.write_all(message)?;
                written += message.len();
            }
        }
        Ok(written)
    }

    /// Bytes of complete events in the track so far
    pub fn track_length(&self) -> u64 {
        self.track_end - self.track_data_start
    }

    /// Patches the track length and flushes. Returns the sink and the
    /// track length in bytes.
    pub fn finish(mut self) -> io::Result<(W, u32)> {
        let track_length = u32::try_from(self.track_length()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "track chunk exceeds 4 GiB")
        })?;

        self.sink.seek(SeekFrom::Start(self.track_data_start - 4))?;
        self.sink.write_all(&track_length.to_be_bytes())?;
        self.sink.seek(SeekFrom::Start(self.track_end))?;
        self.sink.flush()?;

        debug!("SMF track closed: {} bytes", track_length);
        Ok((self.sink, track_length))
    }
}
