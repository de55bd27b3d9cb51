use crate::error::Result;
use crate::session::LogSession;
use crate::timebase::{ManualClock, BYTE_TIME};
use log::info;
use std::io::{BufReader, Read, Seek, Write};

/// Feeds every byte of `reader` into `session` as if it arrived over a MIDI
/// cable back to back, one serial frame apart.
///
/// `clock` must be the clock the session was started with. Returns the
/// number of bytes fed.
pub fn replay<R, W>(
    reader: R,
    session: &mut LogSession<W, ManualClock>,
    clock: &ManualClock,
) -> Result<u64>
where
    R: Read,
    W: Write + Seek,
{
    let mut count = 0u64;
    for byte in BufReader::new(reader).bytes() {
        session.on_byte_received(byte?);
        clock.advance(BYTE_TIME);
        count += 1;
    }

    info!("Replayed {} bytes", count);
    Ok(count)
}
