//! Standard MIDI File output
//!
//! - [`SmfWriter`] streams a Format 0, single track file into any seekable sink
//! - [`write_varlen`] encodes variable-length quantities (delta times, SysEx lengths)

mod varlen;
mod writer;

pub use varlen::{write_varlen, MAX_VARLEN};
pub use writer::{SmfWriter, END_OF_TRACK};
