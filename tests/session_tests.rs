use midilogrs::{LogError, LogSession, ManualClock, MIDI_BAUD_RATE};
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::Duration;

const TRACK_DATA_START: usize = 22;
const END_OF_TRACK: [u8; 3] = [0xFF, 0x2F, 0x00];

type MemorySession = LogSession<Cursor<Vec<u8>>, ManualClock>;

fn start() -> (MemorySession, ManualClock) {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = ManualClock::new();
    let session = LogSession::start(Cursor::new(Vec::new()), clock.clone(), MIDI_BAUD_RATE);
    (session, clock)
}

fn finish(session: &mut MemorySession) -> Vec<u8> {
    session
        .close()
        .expect("close should succeed")
        .expect("first close returns the sink")
        .into_inner()
}

fn track(file: &[u8]) -> &[u8] {
    &file[TRACK_DATA_START..]
}

fn stored_track_length(file: &[u8]) -> u32 {
    u32::from_be_bytes([file[18], file[19], file[20], file[21]])
}

#[test]
fn test_header_chunk() {
    let (mut session, _) = start();
    let file = finish(&mut session);

    assert_eq!(&file[0..4], b"MThd");
    assert_eq!(&file[4..8], &6u32.to_be_bytes());
    assert_eq!(&file[8..10], &0u16.to_be_bytes());
    assert_eq!(&file[10..12], &1u16.to_be_bytes());
    assert_eq!(&file[12..14], &15625u16.to_be_bytes());
    assert_eq!(&file[14..18], b"MTrk");
    assert_eq!(track(&file), &[0x00, 0xFF, 0x2F, 0x00]);
}

#[test]
fn test_running_status_is_kept_in_output() {
    let (mut session, _) = start();
    session.on_bytes_received(&[0x90, 0x3C, 0x40, 0x3E, 0x50]);
    let file = finish(&mut session);

    assert_eq!(
        track(&file),
        &[0x00, 0x90, 0x3C, 0x40, 0x00, 0x3E, 0x50, 0x00, 0xFF, 0x2F, 0x00]
    );
}

#[test]
fn test_sysex_length_is_inserted() {
    let (mut session, _) = start();
    session.on_bytes_received(&[0xF0, 0x43, 0x12, 0x00, 0xF7]);
    let file = finish(&mut session);

    assert_eq!(
        track(&file),
        &[0x00, 0xF0, 0x04, 0x43, 0x12, 0x00, 0xF7, 0x00, 0xFF, 0x2F, 0x00]
    );
}

#[test]
fn test_sysex_aborted_by_new_status() {
    let (mut session, _) = start();
    session.on_bytes_received(&[0xF0, 0x43, 0x90, 0x3C, 0x40]);
    let file = finish(&mut session);

    assert_eq!(
        track(&file),
        &[0x00, 0xF0, 0x01, 0x43, 0x00, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00]
    );
}

#[test]
fn test_device_reset_marker() {
    let (mut session, _) = start();
    session.on_byte_received(0xFF);
    let file = finish(&mut session);

    let mut expected = vec![0x00, 0xFF, 0x06, 0x0C];
    expected.extend_from_slice(b"Device Reset");
    expected.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
    assert_eq!(track(&file), expected.as_slice());
}

#[test]
fn test_delta_times_follow_the_clock() {
    let (mut session, clock) = start();
    session.on_bytes_received(&[0x90, 0x3C, 0x40]);
    clock.advance(Duration::from_secs(1));
    session.on_bytes_received(&[0x80, 0x3C, 0x00]);
    clock.advance(Duration::from_millis(500));
    let file = finish(&mut session);

    assert_eq!(
        track(&file),
        &[
            0x00, 0x90, 0x3C, 0x40, // note on at 0
            0x81, 0xF4, 0x12, 0x80, 0x3C, 0x00, // note off 31250 ticks later
            0xFA, 0x09, 0xFF, 0x2F, 0x00, // end of track 15625 ticks later
        ]
    );
}

#[test]
fn test_message_is_stamped_with_its_first_byte() {
    let (mut session, clock) = start();
    let step = Duration::from_millis(10);
    for byte in [0x90, 0x3C, 0x40, 0x3E, 0x50] {
        session.on_byte_received(byte);
        clock.advance(step);
    }
    let file = finish(&mut session);

    // second note starts at 30 ms = 937 ticks; close at 50 ms = 1562 ticks
    assert_eq!(
        track(&file),
        &[0x00, 0x90, 0x3C, 0x40, 0x87, 0x29, 0x3E, 0x50, 0x84, 0x71, 0xFF, 0x2F, 0x00]
    );
}

#[test]
fn test_track_length_matches_written_bytes() {
    let (mut session, clock) = start();
    let input: [&[u8]; 5] = [
        &[0xB0, 0x07, 0x64],
        &[0xC0, 0x05],
        &[0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7],
        &[0xE0, 0x00, 0x40, 0x10, 0x40],
        &[0xF8, 0xFE, 0xFF],
    ];
    for chunk in input {
        session.on_bytes_received(chunk);
        clock.advance(Duration::from_millis(7));
    }
    let file = finish(&mut session);

    assert_eq!(stored_track_length(&file) as usize, file.len() - TRACK_DATA_START);
    assert_eq!(session.stats().track_length, Some(stored_track_length(&file)));
    assert!(file.ends_with(&END_OF_TRACK));
}

#[test]
fn test_close_is_idempotent() {
    let (mut session, _) = start();
    session.on_bytes_received(&[0x90, 0x3C, 0x40]);
    let file = finish(&mut session);
    let stats = session.stats();

    assert!(!session.is_active());
    assert!(session.close().unwrap().is_none());
    session.on_bytes_received(&[0x90, 0x3E, 0x40]);
    assert!(session.close().unwrap().is_none());

    assert_eq!(session.stats(), stats);
    assert_eq!(
        file.windows(END_OF_TRACK.len())
            .filter(|w| *w == END_OF_TRACK)
            .count(),
        1
    );
    assert_eq!(stored_track_length(&file) as usize, file.len() - TRACK_DATA_START);
}

#[test]
fn test_overflowing_sysex_is_committed_at_cap() {
    let (mut session, _) = start();
    session.on_byte_received(0xF0);
    for _ in 0..9000 {
        session.on_byte_received(0x01);
    }
    let file = finish(&mut session);
    let track = track(&file);

    // F0 plus 8191 data bytes fill the 8192 byte buffer
    assert_eq!(&track[..4], &[0x00, 0xF0, 0xBF, 0x7F]);
    assert!(track[4..4 + 8191].iter().all(|&b| b == 0x01));
    assert_eq!(&track[4 + 8191..], &[0x00, 0xFF, 0x2F, 0x00]);
    assert_eq!(session.stats().events_written, 2);
}

#[test]
fn test_close_flushes_partial_message() {
    let (mut session, _) = start();
    session.on_bytes_received(&[0x90, 0x3C]);
    let file = finish(&mut session);

    assert_eq!(track(&file), &[0x00, 0x90, 0x3C, 0x00, 0xFF, 0x2F, 0x00]);
}

#[test]
fn test_unrepresentable_bytes_are_dropped() {
    let (mut session, _) = start();
    session.on_bytes_received(&[0x40, 0x40, 0xF8, 0xF2, 0x01, 0x02, 0xF6, 0xC0, 0x01]);
    let file = finish(&mut session);

    assert_eq!(track(&file), &[0x00, 0xC0, 0x01, 0x00, 0xFF, 0x2F, 0x00]);
    assert_eq!(session.stats().bytes_received, 9);
}

#[test]
fn test_unavailable_sink_ignores_bytes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = Path::new("/nonexistent-midilogrs-dir/capture.mid");
    let mut session = LogSession::create(path, ManualClock::new(), MIDI_BAUD_RATE);

    assert!(!session.is_active());
    assert!(matches!(
        session.unavailable_reason(),
        Some(LogError::SinkUnavailable(_))
    ));

    session.on_bytes_received(&[0x90, 0x3C, 0x40, 0xFF]);
    assert_eq!(session.stats().bytes_received, 0);
    assert!(session.close().unwrap().is_none());
    assert!(!path.exists());
}

/// Sink that refuses to grow past a fixed size
struct ShortSink {
    inner: Cursor<Vec<u8>>,
    limit: u64,
}

impl Write for ShortSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.inner.position() + buf.len() as u64 > self.limit {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ShortSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[test]
fn test_write_errors_are_counted_not_raised() {
    let _ = env_logger::builder().is_test(true).try_init();
    let sink = ShortSink {
        inner: Cursor::new(Vec::new()),
        limit: 25,
    };
    let mut session = LogSession::start(sink, ManualClock::new(), MIDI_BAUD_RATE);
    assert!(session.is_active());

    session.on_bytes_received(&[0x90, 0x3C, 0x40]);
    assert_eq!(session.stats().write_errors, 1);

    let file = session.close().unwrap().unwrap().inner.into_inner();
    let stats = session.stats();
    assert_eq!(stats.write_errors, 2);
    assert_eq!(stats.events_written, 0);
    // neither the note nor the end of track fit; no fragment is counted
    assert_eq!(stored_track_length(&file), 0);
    assert_eq!(stats.track_length, Some(0));
}

fn short_session(limit: u64) -> (LogSession<ShortSink, ManualClock>, ManualClock) {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = ManualClock::new();
    let sink = ShortSink {
        inner: Cursor::new(Vec::new()),
        limit,
    };
    let session = LogSession::start(sink, clock.clone(), MIDI_BAUD_RATE);
    (session, clock)
}

fn sysex_of_ten() -> Vec<u8> {
    let mut sysex = vec![0xF0];
    sysex.extend_from_slice(&[0x01; 10]);
    sysex.push(0xF7);
    sysex
}

#[test]
fn test_failed_sysex_does_not_swallow_end_of_track() {
    let (mut session, _) = short_session(30);
    session.on_bytes_received(&sysex_of_ten());
    assert_eq!(session.stats().write_errors, 1);

    let file = session.close().unwrap().unwrap().inner.into_inner();
    assert_eq!(track(&file), &[0x00, 0xFF, 0x2F, 0x00]);
    assert_eq!(stored_track_length(&file), 4);

    let smf = midly::Smf::parse(&file).expect("output should be a valid MIDI file");
    assert_eq!(smf.tracks[0].len(), 1);
    assert_eq!(
        smf.tracks[0][0].kind,
        midly::TrackEventKind::Meta(midly::MetaMessage::EndOfTrack)
    );
}

#[test]
fn test_next_event_replaces_failed_one_and_keeps_its_gap() {
    let (mut session, clock) = short_session(34);
    clock.advance(Duration::from_millis(10));
    session.on_bytes_received(&sysex_of_ten());
    clock.advance(Duration::from_millis(10));
    session.on_bytes_received(&[0x90, 0x3C, 0x40]);

    let file = session.close().unwrap().unwrap().inner.into_inner();
    let stats = session.stats();
    assert_eq!(stats.write_errors, 1);
    assert_eq!(stats.events_written, 2);

    // the note sits 625 ticks (20 ms) after the start, where the sysex would have been
    assert_eq!(
        track(&file),
        &[0x84, 0x71, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00]
    );
    assert_eq!(stored_track_length(&file), 9);
}

#[test]
fn test_resolution_is_clamped_to_metrical_division() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = LogSession::start(Cursor::new(Vec::new()), ManualClock::new(), 200_000);
    let file = finish(&mut session);

    // bit 15 clear: ticks per quarter note, not SMPTE
    assert_eq!(&file[12..14], &0x7FFFu16.to_be_bytes());
}

#[test]
fn test_output_parses_as_standard_midi_file() {
    use midly::num::{u15, u4, u7};
    use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

    let (mut session, clock) = start();
    session.on_bytes_received(&[0x91, 0x3C, 0x64]);
    clock.advance(Duration::from_millis(250));
    session.on_bytes_received(&[0x81, 0x3C, 0x00]);
    clock.advance(Duration::from_millis(10));
    session.on_bytes_received(&[0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7]);
    session.on_byte_received(0xFF);
    let file = finish(&mut session);

    let smf = Smf::parse(&file).expect("output should be a valid MIDI file");
    assert_eq!(smf.header.format, Format::SingleTrack);
    assert_eq!(smf.header.timing, Timing::Metrical(u15::from(15625)));
    assert_eq!(smf.tracks.len(), 1);

    let events = &smf.tracks[0];
    assert_eq!(events.len(), 5);
    assert_eq!(
        events[0].kind,
        TrackEventKind::Midi {
            channel: u4::from(1),
            message: MidiMessage::NoteOn {
                key: u7::from(0x3C),
                vel: u7::from(0x64),
            },
        }
    );
    assert_eq!(events[1].delta.as_int(), 7812);
    assert_eq!(events[2].delta.as_int(), 313);
    assert_eq!(events[2].kind, TrackEventKind::SysEx(&[0x7E, 0x7F, 0x09, 0x01, 0xF7]));
    assert_eq!(
        events[3].kind,
        TrackEventKind::Meta(MetaMessage::Marker(b"Device Reset"))
    );
    assert_eq!(events[4].kind, TrackEventKind::Meta(MetaMessage::EndOfTrack));
}
