use crate::smf::MAX_VARLEN;
use log::warn;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// MIDI serial baud rate; one tick per bit time
pub const MIDI_BAUD_RATE: u32 = 31_250;

/// Bits in one serial frame (start bit, 8 data bits, stop bit)
pub const BITS_PER_FRAME: u32 = 10;

/// Time one byte occupies on a MIDI cable
pub const BYTE_TIME: Duration =
    Duration::from_micros(BITS_PER_FRAME as u64 * 1_000_000 / MIDI_BAUD_RATE as u64);

/// Largest metrical division a MIDI file header can hold
pub const MAX_DIVISION: u16 = 0x7FFF;

/// Resolutions whose division (`resolution / 2`) is a valid metrical division
pub const RESOLUTION_RANGE: RangeInclusive<u32> = 2..=(2 * MAX_DIVISION as u32 + 1);

/// Monotonic time, as seen by a logging session
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock time measured with [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.anchor.elapsed()
    }
}

/// Time that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, to: Duration) {
        self.nanos.store(to.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Converts arrival times into ticks at a fixed resolution and tracks the
/// tick of the last written event.
#[derive(Debug)]
pub struct Timebase<T: TimeSource> {
    source: T,
    start: Duration,
    resolution: u32,
    event_tick: u64,
    committed_tick: u64,
}

impl<T: TimeSource> Timebase<T> {
    /// Starts counting from the current time of `source`. A resolution
    /// outside [`RESOLUTION_RANGE`] is clamped into it.
    pub fn new(source: T, resolution: u32) -> Self {
        let (min, max) = (*RESOLUTION_RANGE.start(), *RESOLUTION_RANGE.end());
        let clamped = resolution.clamp(min, max);
        if clamped != resolution {
            warn!(
                "Resolution {} has no metrical division, using {} ticks per second",
                resolution, clamped
            );
        }

        let start = source.now();
        Self {
            source,
            start,
            resolution: clamped,
            event_tick: 0,
            committed_tick: 0,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Ticks per quarter note, assuming the default tempo of 120 BPM
    pub fn division(&self) -> u16 {
        u16::try_from(self.resolution / 2).map_or(MAX_DIVISION, |d| d.min(MAX_DIVISION))
    }

    pub fn committed_tick(&self) -> u64 {
        self.committed_tick
    }

    /// Converts the elapsed time since start into ticks.
    pub fn sample(&mut self) -> u64 {
        let elapsed = self.source.now().saturating_sub(self.start);
        let ticks = (elapsed.as_nanos() * u128::from(self.resolution) / 1_000_000_000) as u64;
        self.event_tick = self.event_tick.max(ticks);
        self.event_tick
    }

    /// Ticks between the last written event and the current one, clamped to
    /// what a delta time can hold.
    pub fn pending_delta(&self) -> u32 {
        let delta = self.event_tick - self.committed_tick;
        u32::try_from(delta).map_or(MAX_VARLEN, |d| d.min(MAX_VARLEN))
    }

    /// Returns [`Timebase::pending_delta`] and marks the current event as
    /// written.
    pub fn take_delta(&mut self) -> u32 {
        let gap = self.event_tick - self.committed_tick;
        let delta = self.pending_delta();
        if u64::from(delta) < gap {
            warn!(
                "Gap of {} ticks does not fit a delta time, clamping to {}",
                gap, MAX_VARLEN
            );
        }
        self.committed_tick = self.event_tick;
        delta
    }
}
