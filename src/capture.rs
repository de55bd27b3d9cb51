// capture.rs

use crate::error::Result;
use crate::midi::{InputEvent, ThruPort};
use crate::session::{LogSession, SessionStats};
use crate::timebase::TimeSource;
use crossbeam::channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::io::{self, BufRead, Seek, Write};
use std::thread;

/// Drains received bytes into a logging session. The loop is the only owner
/// of the session, so bytes from any number of sources are written in the
/// order they were queued.
pub struct CaptureLoop<'a, W: Write + Seek, T: TimeSource> {
    session: LogSession<W, T>,
    events: Receiver<InputEvent>,
    thru: Option<&'a mut dyn ThruPort>,
    thru_errors: u64,
}

impl<'a, W: Write + Seek, T: TimeSource> CaptureLoop<'a, W, T> {
    pub fn new(session: LogSession<W, T>, events: Receiver<InputEvent>) -> Self {
        CaptureLoop {
            session,
            events,
            thru: None,
            thru_errors: 0,
        }
    }

    /// Passes every received chunk on to `thru` before it is logged.
    pub fn with_thru(mut self, thru: &'a mut dyn ThruPort) -> Self {
        self.thru = Some(thru);
        self
    }

    fn forward(&mut self, bytes: &[u8]) {
        let Some(thru) = self.thru.as_mut() else {
            return;
        };
        if let Err(e) = thru.send(bytes) {
            self.thru_errors += 1;
            if self.thru_errors == 1 {
                error!("Failed to forward MIDI: {}", e);
            } else {
                debug!("Failed to forward MIDI: {}", e);
            }
        }
    }

    /// Runs until a stop request arrives or every sender is gone, then closes
    /// the session. `progress` sees the statistics after every received chunk.
    pub fn run<F>(mut self, mut progress: F) -> Result<SessionStats>
    where
        F: FnMut(&SessionStats),
    {
        info!("Capture loop started");
        loop {
            match self.events.recv() {
                Ok(InputEvent::Bytes(bytes)) => {
                    self.forward(&bytes);
                    self.session.on_bytes_received(&bytes);
                    progress(&self.session.stats());
                }
                Ok(InputEvent::Stop) => {
                    info!("Stop requested");
                    break;
                }
                Err(_) => {
                    warn!("All MIDI sources disconnected");
                    break;
                }
            }
        }

        if self.thru_errors > 0 {
            warn!("{} chunks could not be forwarded", self.thru_errors);
        }
        self.session.close()?;
        let stats = self.session.stats();
        info!("Capture loop finished: {:?}", stats);
        Ok(stats)
    }
}

/// Sends [`InputEvent::Stop`] once a line (or end of input) is read from stdin.
pub fn stop_on_enter(tx: Sender<InputEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = io::stdin().lock().read_line(&mut line) {
            error!("Failed to read from stdin: {}", e);
        }
        if tx.send(InputEvent::Stop).is_err() {
            warn!("Capture loop already finished");
        }
    })
}
