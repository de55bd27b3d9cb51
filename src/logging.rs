use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Directory holding the application log
pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("midilogrs")
        .join("logs"))
}

/// Sends log output at `level` and above to `midilogrs.log` in [`log_dir`].
///
/// Only the first call installs the logger; later calls report whether that
/// succeeded. Returns the path of the log file.
pub fn init_logger(level: LevelFilter) -> Result<PathBuf, Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("midilogrs.log");

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // midir and friends are noisy at debug level
    let config = ConfigBuilder::new()
        .add_filter_allow_str("midilogrs")
        .build();

    INIT.call_once(|| {
        if WriteLogger::init(level, config, log_file).is_ok() {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(log_path)
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}
