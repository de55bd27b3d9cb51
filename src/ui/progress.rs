use crate::session::SessionStats;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn create_capture_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style =
        ProgressStyle::with_template("{prefix:.bold.dim} {spinner} [{elapsed_precise}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_prefix("Recording");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// One-line summary of a session for the spinner
pub fn describe(stats: &SessionStats) -> String {
    let mut msg = format!(
        "{} bytes received, {} events written",
        stats.bytes_received, stats.events_written
    );
    if stats.write_errors > 0 {
        msg.push_str(&format!(", {} write errors", stats.write_errors));
    }
    msg
}
