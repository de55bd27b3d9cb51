use clap::Parser;
use std::path::PathBuf;

/// Records incoming MIDI into a Standard MIDI File
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI input devices
    #[arg(long)]
    pub device_list: bool,

    /// Record from the MIDI input whose name contains DEVICE
    #[arg(long, value_name = "DEVICE", conflicts_with = "input")]
    pub device: Option<String>,

    /// Pass received MIDI on to the output whose name contains DEVICE
    #[arg(long, value_name = "DEVICE", conflicts_with = "input")]
    pub thru: Option<String>,

    /// Convert a raw MIDI byte dump instead of recording live ("-" reads stdin)
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file (defaults to a timestamped name in the configured directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn handle_device_list(client_name: &str) -> Vec<String> {
    crate::midi::list_input_devices(client_name)
}

pub fn handle_output_device_list(client_name: &str) -> Vec<String> {
    crate::midi::list_output_devices(client_name)
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
