use chrono::Local;
use clap::Parser;
use crossbeam::channel::unbounded;
use dialoguer::Select;
use midilogrs::{
    capture::stop_on_enter,
    cli::{handle_device_list, handle_output_device_list, validate_device, Args},
    config::Settings,
    logging,
    midi::{replay, MidiInputSource, MidiThru},
    ui::{create_capture_spinner, describe},
    CaptureLoop, LogSession, ManualClock, MonotonicClock, SessionStats,
};
use std::error::Error;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

fn main() {
    let args = parse_command_line_arguments();
    let settings = load_settings(&args);
    initialize_logging(&settings);

    if args.device_list {
        list_available_devices(
            "Available MIDI input devices:",
            &handle_device_list(&settings.client_name),
        );
        list_available_devices(
            "Available MIDI output devices:",
            &handle_output_device_list(&settings.client_name),
        );
        return;
    }

    let output = output_path(&args, &settings);
    let result = match &args.input {
        Some(input) => run_replay(input, &output, &settings),
        None => run_live_capture(
            args.device.as_deref(),
            args.thru.as_deref(),
            &output,
            &settings,
        ),
    };

    match result {
        Ok(stats) => {
            log::info!("Wrote {}", output.display());
            println!(
                "Wrote {} ({} bytes received, {} events)",
                output.display(),
                stats.bytes_received,
                stats.events_written
            );
        }
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn load_settings(args: &Args) -> Settings {
    match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn initialize_logging(settings: &Settings) {
    let level = settings.level_filter().unwrap_or(log::LevelFilter::Info);
    match logging::init_logger(level) {
        Ok(path) => log::info!("Application starting, logging to {}", path.display()),
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }
}

fn exit_with_error(error_msg: &str) -> ! {
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    std::process::exit(1);
}

fn list_available_devices(heading: &str, devices: &[String]) {
    println!("{}", heading);
    for device in devices {
        println!("  - {}", device);
    }
}

fn output_path(args: &Args, settings: &Settings) -> PathBuf {
    args.output
        .clone()
        .unwrap_or_else(|| settings.output_path(Local::now()))
}

fn open_input(input: &Path) -> io::Result<Box<dyn Read>> {
    if input == Path::new("-") {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(File::open(input)?))
    }
}

fn run_replay(
    input: &Path,
    output: &Path,
    settings: &Settings,
) -> Result<SessionStats, Box<dyn Error>> {
    let reader = open_input(input)?;

    let clock = ManualClock::new();
    let mut session = LogSession::create(output, clock.clone(), settings.resolution);
    if let Some(reason) = session.unavailable_reason() {
        return Err(reason.to_string().into());
    }

    log::info!("Converting {} into {}", input.display(), output.display());
    replay(reader, &mut session, &clock)?;
    session.close()?;
    Ok(session.stats())
}

fn select_device(devices: &[String]) -> Result<String, Box<dyn Error>> {
    if devices.is_empty() {
        return Err("No MIDI input devices available".into());
    }
    let index = Select::new()
        .with_prompt("Select the MIDI input to record")
        .items(devices)
        .default(0)
        .interact()?;
    Ok(devices[index].clone())
}

fn connect_thru(device: &str, settings: &Settings) -> Result<MidiThru, Box<dyn Error>> {
    let devices = handle_output_device_list(&settings.client_name);
    validate_device(device, &devices)?;
    Ok(MidiThru::connect(&settings.client_name, device)?)
}

fn run_live_capture(
    device: Option<&str>,
    thru: Option<&str>,
    output: &Path,
    settings: &Settings,
) -> Result<SessionStats, Box<dyn Error>> {
    let devices = handle_device_list(&settings.client_name);
    let device_name = match device {
        Some(name) => {
            validate_device(name, &devices)?;
            name.to_string()
        }
        None => select_device(&devices)?,
    };

    let mut thru = thru.map(|name| connect_thru(name, settings)).transpose()?;

    let session = LogSession::create(output, MonotonicClock::new(), settings.resolution);
    if let Some(reason) = session.unavailable_reason() {
        return Err(reason.to_string().into());
    }

    let (tx, rx) = unbounded();
    let source = MidiInputSource::connect(&settings.client_name, &device_name, tx.clone())?;
    stop_on_enter(tx);

    println!(
        "Recording {} into {}. Press Enter to stop.",
        source.port_name(),
        output.display()
    );
    if let Some(thru) = &thru {
        println!("Passing MIDI through to {}", thru.port_name());
    }

    let spinner = create_capture_spinner();
    let mut capture = CaptureLoop::new(session, rx);
    if let Some(thru) = thru.as_mut() {
        capture = capture.with_thru(thru);
    }
    let stats = capture.run(|stats| spinner.set_message(describe(stats)))?;
    spinner.finish_and_clear();
    source.close();
    if let Some(thru) = thru {
        thru.close();
    }

    Ok(stats)
}
