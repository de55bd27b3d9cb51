use super::InputEvent;
use crate::error::{LogError, Result};
use crossbeam::channel::Sender;
use log::{info, trace};
use midir::{Ignore, MidiInput, MidiInputConnection};

/// Live MIDI input. Received messages go to the channel given on connect
/// until this is closed or dropped.
pub struct MidiInputSource {
    connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiInputSource {
    /// Connects to the first input port whose name contains `device_name`.
    pub fn connect(client_name: &str, device_name: &str, tx: Sender<InputEvent>) -> Result<Self> {
        let mut midi_in =
            MidiInput::new(client_name).map_err(|e| LogError::Device(e.to_string()))?;
        // SysEx, timing and active sensing all belong in the log
        midi_in.ignore(Ignore::None);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| {
                LogError::Device(format!("input device '{}' not found", device_name))
            })?;
        let port_name = midi_in
            .port_name(in_port)
            .map_err(|e| LogError::Device(e.to_string()))?;

        info!("Connecting to MIDI input port: {}", port_name);
        let connection = midi_in
            .connect(
                in_port,
                &format!("{}-input", client_name),
                move |_stamp, message, _| {
                    if tx.send(InputEvent::Bytes(message.to_vec())).is_err() {
                        trace!("Capture loop gone, dropping {} bytes", message.len());
                    }
                },
                (),
            )
            .map_err(|e| LogError::Device(e.to_string()))?;

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn close(self) {
        info!("Disconnecting from MIDI input port: {}", self.port_name);
        self.connection.close();
    }
}

#[cfg_attr(feature = "test-mock", allow(dead_code))]
pub(super) fn port_names(client_name: &str) -> Vec<String> {
    let mut devices = Vec::new();

    if let Ok(midi_in) = MidiInput::new(&format!("{}-list", client_name)) {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                devices.push(name);
            }
        }
    }

    devices
}
