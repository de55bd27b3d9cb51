use super::ThruPort;
use crate::error::{LogError, Result};
use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection};

/// Live MIDI output that received bytes are passed on to
pub struct MidiThru {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiThru {
    /// Connects to the first output port whose name contains `device_name`.
    pub fn connect(client_name: &str, device_name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(&format!("{}-thru", client_name))
            .map_err(|e| LogError::Device(e.to_string()))?;

        let out_ports = midi_out.ports();
        let port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| {
                LogError::Device(format!("output device '{}' not found", device_name))
            })?;
        let port_name = midi_out
            .port_name(port)
            .map_err(|e| LogError::Device(e.to_string()))?;

        info!("Connecting to MIDI output port: {}", port_name);
        let connection = midi_out
            .connect(port, &format!("{}-thru-conn", client_name))
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
        info!("Disconnecting from MIDI output port: {}", self.port_name);
        self.connection.close();
    }
}

impl ThruPort for MidiThru {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        debug!("Forwarding {} bytes to {}", bytes.len(), self.port_name);
        self.connection
            .send(bytes)
            .map_err(|e| LogError::Device(e.to_string()))
    }
}

#[cfg_attr(feature = "test-mock", allow(dead_code))]
pub(super) fn port_names(client_name: &str) -> Vec<String> {
    let mut devices = Vec::new();

    if let Ok(midi_out) = MidiOutput::new(&format!("{}-list", client_name)) {
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                devices.push(name);
            }
        }
    }

    devices
}
