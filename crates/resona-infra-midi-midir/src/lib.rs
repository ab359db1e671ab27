mod fanout;

use fanout::{Fanout, Slot};
use midir::{Ignore, MidiIO, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use resona_ports::message;
use resona_ports::midi::{
    MidiDevice, MidiDeviceProvider, MidiError, Receiver, Transmitter, UseCount,
};
use resona_ports::provider::ProviderError;
use resona_ports::types::{Capabilities, DeviceInfo, PortLimit};
use std::collections::HashMap;
use std::sync::Arc;

const TARGET: &str = "resona::midir";
const INPUT_DESCRIPTION: &str = "MIDI input port";
const OUTPUT_DESCRIPTION: &str = "MIDI output port";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Direction {
    Input,
    Output,
}

impl Direction {
    fn description(self) -> &'static str {
        match self {
            Direction::Input => INPUT_DESCRIPTION,
            Direction::Output => OUTPUT_DESCRIPTION,
        }
    }

    fn of(info: &DeviceInfo) -> Option<Self> {
        match info.description.as_str() {
            INPUT_DESCRIPTION => Some(Direction::Input),
            OUTPUT_DESCRIPTION => Some(Direction::Output),
            _ => None,
        }
    }
}

fn port_info(name: String, direction: Direction) -> DeviceInfo {
    DeviceInfo::new(name, "midir", direction.description(), env!("CARGO_PKG_VERSION"))
}

fn port_names<T: MidiIO>(io: &T, fallback: &str) -> Vec<String> {
    io.ports()
        .iter()
        .map(|port| io.port_name(port).unwrap_or_else(|_| fallback.to_string()))
        .collect()
}

fn find_port<T: MidiIO>(io: &T, name: &str) -> Option<T::Port> {
    io.ports()
        .into_iter()
        .find(|port| io.port_name(port).is_ok_and(|candidate| candidate == name))
}

/// Hardware MIDI ports. Inputs become transmitters, outputs become
/// receivers; the two sides of one interface share a name and differ in
/// their description.
pub struct MidirProvider {
    client_name: String,
    devices: Mutex<HashMap<(String, Direction), Arc<dyn MidiDevice>>>,
}

impl MidirProvider {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            devices: Mutex::new(HashMap::new()),
        }
    }

    fn create_midi_in(&self) -> Result<MidiInput, MidiError> {
        MidiInput::new(&self.client_name).map_err(|e| MidiError::Backend(e.to_string()))
    }

    fn create_midi_out(&self) -> Result<MidiOutput, MidiError> {
        MidiOutput::new(&self.client_name).map_err(|e| MidiError::Backend(e.to_string()))
    }

    fn list(&self) -> Result<Vec<DeviceInfo>, MidiError> {
        let inputs = port_names(&self.create_midi_in()?, "Unknown Input");
        let outputs = port_names(&self.create_midi_out()?, "Unknown Output");
        Ok(inputs
            .into_iter()
            .map(|name| port_info(name, Direction::Input))
            .chain(outputs.into_iter().map(|name| port_info(name, Direction::Output)))
            .collect())
    }
}

impl Default for MidirProvider {
    fn default() -> Self {
        Self::new("Resona")
    }
}

impl MidiDeviceProvider for MidirProvider {
    fn device_infos(&self) -> Vec<DeviceInfo> {
        match self.list() {
            Ok(infos) => infos,
            Err(err) => {
                log::warn!(target: TARGET, "port enumeration failed: {}", err);
                Vec::new()
            }
        }
    }

    fn device(&self, info: &DeviceInfo) -> Result<Arc<dyn MidiDevice>, ProviderError> {
        let direction = Direction::of(info)
            .ok_or_else(|| ProviderError::UnknownInfo(info.name.clone()))?;

        let key = (info.name.clone(), direction);
        let mut devices = self.devices.lock();
        if let Some(device) = devices.get(&key) {
            return Ok(device.clone());
        }
        let listed = self
            .device_infos()
            .into_iter()
            .any(|candidate| candidate == *info && Direction::of(&candidate) == Some(direction));
        if !listed {
            return Err(ProviderError::UnknownInfo(info.name.clone()));
        }

        let device: Arc<dyn MidiDevice> = match direction {
            Direction::Input => Arc::new(MidirInputDevice::new(info.clone(), self.client_name.clone())),
            Direction::Output => Arc::new(MidirOutputDevice::new(info.clone(), self.client_name.clone())),
        };
        devices.insert(key, device.clone());
        Ok(device)
    }
}

pub struct MidirOutputDevice {
    info: DeviceInfo,
    client_name: String,
    use_count: UseCount,
    connection: Arc<Mutex<Option<MidiOutputConnection>>>,
}

impl MidirOutputDevice {
    fn new(info: DeviceInfo, client_name: String) -> Self {
        Self {
            info,
            client_name,
            use_count: UseCount::new(),
            connection: Arc::new(Mutex::new(None)),
        }
    }
}

impl MidiDevice for MidirOutputDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::port(PortLimit::Unlimited, PortLimit::Limited(0))
    }

    fn open(&self) -> Result<(), MidiError> {
        let mut connection = self.connection.lock();
        if connection.is_some() {
            return Ok(());
        }
        let midi_out =
            MidiOutput::new(&self.client_name).map_err(|e| MidiError::Backend(e.to_string()))?;
        let port = find_port(&midi_out, &self.info.name)
            .ok_or_else(|| MidiError::DeviceNotFound(self.info.name.clone()))?;
        let opened = midi_out
            .connect(&port, "resona-midi-output")
            .map_err(|e| MidiError::DeviceUnavailable(e.to_string()))?;
        *connection = Some(opened);
        log::debug!(target: TARGET, "opened output {}", self.info.name);
        Ok(())
    }

    fn close(&self) {
        if let Some(connection) = self.connection.lock().take() {
            connection.close();
            log::debug!(target: TARGET, "closed output {}", self.info.name);
        }
    }

    fn is_open(&self) -> bool {
        self.connection.lock().is_some()
    }

    fn receiver(&self) -> Result<Box<dyn Receiver>, MidiError> {
        Ok(Box::new(OutputReceiver {
            connection: self.connection.clone(),
        }))
    }

    fn transmitter(&self) -> Result<Box<dyn Transmitter>, MidiError> {
        Err(MidiError::DeviceUnavailable(format!(
            "{} is an output port",
            self.info.name
        )))
    }

    fn use_count(&self) -> Option<&UseCount> {
        Some(&self.use_count)
    }
}

struct OutputReceiver {
    connection: Arc<Mutex<Option<MidiOutputConnection>>>,
}

impl Receiver for OutputReceiver {
    fn send(&mut self, message: &[u8], _timestamp_us: Option<i64>) -> Result<(), MidiError> {
        message::validate(message)?;
        match self.connection.lock().as_mut() {
            Some(connection) => connection
                .send(message)
                .map_err(|e| MidiError::Backend(e.to_string())),
            None => Err(MidiError::DeviceUnavailable("output port is closed".to_string())),
        }
    }

    fn close(self: Box<Self>) {}
}

pub struct MidirInputDevice {
    info: DeviceInfo,
    client_name: String,
    use_count: UseCount,
    fanout: Fanout,
    connection: Mutex<Option<MidiInputConnection<Fanout>>>,
}

impl MidirInputDevice {
    fn new(info: DeviceInfo, client_name: String) -> Self {
        Self {
            info,
            client_name,
            use_count: UseCount::new(),
            fanout: Fanout::default(),
            connection: Mutex::new(None),
        }
    }
}

impl MidiDevice for MidirInputDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::port(PortLimit::Limited(0), PortLimit::Unlimited)
    }

    fn open(&self) -> Result<(), MidiError> {
        let mut connection = self.connection.lock();
        if connection.is_some() {
            return Ok(());
        }
        let mut midi_in =
            MidiInput::new(&self.client_name).map_err(|e| MidiError::Backend(e.to_string()))?;
        midi_in.ignore(Ignore::None);
        let port = find_port(&midi_in, &self.info.name)
            .ok_or_else(|| MidiError::DeviceNotFound(self.info.name.clone()))?;

        let opened = midi_in
            .connect(
                &port,
                "resona-midi-input",
                |stamp_us, message, fanout: &mut Fanout| {
                    fanout.dispatch(message, i64::try_from(stamp_us).ok());
                },
                self.fanout.clone(),
            )
            .map_err(|e| MidiError::DeviceUnavailable(e.to_string()))?;
        *connection = Some(opened);
        log::debug!(target: TARGET, "opened input {}", self.info.name);
        Ok(())
    }

    fn close(&self) {
        if let Some(connection) = self.connection.lock().take() {
            let _ = connection.close();
            log::debug!(target: TARGET, "closed input {}", self.info.name);
        }
    }

    fn is_open(&self) -> bool {
        self.connection.lock().is_some()
    }

    fn receiver(&self) -> Result<Box<dyn Receiver>, MidiError> {
        Err(MidiError::DeviceUnavailable(format!(
            "{} is an input port",
            self.info.name
        )))
    }

    fn transmitter(&self) -> Result<Box<dyn Transmitter>, MidiError> {
        Ok(Box::new(InputTransmitter {
            fanout: self.fanout.clone(),
            slot: self.fanout.add_slot(),
        }))
    }

    fn use_count(&self) -> Option<&UseCount> {
        Some(&self.use_count)
    }
}

struct InputTransmitter {
    fanout: Fanout,
    slot: Slot,
}

impl Transmitter for InputTransmitter {
    fn set_receiver(&mut self, receiver: Option<Box<dyn Receiver>>) {
        if let Some(previous) = std::mem::replace(&mut *self.slot.lock(), receiver) {
            previous.close();
        }
    }

    fn has_receiver(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn close(self: Box<Self>) {
        let receiver = self.slot.lock().take();
        if let Some(receiver) = receiver {
            receiver.close();
        }
    }
}

impl Drop for InputTransmitter {
    fn drop(&mut self) {
        self.fanout.remove_slot(&self.slot);
    }
}
