use crate::cascade;
use crate::error::SystemError;
use crate::preference::Preference;
use resona_ports::midi::{MidiDevice, MidiDeviceProvider, MidiError, Receiver, Transmitter};
use resona_ports::types::{Capabilities, DeviceInfo, DeviceRole};
use std::fmt;
use std::sync::Arc;

/// How strictly a device must match a Receiver or Transmitter request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Plain ports only.
    Strict,
    /// Also a synthesizer's built-in receivers.
    AllowSynthesizer,
}

pub fn is_appropriate(capabilities: &Capabilities, role: DeviceRole, pass: Pass) -> bool {
    match role {
        DeviceRole::Sequencer | DeviceRole::Synthesizer => capabilities.has(role),
        DeviceRole::Receiver | DeviceRole::Transmitter => {
            let kind_ok = capabilities.is_pure_port()
                || (pass == Pass::AllowSynthesizer && capabilities.synthesizer);
            kind_ok && capabilities.has(role)
        }
    }
}

fn passes(role: DeviceRole) -> &'static [Pass] {
    match role {
        DeviceRole::Receiver => &[Pass::Strict, Pass::AllowSynthesizer],
        _ => &[Pass::Strict],
    }
}

/// Picks the default device for `role`, honouring `preference`.
pub fn resolve_device(
    providers: &[Arc<dyn MidiDeviceProvider>],
    preference: &Preference,
    role: DeviceRole,
) -> Result<Arc<dyn MidiDevice>, SystemError> {
    cascade::resolve(providers, preference, passes(role), |pass, device| {
        is_appropriate(&device.capabilities(), role, *pass)
    })
    .inspect(|device| {
        log::debug!(target: "resona::resolver", "default {role}: {}", device.info().name);
    })
    .ok_or_else(|| SystemError::NoMatchingDevice(format!("no {role} available")))
}

pub fn midi_device_infos(providers: &[Arc<dyn MidiDeviceProvider>]) -> Vec<DeviceInfo> {
    cascade::all_infos(providers)
}

pub fn midi_device(
    providers: &[Arc<dyn MidiDeviceProvider>],
    info: &DeviceInfo,
) -> Result<Arc<dyn MidiDevice>, SystemError> {
    cascade::instantiate_any(providers, info)
        .ok_or_else(|| SystemError::NoMatchingDevice(format!("requested device not installed: {info}")))
}

fn acquire_use(device: &Arc<dyn MidiDevice>) -> Result<bool, MidiError> {
    match device.use_count() {
        Some(count) => {
            count.acquire(|| device.open())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn release_use(device: &Arc<dyn MidiDevice>) {
    if let Some(count) = device.use_count() {
        count.release(|| device.close());
    }
}

/// Receiver that remembers the device it came from. For reference-counting
/// devices it holds one use of the device until closed or dropped.
pub struct DeviceReceiver {
    device: Arc<dyn MidiDevice>,
    inner: Option<Box<dyn Receiver>>,
    counted: bool,
}

impl DeviceReceiver {
    pub fn acquire(device: Arc<dyn MidiDevice>) -> Result<Self, MidiError> {
        let counted = acquire_use(&device)?;
        match device.receiver() {
            Ok(inner) => Ok(Self {
                device,
                inner: Some(inner),
                counted,
            }),
            Err(err) => {
                if counted {
                    release_use(&device);
                }
                Err(err)
            }
        }
    }

    pub fn device(&self) -> &Arc<dyn MidiDevice> {
        &self.device
    }

    fn shutdown(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.close();
            if self.counted {
                release_use(&self.device);
            }
        }
    }
}

impl Receiver for DeviceReceiver {
    fn send(&mut self, message: &[u8], timestamp_us: Option<i64>) -> Result<(), MidiError> {
        match self.inner.as_mut() {
            Some(inner) => inner.send(message, timestamp_us),
            None => Err(MidiError::DeviceUnavailable("receiver closed".to_string())),
        }
    }

    fn close(mut self: Box<Self>) {
        self.shutdown();
    }
}

impl Drop for DeviceReceiver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for DeviceReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceReceiver")
            .field("device", &self.device.info().name)
            .field("open", &self.inner.is_some())
            .finish()
    }
}

pub struct DeviceTransmitter {
    device: Arc<dyn MidiDevice>,
    inner: Option<Box<dyn Transmitter>>,
    counted: bool,
}

impl DeviceTransmitter {
    pub fn acquire(device: Arc<dyn MidiDevice>) -> Result<Self, MidiError> {
        let counted = acquire_use(&device)?;
        match device.transmitter() {
            Ok(inner) => Ok(Self {
                device,
                inner: Some(inner),
                counted,
            }),
            Err(err) => {
                if counted {
                    release_use(&device);
                }
                Err(err)
            }
        }
    }

    pub fn device(&self) -> &Arc<dyn MidiDevice> {
        &self.device
    }

    fn shutdown(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.close();
            if self.counted {
                release_use(&self.device);
            }
        }
    }
}

impl Transmitter for DeviceTransmitter {
    fn set_receiver(&mut self, receiver: Option<Box<dyn Receiver>>) {
        if let Some(inner) = self.inner.as_mut() {
            inner.set_receiver(receiver);
        }
    }

    fn has_receiver(&self) -> bool {
        self.inner.as_ref().is_some_and(|inner| inner.has_receiver())
    }

    fn close(mut self: Box<Self>) {
        self.shutdown();
    }
}

impl Drop for DeviceTransmitter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for DeviceTransmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceTransmitter")
            .field("device", &self.device.info().name)
            .field("open", &self.inner.is_some())
            .finish()
    }
}
