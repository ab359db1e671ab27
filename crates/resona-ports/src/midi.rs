use crate::provider::{ProviderError, ReadError, ReadSeek};
use crate::sequence::{Division, Sequence};
use crate::types::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum MidiError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Consumer of raw MIDI bytes. `timestamp_us` is `None` when the message
/// should be handled immediately.
pub trait Receiver: Send {
    fn send(&mut self, message: &[u8], timestamp_us: Option<i64>) -> Result<(), MidiError>;
    fn close(self: Box<Self>);
}

/// Source of MIDI bytes, forwarding everything to its current receiver.
pub trait Transmitter: Send {
    fn set_receiver(&mut self, receiver: Option<Box<dyn Receiver>>);
    fn has_receiver(&self) -> bool;
    fn close(self: Box<Self>);
}

/// Open count shared by every holder of a reference-counting device.
///
/// The device is opened when the count leaves zero and closed when it
/// returns to zero.
#[derive(Debug, Default)]
pub struct UseCount {
    count: Mutex<usize>,
}

impl UseCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire<F>(&self, open: F) -> Result<usize, MidiError>
    where
        F: FnOnce() -> Result<(), MidiError>,
    {
        let mut count = self.count.lock();
        if *count == 0 {
            open()?;
        }
        *count += 1;
        Ok(*count)
    }

    pub fn release<F>(&self, close: F) -> usize
    where
        F: FnOnce(),
    {
        let mut count = self.count.lock();
        if *count == 0 {
            return 0;
        }
        *count -= 1;
        if *count == 0 {
            close();
        }
        *count
    }

    pub fn get(&self) -> usize {
        *self.count.lock()
    }
}

/// Thread model:
/// - open/close/receiver/transmitter require external synchronisation
/// - `use_count` may be touched from any thread
pub trait MidiDevice: Send + Sync {
    fn info(&self) -> &DeviceInfo;
    fn capabilities(&self) -> Capabilities;

    fn open(&self) -> Result<(), MidiError>;
    fn close(&self);
    fn is_open(&self) -> bool;

    fn receiver(&self) -> Result<Box<dyn Receiver>, MidiError>;
    fn transmitter(&self) -> Result<Box<dyn Transmitter>, MidiError>;

    /// `Some` for devices shared between callers through an open count.
    fn use_count(&self) -> Option<&UseCount> {
        None
    }
}

pub trait MidiDeviceProvider: Send + Sync {
    /// Identity used for deduplication and `Type#Instance` preferences.
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn device_infos(&self) -> Vec<DeviceInfo>;

    fn is_device_supported(&self, info: &DeviceInfo) -> bool {
        self.device_infos().iter().any(|candidate| candidate == info)
    }

    fn device(&self, info: &DeviceInfo) -> Result<Arc<dyn MidiDevice>, ProviderError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MidiFileFormat {
    /// SMF type 0, 1 or 2.
    pub file_type: u16,
    pub division: Division,
    pub resolution: u16,
    pub byte_length: Option<u64>,
    pub microsecond_length: Option<u64>,
}

pub trait MidiFileReader: Send + Sync {
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn midi_file_format(&self, stream: &mut dyn ReadSeek) -> Result<MidiFileFormat, ReadError>;
    fn sequence(&self, stream: &mut dyn ReadSeek) -> Result<Sequence, ReadError>;
}
