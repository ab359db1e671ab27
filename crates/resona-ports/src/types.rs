use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Descriptor a provider hands out for each instance it can produce.
///
/// `vendor` names the backend that owns the instance. Two infos are equal
/// when backend and name agree; `description` and `version` are informative,
/// though a provider may still read `description` to pick between two
/// instances sharing a name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub description: String,
    pub version: String,
}

impl DeviceInfo {
    pub fn new(
        name: impl Into<String>,
        vendor: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vendor: vendor.into(),
            description: description.into(),
            version: version.into(),
        }
    }
}

impl PartialEq for DeviceInfo {
    fn eq(&self, other: &Self) -> bool {
        self.vendor == other.vendor && self.name == other.name
    }
}

impl Eq for DeviceInfo {}

impl Hash for DeviceInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vendor.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// How many receivers or transmitters a device can hand out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortLimit {
    Unlimited,
    Limited(usize),
}

impl PortLimit {
    pub fn is_available(self) -> bool {
        !matches!(self, PortLimit::Limited(0))
    }
}

/// The roles a caller can ask the resolver for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceRole {
    Sequencer,
    Synthesizer,
    Receiver,
    Transmitter,
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceRole::Sequencer => "sequencer",
            DeviceRole::Synthesizer => "synthesizer",
            DeviceRole::Receiver => "receiver",
            DeviceRole::Transmitter => "transmitter",
        };
        f.write_str(name)
    }
}

/// Capability flags of a MIDI device. A synthesizer usually also offers
/// receivers; a plain port is neither sequencer nor synthesizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub sequencer: bool,
    pub synthesizer: bool,
    pub max_receivers: PortLimit,
    pub max_transmitters: PortLimit,
}

impl Capabilities {
    pub fn port(max_receivers: PortLimit, max_transmitters: PortLimit) -> Self {
        Self {
            sequencer: false,
            synthesizer: false,
            max_receivers,
            max_transmitters,
        }
    }

    pub fn synthesizer(max_receivers: PortLimit) -> Self {
        Self {
            sequencer: false,
            synthesizer: true,
            max_receivers,
            max_transmitters: PortLimit::Limited(0),
        }
    }

    pub fn sequencer() -> Self {
        Self {
            sequencer: true,
            synthesizer: false,
            max_receivers: PortLimit::Unlimited,
            max_transmitters: PortLimit::Unlimited,
        }
    }

    /// Neither sequencer nor synthesizer.
    pub fn is_pure_port(&self) -> bool {
        !self.sequencer && !self.synthesizer
    }

    pub fn has(&self, role: DeviceRole) -> bool {
        match role {
            DeviceRole::Sequencer => self.sequencer,
            DeviceRole::Synthesizer => self.synthesizer,
            DeviceRole::Receiver => self.max_receivers.is_available(),
            DeviceRole::Transmitter => self.max_transmitters.is_available(),
        }
    }
}
