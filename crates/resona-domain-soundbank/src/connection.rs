use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit in which a connection's scale is expressed; fixed by the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    None,
    Centibels,
    Cents,
    /// 0.1% steps.
    TenthPercent,
    Timecents,
    Decibels,
}

/// Value range a source delivers before transform and scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// 0..1
    Unipolar,
    /// -1..1
    Bipolar,
}

/// Source or control code of a connection block. Unknown codes are kept as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Source(pub u16);

impl Source {
    pub const NONE: Source = Source(0x000);
    pub const LFO: Source = Source(0x001);
    pub const KEY_ON_VELOCITY: Source = Source(0x002);
    pub const KEY_NUMBER: Source = Source(0x003);
    pub const EG1: Source = Source(0x004);
    pub const EG2: Source = Source(0x005);
    pub const PITCH_WHEEL: Source = Source(0x006);
    pub const POLY_PRESSURE: Source = Source(0x007);
    pub const CHANNEL_PRESSURE: Source = Source(0x008);
    pub const VIBRATO: Source = Source(0x009);
    pub const MONO_PRESSURE: Source = Source(0x00A);
    pub const CC1: Source = Source(0x081);
    pub const CC7: Source = Source(0x087);
    pub const CC10: Source = Source(0x08A);
    pub const CC11: Source = Source(0x08B);
    pub const CC91: Source = Source(0x0DB);
    pub const CC93: Source = Source(0x0DD);
    pub const RPN0: Source = Source(0x100);
    pub const RPN1: Source = Source(0x101);
    pub const RPN2: Source = Source(0x102);

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Source::NONE => "none",
            Source::LFO => "lfo",
            Source::KEY_ON_VELOCITY => "key_on_velocity",
            Source::KEY_NUMBER => "key_number",
            Source::EG1 => "eg1",
            Source::EG2 => "eg2",
            Source::PITCH_WHEEL => "pitch_wheel",
            Source::POLY_PRESSURE => "poly_pressure",
            Source::CHANNEL_PRESSURE => "channel_pressure",
            Source::VIBRATO => "vibrato",
            Source::MONO_PRESSURE => "mono_pressure",
            Source::CC1 => "cc1",
            Source::CC7 => "cc7",
            Source::CC10 => "cc10",
            Source::CC11 => "cc11",
            Source::CC91 => "cc91",
            Source::CC93 => "cc93",
            Source::RPN0 => "rpn0",
            Source::RPN1 => "rpn1",
            Source::RPN2 => "rpn2",
            _ => return None,
        };
        Some(name)
    }

    pub fn is_known(self) -> bool {
        self.name().is_some()
    }

    pub fn polarity(self) -> Polarity {
        match self {
            Source::LFO | Source::PITCH_WHEEL => Polarity::Bipolar,
            _ => Polarity::Unipolar,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "source(0x{:03X})", self.0),
        }
    }
}

/// Synthesis parameter a connection drives. Unknown codes are kept as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Destination(pub u16);

impl Destination {
    pub const NONE: Destination = Destination(0x000);
    pub const GAIN: Destination = Destination(0x001);
    pub const PITCH: Destination = Destination(0x003);
    pub const PAN: Destination = Destination(0x004);
    pub const KEY_NUMBER: Destination = Destination(0x005);
    pub const CHORUS: Destination = Destination(0x080);
    pub const REVERB: Destination = Destination(0x081);
    pub const LFO_FREQUENCY: Destination = Destination(0x104);
    pub const LFO_START_DELAY: Destination = Destination(0x105);
    pub const VIB_FREQUENCY: Destination = Destination(0x114);
    pub const VIB_START_DELAY: Destination = Destination(0x115);
    pub const EG1_ATTACK_TIME: Destination = Destination(0x206);
    pub const EG1_DECAY_TIME: Destination = Destination(0x207);
    pub const EG1_RELEASE_TIME: Destination = Destination(0x209);
    pub const EG1_SUSTAIN_LEVEL: Destination = Destination(0x20A);
    pub const EG1_DELAY_TIME: Destination = Destination(0x20B);
    pub const EG1_HOLD_TIME: Destination = Destination(0x20C);
    pub const EG1_SHUTDOWN_TIME: Destination = Destination(0x20D);
    pub const EG2_ATTACK_TIME: Destination = Destination(0x30A);
    pub const EG2_DECAY_TIME: Destination = Destination(0x30B);
    pub const EG2_RELEASE_TIME: Destination = Destination(0x30D);
    pub const EG2_SUSTAIN_LEVEL: Destination = Destination(0x30E);
    pub const EG2_DELAY_TIME: Destination = Destination(0x30F);
    pub const EG2_HOLD_TIME: Destination = Destination(0x310);
    pub const FILTER_CUTOFF: Destination = Destination(0x500);
    pub const FILTER_Q: Destination = Destination(0x501);

    fn describe(self) -> Option<(&'static str, Unit)> {
        let entry = match self {
            Destination::NONE => ("none", Unit::None),
            Destination::GAIN => ("gain", Unit::Centibels),
            Destination::PITCH => ("pitch", Unit::Cents),
            Destination::PAN => ("pan", Unit::TenthPercent),
            Destination::KEY_NUMBER => ("key_number", Unit::None),
            Destination::CHORUS => ("chorus", Unit::TenthPercent),
            Destination::REVERB => ("reverb", Unit::TenthPercent),
            Destination::LFO_FREQUENCY => ("lfo_frequency", Unit::Cents),
            Destination::LFO_START_DELAY => ("lfo_start_delay", Unit::Timecents),
            Destination::VIB_FREQUENCY => ("vib_frequency", Unit::Cents),
            Destination::VIB_START_DELAY => ("vib_start_delay", Unit::Timecents),
            Destination::EG1_ATTACK_TIME => ("eg1_attack_time", Unit::Timecents),
            Destination::EG1_DECAY_TIME => ("eg1_decay_time", Unit::Timecents),
            Destination::EG1_RELEASE_TIME => ("eg1_release_time", Unit::Timecents),
            Destination::EG1_SUSTAIN_LEVEL => ("eg1_sustain_level", Unit::TenthPercent),
            Destination::EG1_DELAY_TIME => ("eg1_delay_time", Unit::Timecents),
            Destination::EG1_HOLD_TIME => ("eg1_hold_time", Unit::Timecents),
            Destination::EG1_SHUTDOWN_TIME => ("eg1_shutdown_time", Unit::Timecents),
            Destination::EG2_ATTACK_TIME => ("eg2_attack_time", Unit::Timecents),
            Destination::EG2_DECAY_TIME => ("eg2_decay_time", Unit::Timecents),
            Destination::EG2_RELEASE_TIME => ("eg2_release_time", Unit::Timecents),
            Destination::EG2_SUSTAIN_LEVEL => ("eg2_sustain_level", Unit::TenthPercent),
            Destination::EG2_DELAY_TIME => ("eg2_delay_time", Unit::Timecents),
            Destination::EG2_HOLD_TIME => ("eg2_hold_time", Unit::Timecents),
            Destination::FILTER_CUTOFF => ("filter_cutoff", Unit::Cents),
            Destination::FILTER_Q => ("filter_q", Unit::Decibels),
            _ => return None,
        };
        Some(entry)
    }

    pub fn name(self) -> Option<&'static str> {
        self.describe().map(|(name, _)| name)
    }

    pub fn is_known(self) -> bool {
        self.describe().is_some()
    }

    /// Unit of the scale of any block routed here; `Unit::None` for unknown codes.
    pub fn unit(self) -> Unit {
        self.describe().map(|(_, unit)| unit).unwrap_or(Unit::None)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "destination(0x{:03X})", self.0),
        }
    }
}

/// Curve applied to the source before scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transform(pub u16);

impl Transform {
    pub const NONE: Transform = Transform(0x000);
    pub const CONCAVE: Transform = Transform(0x001);
    pub const CONVEX: Transform = Transform(0x002);
    pub const SWITCH: Transform = Transform(0x003);

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Transform::NONE => "none",
            Transform::CONCAVE => "concave",
            Transform::CONVEX => "convex",
            Transform::SWITCH => "switch",
            _ => return None,
        };
        Some(name)
    }

    pub fn is_known(self) -> bool {
        self.name().is_some()
    }
}

/// Articulation chunk revision a block was read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticulationVersion {
    #[default]
    Dls1,
    Dls2,
}

impl ArticulationVersion {
    pub fn number(self) -> u8 {
        match self {
            ArticulationVersion::Dls1 => 1,
            ArticulationVersion::Dls2 => 2,
        }
    }
}

impl TryFrom<u8> for ArticulationVersion {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ArticulationVersion::Dls1),
            2 => Ok(ArticulationVersion::Dls2),
            other => Err(other),
        }
    }
}

/// Routes `source`, modulated by `control`, onto `destination`: the source
/// goes through `transform`, then is multiplied by `scale`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionBlock {
    pub source: Source,
    pub control: Source,
    pub destination: Destination,
    pub transform: Transform,
    /// 16.16 fixed point in the destination's unit.
    pub scale: i32,
    pub version: ArticulationVersion,
}

impl ConnectionBlock {
    /// Size of one block on the wire.
    pub const ENCODED_LEN: usize = 12;

    pub fn new(
        source: Source,
        control: Source,
        destination: Destination,
        transform: Transform,
        scale: i32,
    ) -> Self {
        Self {
            source,
            control,
            destination,
            transform,
            scale,
            version: ArticulationVersion::Dls1,
        }
    }

    pub fn with_version(mut self, version: ArticulationVersion) -> Self {
        self.version = version;
        self
    }

    pub fn unit(&self) -> Unit {
        self.destination.unit()
    }

    pub fn scale_value(&self) -> f64 {
        self.scale as f64 / 65_536.0
    }

    pub fn set_scale_value(&mut self, value: f64) {
        let raw = (value * 65_536.0).round();
        self.scale = raw.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
    }

    /// Little-endian: source, control, destination, transform (u16 each), scale (i32).
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..2].copy_from_slice(&self.source.0.to_le_bytes());
        out[2..4].copy_from_slice(&self.control.0.to_le_bytes());
        out[4..6].copy_from_slice(&self.destination.0.to_le_bytes());
        out[6..8].copy_from_slice(&self.transform.0.to_le_bytes());
        out[8..12].copy_from_slice(&self.scale.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::ENCODED_LEN], version: ArticulationVersion) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        Self {
            source: Source(u16_at(0)),
            control: Source(u16_at(2)),
            destination: Destination(u16_at(4)),
            transform: Transform(u16_at(6)),
            scale: i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            version,
        }
    }
}
