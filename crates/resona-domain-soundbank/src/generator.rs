use serde::{Deserialize, Serialize};
use std::fmt;

/// Timecent value meaning "effectively instantaneous / off" (about 1 ms).
pub const TIMECENT_OFF: i16 = -12_000;

/// Key or velocity range covering 0..=127, stored as `hi << 8 | lo`.
pub const FULL_RANGE: i16 = 0x7F00;

/// "Not set, inherit from elsewhere."
pub const UNSET: i16 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorCategory {
    /// Sample address offsets; always non-negative.
    Offset,
    Modulation,
    Effect,
    Timing,
    Range,
    Sample,
    Tuning,
    Misc,
}

/// Generator identifier. Ids 0..=58 are assigned sparsely; anything else is
/// carried through untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeneratorId(pub u16);

struct GeneratorSpec {
    id: u16,
    name: &'static str,
    category: GeneratorCategory,
    default: i16,
}

const fn spec(id: u16, name: &'static str, category: GeneratorCategory, default: i16) -> GeneratorSpec {
    GeneratorSpec {
        id,
        name,
        category,
        default,
    }
}

use GeneratorCategory::*;

const GENERATORS: &[GeneratorSpec] = &[
    spec(0, "start_addrs_offset", Offset, 0),
    spec(1, "end_addrs_offset", Offset, 0),
    spec(2, "startloop_addrs_offset", Offset, 0),
    spec(3, "endloop_addrs_offset", Offset, 0),
    spec(4, "start_addrs_coarse_offset", Offset, 0),
    spec(5, "mod_lfo_to_pitch", Modulation, 0),
    spec(6, "vib_lfo_to_pitch", Modulation, 0),
    spec(7, "mod_env_to_pitch", Modulation, 0),
    spec(8, "initial_filter_fc", Modulation, 13_500),
    spec(9, "initial_filter_q", Modulation, 0),
    spec(10, "mod_lfo_to_filter_fc", Modulation, 0),
    spec(11, "mod_env_to_filter_fc", Modulation, 0),
    spec(12, "end_addrs_coarse_offset", Offset, 0),
    spec(13, "mod_lfo_to_volume", Modulation, 0),
    spec(15, "chorus_effects_send", Effect, 0),
    spec(16, "reverb_effects_send", Effect, 0),
    spec(17, "pan", Effect, 0),
    spec(21, "delay_mod_lfo", Timing, TIMECENT_OFF),
    spec(22, "freq_mod_lfo", Timing, 0),
    spec(23, "delay_vib_lfo", Timing, TIMECENT_OFF),
    spec(24, "freq_vib_lfo", Timing, 0),
    spec(25, "delay_mod_env", Timing, TIMECENT_OFF),
    spec(26, "attack_mod_env", Timing, TIMECENT_OFF),
    spec(27, "hold_mod_env", Timing, TIMECENT_OFF),
    spec(28, "decay_mod_env", Timing, TIMECENT_OFF),
    spec(29, "sustain_mod_env", Timing, 0),
    spec(30, "release_mod_env", Timing, TIMECENT_OFF),
    spec(31, "keynum_to_mod_env_hold", Timing, 0),
    spec(32, "keynum_to_mod_env_decay", Timing, 0),
    spec(33, "delay_vol_env", Timing, TIMECENT_OFF),
    spec(34, "attack_vol_env", Timing, TIMECENT_OFF),
    spec(35, "hold_vol_env", Timing, TIMECENT_OFF),
    spec(36, "decay_vol_env", Timing, TIMECENT_OFF),
    spec(37, "sustain_vol_env", Timing, 0),
    spec(38, "release_vol_env", Timing, TIMECENT_OFF),
    spec(39, "keynum_to_vol_env_hold", Timing, 0),
    spec(40, "keynum_to_vol_env_decay", Timing, 0),
    spec(41, "instrument", Sample, 0),
    spec(43, "key_range", Range, FULL_RANGE),
    spec(44, "vel_range", Range, FULL_RANGE),
    spec(45, "startloop_addrs_coarse_offset", Offset, 0),
    spec(46, "keynum", Sample, UNSET),
    spec(47, "velocity", Misc, UNSET),
    spec(48, "initial_attenuation", Misc, 0),
    spec(50, "endloop_addrs_coarse_offset", Offset, 0),
    spec(51, "coarse_tune", Tuning, 0),
    spec(52, "fine_tune", Tuning, 0),
    spec(53, "sample_id", Sample, 0),
    spec(54, "sample_modes", Sample, 0),
    spec(56, "scale_tuning", Tuning, 100),
    spec(57, "exclusive_class", Misc, 0),
    spec(58, "overriding_root_key", Misc, UNSET),
];

impl GeneratorId {
    pub const START_ADDRS_OFFSET: GeneratorId = GeneratorId(0);
    pub const END_ADDRS_OFFSET: GeneratorId = GeneratorId(1);
    pub const STARTLOOP_ADDRS_OFFSET: GeneratorId = GeneratorId(2);
    pub const ENDLOOP_ADDRS_OFFSET: GeneratorId = GeneratorId(3);
    pub const START_ADDRS_COARSE_OFFSET: GeneratorId = GeneratorId(4);
    pub const MOD_LFO_TO_PITCH: GeneratorId = GeneratorId(5);
    pub const VIB_LFO_TO_PITCH: GeneratorId = GeneratorId(6);
    pub const MOD_ENV_TO_PITCH: GeneratorId = GeneratorId(7);
    pub const INITIAL_FILTER_FC: GeneratorId = GeneratorId(8);
    pub const INITIAL_FILTER_Q: GeneratorId = GeneratorId(9);
    pub const MOD_LFO_TO_FILTER_FC: GeneratorId = GeneratorId(10);
    pub const MOD_ENV_TO_FILTER_FC: GeneratorId = GeneratorId(11);
    pub const END_ADDRS_COARSE_OFFSET: GeneratorId = GeneratorId(12);
    pub const MOD_LFO_TO_VOLUME: GeneratorId = GeneratorId(13);
    pub const CHORUS_EFFECTS_SEND: GeneratorId = GeneratorId(15);
    pub const REVERB_EFFECTS_SEND: GeneratorId = GeneratorId(16);
    pub const PAN: GeneratorId = GeneratorId(17);
    pub const DELAY_MOD_LFO: GeneratorId = GeneratorId(21);
    pub const FREQ_MOD_LFO: GeneratorId = GeneratorId(22);
    pub const DELAY_VIB_LFO: GeneratorId = GeneratorId(23);
    pub const FREQ_VIB_LFO: GeneratorId = GeneratorId(24);
    pub const DELAY_MOD_ENV: GeneratorId = GeneratorId(25);
    pub const ATTACK_MOD_ENV: GeneratorId = GeneratorId(26);
    pub const HOLD_MOD_ENV: GeneratorId = GeneratorId(27);
    pub const DECAY_MOD_ENV: GeneratorId = GeneratorId(28);
    pub const SUSTAIN_MOD_ENV: GeneratorId = GeneratorId(29);
    pub const RELEASE_MOD_ENV: GeneratorId = GeneratorId(30);
    pub const KEYNUM_TO_MOD_ENV_HOLD: GeneratorId = GeneratorId(31);
    pub const KEYNUM_TO_MOD_ENV_DECAY: GeneratorId = GeneratorId(32);
    pub const DELAY_VOL_ENV: GeneratorId = GeneratorId(33);
    pub const ATTACK_VOL_ENV: GeneratorId = GeneratorId(34);
    pub const HOLD_VOL_ENV: GeneratorId = GeneratorId(35);
    pub const DECAY_VOL_ENV: GeneratorId = GeneratorId(36);
    pub const SUSTAIN_VOL_ENV: GeneratorId = GeneratorId(37);
    pub const RELEASE_VOL_ENV: GeneratorId = GeneratorId(38);
    pub const KEYNUM_TO_VOL_ENV_HOLD: GeneratorId = GeneratorId(39);
    pub const KEYNUM_TO_VOL_ENV_DECAY: GeneratorId = GeneratorId(40);
    pub const INSTRUMENT: GeneratorId = GeneratorId(41);
    pub const KEY_RANGE: GeneratorId = GeneratorId(43);
    pub const VEL_RANGE: GeneratorId = GeneratorId(44);
    pub const STARTLOOP_ADDRS_COARSE_OFFSET: GeneratorId = GeneratorId(45);
    pub const KEYNUM: GeneratorId = GeneratorId(46);
    pub const VELOCITY: GeneratorId = GeneratorId(47);
    pub const INITIAL_ATTENUATION: GeneratorId = GeneratorId(48);
    pub const ENDLOOP_ADDRS_COARSE_OFFSET: GeneratorId = GeneratorId(50);
    pub const COARSE_TUNE: GeneratorId = GeneratorId(51);
    pub const FINE_TUNE: GeneratorId = GeneratorId(52);
    pub const SAMPLE_ID: GeneratorId = GeneratorId(53);
    pub const SAMPLE_MODES: GeneratorId = GeneratorId(54);
    pub const SCALE_TUNING: GeneratorId = GeneratorId(56);
    pub const EXCLUSIVE_CLASS: GeneratorId = GeneratorId(57);
    pub const OVERRIDING_ROOT_KEY: GeneratorId = GeneratorId(58);

    /// Highest assigned id.
    pub const MAX: GeneratorId = GeneratorId(58);

    fn spec(self) -> Option<&'static GeneratorSpec> {
        GENERATORS.iter().find(|spec| spec.id == self.0)
    }

    pub fn name(self) -> Option<&'static str> {
        self.spec().map(|spec| spec.name)
    }

    pub fn category(self) -> Option<GeneratorCategory> {
        self.spec().map(|spec| spec.category)
    }

    pub fn is_known(self) -> bool {
        self.spec().is_some()
    }

    pub fn default_value(self) -> i16 {
        default_value(self)
    }

    /// Every assigned id, ascending.
    pub fn all() -> impl Iterator<Item = GeneratorId> {
        GENERATORS.iter().map(|spec| GeneratorId(spec.id))
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "generator({})", self.0),
        }
    }
}

/// Value a generator takes when a region does not set it. Unlisted and
/// unknown ids default to 0.
pub fn default_value(id: GeneratorId) -> i16 {
    id.spec().map(|spec| spec.default).unwrap_or(0)
}
