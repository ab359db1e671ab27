use resona_domain_soundbank::{GeneratorId, GeneratorRegion, TIMECENT_OFF};
use resona_ports::message::ChannelMessage;
use rtrb::Consumer;

pub const CHANNELS: usize = 16;

/// Envelope and level settings a renderer should apply, read from a
/// generator region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceParams {
    pub attack_seconds: f32,
    pub release_seconds: f32,
    pub gain: f32,
    pub tuning_cents: f32,
}

impl VoiceParams {
    pub fn from_region(region: &GeneratorRegion) -> Self {
        let coarse = region.short(GeneratorId::COARSE_TUNE) as f32;
        let fine = region.short(GeneratorId::FINE_TUNE) as f32;
        Self {
            attack_seconds: timecents_to_seconds(region.short(GeneratorId::ATTACK_VOL_ENV)),
            release_seconds: timecents_to_seconds(region.short(GeneratorId::RELEASE_VOL_ENV)),
            gain: attenuation_to_gain(region.short(GeneratorId::INITIAL_ATTENUATION)),
            tuning_cents: coarse * 100.0 + fine,
        }
    }
}

/// A region with a short release so notes do not click off.
pub(crate) fn default_region() -> GeneratorRegion {
    let mut region = GeneratorRegion::new();
    // 1200 * log2(0.2)
    region.set_short(GeneratorId::RELEASE_VOL_ENV, -2786);
    region
}

fn timecents_to_seconds(timecents: i16) -> f32 {
    if timecents <= TIMECENT_OFF {
        return 0.0;
    }
    2.0_f32.powf(timecents as f32 / 1200.0)
}

fn attenuation_to_gain(centibels: i16) -> f32 {
    10.0_f32.powf(-(centibels.max(0) as f32) / 200.0)
}

/// A parsed channel message waiting for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedMessage {
    pub message: ChannelMessage,
    pub timestamp_us: Option<i64>,
}

/// Renderer end of the synthesizer's message queue.
pub struct MessageQueue {
    consumer: Consumer<QueuedMessage>,
}

impl MessageQueue {
    pub(crate) fn new(consumer: Consumer<QueuedMessage>) -> Self {
        Self { consumer }
    }

    pub fn pop(&mut self) -> Option<QueuedMessage> {
        self.consumer.pop().ok()
    }

    /// Everything queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<QueuedMessage> {
        std::iter::from_fn(|| self.pop()).collect()
    }

    pub fn len(&self) -> usize {
        self.consumer.slots()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

/// Key and controller state of one MIDI channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelState {
    /// Bit `n` set while key `n` is held down.
    pub held: u128,
    /// Bit `n` set while key `n` is released but held by the sustain pedal.
    pub sustained: u128,
    pub sustain_down: bool,
    pub program: u8,
    pub pitch_bend: u16,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            held: 0,
            sustained: 0,
            sustain_down: false,
            program: 0,
            pitch_bend: 0x2000,
        }
    }
}

impl ChannelState {
    pub fn sounding_notes(&self) -> u32 {
        (self.held | self.sustained).count_ones()
    }

    fn release(&mut self, note: u8) {
        let bit = 1u128 << note;
        if self.held & bit == 0 {
            return;
        }
        self.held &= !bit;
        if self.sustain_down {
            self.sustained |= bit;
        }
    }
}

/// Channel bookkeeping mirrored from the messages that pass through.
#[derive(Clone, Debug, Default)]
pub(crate) struct Channels {
    channels: [ChannelState; CHANNELS],
}

impl Channels {
    pub(crate) fn get(&self, channel: u8) -> ChannelState {
        self.channels[channel as usize % CHANNELS]
    }

    pub(crate) fn sounding_notes(&self) -> u32 {
        self.channels.iter().map(ChannelState::sounding_notes).sum()
    }

    pub(crate) fn reset(&mut self) {
        self.channels = [ChannelState::default(); CHANNELS];
    }

    pub(crate) fn apply(&mut self, message: &ChannelMessage) {
        match *message {
            ChannelMessage::NoteOn {
                channel,
                note,
                velocity,
            } if velocity > 0 => {
                let state = &mut self.channels[channel as usize];
                state.held |= 1u128 << note;
                state.sustained &= !(1u128 << note);
            }
            ChannelMessage::NoteOn { channel, note, .. }
            | ChannelMessage::NoteOff { channel, note, .. } => {
                self.channels[channel as usize].release(note)
            }
            ChannelMessage::ControlChange {
                channel,
                controller,
                value,
            } => {
                let state = &mut self.channels[channel as usize];
                match controller {
                    64 => {
                        state.sustain_down = value >= 64;
                        if !state.sustain_down {
                            state.sustained = 0;
                        }
                    }
                    120 | 123 => {
                        state.held = 0;
                        state.sustained = 0;
                    }
                    _ => {}
                }
            }
            ChannelMessage::ProgramChange { channel, program } => {
                self.channels[channel as usize].program = program;
            }
            ChannelMessage::PitchBend { channel, value } => {
                self.channels[channel as usize].pitch_bend = value;
            }
            ChannelMessage::PolyPressure { .. } | ChannelMessage::ChannelPressure { .. } => {}
        }
    }
}
