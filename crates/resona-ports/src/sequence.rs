use serde::{Deserialize, Serialize};

/// Default tempo when a sequence carries no tempo meta event (120 bpm).
pub const DEFAULT_US_PER_QUARTER: u32 = 500_000;

/// Timing basis of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Division {
    Ppq,
    Smpte24,
    Smpte25,
    Smpte30Drop,
    Smpte30,
}

impl Division {
    pub fn frames_per_second(self) -> Option<f64> {
        match self {
            Division::Ppq => None,
            Division::Smpte24 => Some(24.0),
            Division::Smpte25 => Some(25.0),
            Division::Smpte30Drop => Some(29.97),
            Division::Smpte30 => Some(30.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    pub tick: u64,
    /// Raw message bytes; meta events start with `0xFF`.
    pub message: Vec<u8>,
}

impl MidiEvent {
    pub fn new(tick: u64, message: Vec<u8>) -> Self {
        Self { tick, message }
    }

    /// Tempo in microseconds per quarter note for `FF 51 03 tt tt tt`.
    pub fn tempo_us_per_quarter(&self) -> Option<u32> {
        match self.message.as_slice() {
            [0xFF, 0x51, 0x03, a, b, c] => {
                Some(((*a as u32) << 16) | ((*b as u32) << 8) | *c as u32)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Ordered by tick.
    pub events: Vec<MidiEvent>,
}

impl Track {
    pub fn ticks(&self) -> u64 {
        self.events.last().map(|e| e.tick).unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub division: Division,
    /// Ticks per quarter note (PPQ) or per frame (SMPTE).
    pub resolution: u16,
    pub tracks: Vec<Track>,
}

impl Sequence {
    pub fn new(division: Division, resolution: u16) -> Self {
        Self {
            division,
            resolution,
            tracks: Vec::new(),
        }
    }

    pub fn tick_length(&self) -> u64 {
        self.tracks.iter().map(Track::ticks).max().unwrap_or(0)
    }

    pub fn microsecond_length(&self) -> u64 {
        self.tick_to_microsecond(self.tick_length())
    }

    pub fn tick_to_microsecond(&self, tick: u64) -> u64 {
        if self.resolution == 0 {
            return 0;
        }
        if let Some(fps) = self.division.frames_per_second() {
            let seconds = tick as f64 / (fps * self.resolution as f64);
            return (seconds * 1_000_000.0) as u64;
        }

        let mut tempo_changes: Vec<(u64, u32)> = self
            .tracks
            .iter()
            .flat_map(|track| track.events.iter())
            .filter_map(|event| event.tempo_us_per_quarter().map(|t| (event.tick, t)))
            .collect();
        tempo_changes.sort_by_key(|(at, _)| *at);

        let resolution = self.resolution as u128;
        let mut micros: u128 = 0;
        let mut last_tick = 0u64;
        let mut us_per_quarter = DEFAULT_US_PER_QUARTER as u128;
        for (at, tempo) in tempo_changes {
            if at >= tick {
                break;
            }
            micros += (at - last_tick) as u128 * us_per_quarter / resolution;
            last_tick = at;
            us_per_quarter = tempo as u128;
        }
        micros += (tick - last_tick) as u128 * us_per_quarter / resolution;
        micros as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempo_event(tick: u64, us: u32) -> MidiEvent {
        MidiEvent::new(
            tick,
            vec![0xFF, 0x51, 0x03, (us >> 16) as u8, (us >> 8) as u8, us as u8],
        )
    }

    #[test]
    fn tick_length_is_longest_track() {
        let mut sequence = Sequence::new(Division::Ppq, 480);
        sequence.tracks.push(Track {
            events: vec![MidiEvent::new(0, vec![0x90, 60, 100]), MidiEvent::new(480, vec![0x80, 60, 0])],
        });
        sequence.tracks.push(Track {
            events: vec![MidiEvent::new(1920, vec![0xFF, 0x2F, 0x00])],
        });
        assert_eq!(sequence.tick_length(), 1920);
    }

    #[test]
    fn ppq_length_follows_tempo_changes() {
        let mut sequence = Sequence::new(Division::Ppq, 480);
        sequence.tracks.push(Track {
            events: vec![
                tempo_event(0, 500_000),
                tempo_event(960, 250_000),
                MidiEvent::new(1920, vec![0xFF, 0x2F, 0x00]),
            ],
        });
        // 2 quarters at 0.5s + 2 quarters at 0.25s
        assert_eq!(sequence.microsecond_length(), 1_500_000);
    }

    #[test]
    fn smpte_length_uses_frames() {
        let mut sequence = Sequence::new(Division::Smpte25, 40);
        sequence.tracks.push(Track {
            events: vec![MidiEvent::new(2000, vec![0xFF, 0x2F, 0x00])],
        });
        assert_eq!(sequence.microsecond_length(), 2_000_000);
    }
}
