use midly::{Format, Fps, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use resona_ports::midi::{MidiFileFormat, MidiFileReader};
use resona_ports::provider::{ReadError, ReadSeek};
use resona_ports::sequence::{Division, MidiEvent, Sequence, Track};
use std::io::Read;

const TARGET: &str = "resona::file::smf";

fn division(timing: Timing) -> (Division, u16) {
    match timing {
        Timing::Metrical(ticks) => (Division::Ppq, ticks.as_int()),
        Timing::Timecode(fps, ticks_per_frame) => {
            let division = match fps {
                Fps::Fps24 => Division::Smpte24,
                Fps::Fps25 => Division::Smpte25,
                Fps::Fps29 => Division::Smpte30Drop,
                Fps::Fps30 => Division::Smpte30,
            };
            (division, ticks_per_frame as u16)
        }
    }
}

fn file_type(format: Format) -> u16 {
    match format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    }
}

fn channel_bytes(channel: u8, message: &MidiMessage) -> Vec<u8> {
    match *message {
        MidiMessage::NoteOff { key, vel } => vec![0x80 | channel, key.as_int(), vel.as_int()],
        MidiMessage::NoteOn { key, vel } => vec![0x90 | channel, key.as_int(), vel.as_int()],
        MidiMessage::Aftertouch { key, vel } => vec![0xA0 | channel, key.as_int(), vel.as_int()],
        MidiMessage::Controller { controller, value } => {
            vec![0xB0 | channel, controller.as_int(), value.as_int()]
        }
        MidiMessage::ProgramChange { program } => vec![0xC0 | channel, program.as_int()],
        MidiMessage::ChannelAftertouch { vel } => vec![0xD0 | channel, vel.as_int()],
        MidiMessage::PitchBend { bend } => {
            let value = bend.0.as_int();
            vec![0xE0 | channel, (value & 0x7F) as u8, (value >> 7) as u8]
        }
    }
}

fn push_variable_length(out: &mut Vec<u8>, value: usize) {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push(0x80 | (rest & 0x7F) as u8);
        rest >>= 7;
    }
    out.extend(groups.iter().rev());
}

fn meta_bytes(meta: &MetaMessage) -> Option<Vec<u8>> {
    let (kind, data): (u8, Vec<u8>) = match *meta {
        MetaMessage::Text(text) => (0x01, text.to_vec()),
        MetaMessage::Copyright(text) => (0x02, text.to_vec()),
        MetaMessage::TrackName(text) => (0x03, text.to_vec()),
        MetaMessage::InstrumentName(text) => (0x04, text.to_vec()),
        MetaMessage::Lyric(text) => (0x05, text.to_vec()),
        MetaMessage::Marker(text) => (0x06, text.to_vec()),
        MetaMessage::CuePoint(text) => (0x07, text.to_vec()),
        MetaMessage::EndOfTrack => (0x2F, Vec::new()),
        MetaMessage::Tempo(us) => (0x51, us.as_int().to_be_bytes()[1..].to_vec()),
        MetaMessage::TimeSignature(n, d, clocks, notated) => (0x58, vec![n, d, clocks, notated]),
        MetaMessage::KeySignature(sharps, minor) => (0x59, vec![sharps as u8, minor as u8]),
        MetaMessage::SequencerSpecific(data) => (0x7F, data.to_vec()),
        MetaMessage::Unknown(kind, data) => (kind, data.to_vec()),
        _ => return None,
    };
    let mut out = vec![0xFF, kind];
    push_variable_length(&mut out, data.len());
    out.extend_from_slice(&data);
    Some(out)
}

fn event_bytes(kind: &TrackEventKind) -> Option<Vec<u8>> {
    match kind {
        TrackEventKind::Midi { channel, message } => Some(channel_bytes(channel.as_int(), message)),
        TrackEventKind::SysEx(data) => {
            let mut out = vec![0xF0];
            out.extend_from_slice(data);
            Some(out)
        }
        TrackEventKind::Escape(data) => Some(data.to_vec()),
        TrackEventKind::Meta(meta) => meta_bytes(meta),
    }
}

/// Builds a sequence from a parsed file. Event ticks are absolute.
pub fn sequence_from_smf(smf: &Smf) -> Sequence {
    let (division, resolution) = division(smf.header.timing);
    let mut sequence = Sequence::new(division, resolution);
    for track in &smf.tracks {
        let mut tick = 0u64;
        let mut events = Vec::with_capacity(track.len());
        for event in track {
            tick += event.delta.as_int() as u64;
            match event_bytes(&event.kind) {
                Some(message) => events.push(MidiEvent::new(tick, message)),
                None => log::trace!(target: TARGET, "skipping {:?} at tick {}", event.kind, tick),
            }
        }
        sequence.tracks.push(Track { events });
    }
    sequence
}

fn read_smf_bytes(stream: &mut dyn ReadSeek) -> Result<Vec<u8>, ReadError> {
    let mut data = Vec::new();
    stream.read_to_end(&mut data)?;
    Ok(data)
}

fn parse(data: &[u8]) -> Result<Smf<'_>, ReadError> {
    Smf::parse(data).map_err(|e| ReadError::not_recognized(e.to_string()))
}

/// Standard MIDI File reader for types 0, 1 and 2.
#[derive(Debug, Default)]
pub struct StandardMidiFileReader;

impl StandardMidiFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl MidiFileReader for StandardMidiFileReader {
    fn midi_file_format(&self, stream: &mut dyn ReadSeek) -> Result<MidiFileFormat, ReadError> {
        let data = read_smf_bytes(stream)?;
        let smf = parse(&data)?;
        let sequence = sequence_from_smf(&smf);
        Ok(MidiFileFormat {
            file_type: file_type(smf.header.format),
            division: sequence.division,
            resolution: sequence.resolution,
            byte_length: Some(data.len() as u64),
            microsecond_length: Some(sequence.microsecond_length()),
        })
    }

    fn sequence(&self, stream: &mut dyn ReadSeek) -> Result<Sequence, ReadError> {
        let data = read_smf_bytes(stream)?;
        let smf = parse(&data)?;
        let sequence = sequence_from_smf(&smf);
        log::debug!(
            target: TARGET,
            "read {} tracks, {} ticks",
            sequence.tracks.len(),
            sequence.tick_length()
        );
        Ok(sequence)
    }
}
