use midly::num::{u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use pretty_assertions::assert_eq;
use resona_infra_file_midly::StandardMidiFileReader;
use resona_ports::midi::MidiFileReader;
use resona_ports::provider::ReadError;
use resona_ports::sequence::Division;
use std::io::Cursor;

fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

fn note(delta: u32, on: bool) -> TrackEvent<'static> {
    let key = u7::new(64);
    let message = if on {
        MidiMessage::NoteOn { key, vel: u7::new(90) }
    } else {
        MidiMessage::NoteOff { key, vel: u7::new(0) }
    };
    event(
        delta,
        TrackEventKind::Midi {
            channel: u4::new(1),
            message,
        },
    )
}

fn build_midi(format: Format, tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
    let smf = Smf {
        header: Header {
            format,
            timing: Timing::Metrical(480.into()),
        },
        tracks,
    };
    let mut data = Vec::new();
    smf.write(&mut data).expect("midi write should succeed");
    data
}

fn two_track_file() -> Vec<u8> {
    let conductor = vec![
        event(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(250_000)))),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ];
    let melody = vec![
        note(0, true),
        note(960, false),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ];
    build_midi(Format::Parallel, vec![conductor, melody])
}

#[test]
fn sequence_keeps_tracks_and_absolute_ticks() {
    let mut stream = Cursor::new(two_track_file());
    let sequence = StandardMidiFileReader::new().sequence(&mut stream).unwrap();

    assert_eq!(sequence.division, Division::Ppq);
    assert_eq!(sequence.resolution, 480);
    assert_eq!(sequence.tracks.len(), 2);

    let melody = &sequence.tracks[1].events;
    assert_eq!(melody[0].message, vec![0x91, 64, 90]);
    assert_eq!(melody[1].tick, 960);
    assert_eq!(melody[1].message, vec![0x81, 64, 0]);
    assert_eq!(melody[2].message, vec![0xFF, 0x2F, 0x00]);
    assert_eq!(sequence.tick_length(), 960);
}

#[test]
fn file_format_reports_type_and_length() {
    let data = two_track_file();
    let len = data.len() as u64;
    let mut stream = Cursor::new(data);

    let format = StandardMidiFileReader::new().midi_file_format(&mut stream).unwrap();

    assert_eq!(format.file_type, 1);
    assert_eq!(format.division, Division::Ppq);
    assert_eq!(format.resolution, 480);
    assert_eq!(format.byte_length, Some(len));
    // two quarters at 0.25 s
    assert_eq!(format.microsecond_length, Some(500_000));
}

#[test]
fn non_midi_bytes_are_not_recognized() {
    let mut stream = Cursor::new(b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec());
    let result = StandardMidiFileReader::new().sequence(&mut stream);
    assert!(matches!(result, Err(ReadError::NotRecognized(_))));
}
