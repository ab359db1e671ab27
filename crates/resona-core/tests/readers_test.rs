mod common;

use common::system;
use pretty_assertions::assert_eq;
use resona_core::{ProviderSet, SystemError};
use resona_ports::midi::{MidiFileFormat, MidiFileReader};
use resona_ports::provider::{ReadError, ReadSeek};
use resona_ports::sampled::{AudioFileFormat, AudioFileReader, AudioFormat, AudioInputStream};
use resona_ports::sequence::{Division, Sequence};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Accepts streams starting with `magic`; consumes what it inspects.
struct MagicReader {
    name: &'static str,
    magic: &'static [u8],
    attempts: AtomicUsize,
}

impl MagicReader {
    fn new(name: &'static str, magic: &'static [u8]) -> Arc<Self> {
        Arc::new(Self {
            name,
            magic,
            attempts: AtomicUsize::new(0),
        })
    }

    fn check(&self, stream: &mut dyn ReadSeek) -> Result<(), ReadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut head = vec![0u8; self.magic.len()];
        stream.read_exact(&mut head)?;
        if head == self.magic {
            Ok(())
        } else {
            Err(ReadError::not_recognized(format!("{} magic mismatch", self.name)))
        }
    }
}

impl AudioFileReader for MagicReader {
    fn type_name(&self) -> &str {
        self.name
    }

    fn audio_file_format(&self, stream: &mut dyn ReadSeek) -> Result<AudioFileFormat, ReadError> {
        self.check(stream)?;
        Ok(AudioFileFormat {
            file_type: self.name.to_string(),
            format: AudioFormat::pcm_signed(8_000.0, 16, 1, false),
            frame_length: None,
            byte_length: None,
        })
    }

    fn audio_input_stream(&self, stream: &mut dyn ReadSeek) -> Result<AudioInputStream, ReadError> {
        self.check(stream)?;
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest)?;
        Ok(AudioInputStream::from_bytes(rest, AudioFormat::pcm_signed(8_000.0, 16, 1, false)))
    }
}

impl MidiFileReader for MagicReader {
    fn type_name(&self) -> &str {
        self.name
    }

    fn midi_file_format(&self, stream: &mut dyn ReadSeek) -> Result<MidiFileFormat, ReadError> {
        self.check(stream)?;
        Ok(MidiFileFormat {
            file_type: 1,
            division: Division::Ppq,
            resolution: 480,
            byte_length: None,
            microsecond_length: None,
        })
    }

    fn sequence(&self, stream: &mut dyn ReadSeek) -> Result<Sequence, ReadError> {
        self.check(stream)?;
        Ok(Sequence::new(Division::Ppq, 480))
    }
}

struct FailingReader;

impl AudioFileReader for FailingReader {
    fn audio_file_format(&self, _stream: &mut dyn ReadSeek) -> Result<AudioFileFormat, ReadError> {
        Err(ReadError::Io(io::Error::new(io::ErrorKind::Other, "disk on fire")))
    }

    fn audio_input_stream(&self, _stream: &mut dyn ReadSeek) -> Result<AudioInputStream, ReadError> {
        Err(ReadError::Io(io::Error::new(io::ErrorKind::Other, "disk on fire")))
    }
}

#[test]
fn each_reader_sees_the_stream_from_the_start() {
    let aiff = MagicReader::new("AIFF", b"FORM");
    let wave = MagicReader::new("WAVE", b"RIFF");
    let set = ProviderSet::builder()
        .audio_file_reader(aiff.clone())
        .audio_file_reader(wave.clone())
        .build();

    let mut data = Cursor::new(b"RIFF\x01\x02".to_vec());
    let format = system(set, &[]).audio_file_format(&mut data).unwrap();
    assert_eq!(format.file_type, "WAVE");
    assert_eq!(aiff.attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn scan_starts_at_the_current_position() {
    let wave = MagicReader::new("WAVE", b"RIFF");
    let set = ProviderSet::builder()
        .audio_file_reader(MagicReader::new("AIFF", b"FORM"))
        .audio_file_reader(wave)
        .build();

    let mut data = Cursor::new(b"junkRIFF\x01\x02".to_vec());
    data.seek(SeekFrom::Start(4)).unwrap();
    let mut stream = system(set, &[]).audio_input_stream(&mut data).unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, vec![1, 2]);
}

#[test]
fn io_failure_aborts_the_scan() {
    let wave = MagicReader::new("WAVE", b"RIFF");
    let set = ProviderSet::builder()
        .audio_file_reader(Arc::new(FailingReader))
        .audio_file_reader(wave.clone())
        .build();

    let err = system(set, &[])
        .audio_file_format(&mut Cursor::new(b"RIFF".to_vec()))
        .unwrap_err();
    assert!(matches!(err, SystemError::Io(_)));
    assert_eq!(wave.attempts.load(Ordering::SeqCst), 0);
}

#[test]
fn short_streams_are_io_failures() {
    let set = ProviderSet::builder()
        .audio_file_reader(MagicReader::new("WAVE", b"RIFF"))
        .build();

    let err = system(set, &[])
        .audio_file_format(&mut Cursor::new(b"RI".to_vec()))
        .unwrap_err();
    assert!(matches!(err, SystemError::Io(_)));
}

#[test]
fn unknown_data_is_unrecognized() {
    let set = ProviderSet::builder()
        .audio_file_reader(MagicReader::new("AIFF", b"FORM"))
        .audio_file_reader(MagicReader::new("WAVE", b"RIFF"))
        .build();

    let err = system(set, &[])
        .audio_file_format(&mut Cursor::new(b"OggS".to_vec()))
        .unwrap_err();
    assert!(matches!(err, SystemError::UnrecognizedStreamFormat(_)));

    let none = system(ProviderSet::default(), &[]).audio_file_format(&mut Cursor::new(Vec::new()));
    assert!(matches!(none, Err(SystemError::UnrecognizedStreamFormat(_))));
}

#[test]
fn midi_readers_scan_the_same_way() {
    let set = ProviderSet::builder()
        .midi_file_reader(MagicReader::new("RMID", b"RIFF"))
        .midi_file_reader(MagicReader::new("SMF", b"MThd"))
        .build();
    let system = system(set, &[]);

    let format = system
        .midi_file_format(&mut Cursor::new(b"MThd\x00\x00".to_vec()))
        .unwrap();
    assert_eq!(format.resolution, 480);

    let sequence = system.sequence(&mut Cursor::new(b"MThd".to_vec())).unwrap();
    assert_eq!(sequence.tracks.len(), 0);

    assert!(matches!(
        system.sequence(&mut Cursor::new(b"XXXX".to_vec())),
        Err(SystemError::UnrecognizedStreamFormat(_))
    ));
}
