use crate::error::SystemError;
use resona_ports::midi::{MidiFileFormat, MidiFileReader};
use resona_ports::provider::{ReadError, ReadSeek};
use resona_ports::sampled::{AudioFileFormat, AudioFileReader, AudioInputStream};
use resona_ports::sequence::Sequence;
use std::io::SeekFrom;
use std::sync::Arc;

const TARGET: &str = "resona::readers";

/// Offers `stream` to each reader in turn, rewinding it before every
/// attempt. A reader that does not recognize the data passes it on; an
/// I/O failure stops the scan.
fn scan<R, T>(
    readers: &[Arc<R>],
    stream: &mut dyn ReadSeek,
    what: &str,
    reader_name: impl Fn(&R) -> &str,
    read: impl Fn(&R, &mut dyn ReadSeek) -> Result<T, ReadError>,
) -> Result<T, SystemError>
where
    R: ?Sized,
{
    let start = stream.stream_position()?;
    for reader in readers {
        stream.seek(SeekFrom::Start(start))?;
        match read(&**reader, &mut *stream) {
            Ok(value) => return Ok(value),
            Err(ReadError::NotRecognized(reason)) => {
                log::debug!(target: TARGET, "{}: {}", reader_name(&**reader), reason);
            }
            Err(ReadError::Io(err)) => {
                log::warn!(target: TARGET, "{} aborted {what} scan: {err}", reader_name(&**reader));
                return Err(SystemError::Io(err));
            }
        }
    }
    Err(SystemError::UnrecognizedStreamFormat(format!(
        "no {what} reader accepted the stream ({} tried)",
        readers.len()
    )))
}

pub fn audio_file_format(
    readers: &[Arc<dyn AudioFileReader>],
    stream: &mut dyn ReadSeek,
) -> Result<AudioFileFormat, SystemError> {
    scan(readers, stream, "audio file", |r| r.type_name(), |r, s| r.audio_file_format(s))
}

pub fn audio_input_stream(
    readers: &[Arc<dyn AudioFileReader>],
    stream: &mut dyn ReadSeek,
) -> Result<AudioInputStream, SystemError> {
    scan(readers, stream, "audio file", |r| r.type_name(), |r, s| r.audio_input_stream(s))
}

pub fn midi_file_format(
    readers: &[Arc<dyn MidiFileReader>],
    stream: &mut dyn ReadSeek,
) -> Result<MidiFileFormat, SystemError> {
    scan(readers, stream, "midi file", |r| r.type_name(), |r, s| r.midi_file_format(s))
}

pub fn sequence(
    readers: &[Arc<dyn MidiFileReader>],
    stream: &mut dyn ReadSeek,
) -> Result<Sequence, SystemError> {
    scan(readers, stream, "midi file", |r| r.type_name(), |r, s| r.sequence(s))
}
