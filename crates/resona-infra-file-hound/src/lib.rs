use resona_ports::provider::{ReadError, ReadSeek};
use resona_ports::sampled::{AudioFileFormat, AudioFileReader, AudioFormat, AudioInputStream, Encoding};
use std::io::{ErrorKind, SeekFrom};

const TARGET: &str = "resona::file::wave";

pub const FILE_TYPE: &str = "WAVE";

/// A short or truncated stream is just not a WAVE file; any other I/O
/// failure is reported as such.
fn map_error(err: hound::Error) -> ReadError {
    match err {
        hound::Error::IoError(io) if io.kind() == ErrorKind::UnexpectedEof => {
            ReadError::not_recognized(io.to_string())
        }
        hound::Error::IoError(io) => ReadError::Io(io),
        other => ReadError::not_recognized(other.to_string()),
    }
}

/// Stream format for decoded samples. 8-bit data stays unsigned as stored;
/// wider integers are signed little-endian.
fn audio_format(spec: &hound::WavSpec) -> Result<AudioFormat, ReadError> {
    let encoding = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => Encoding::PcmFloat,
        (hound::SampleFormat::Int, 8) => Encoding::PcmUnsigned,
        (hound::SampleFormat::Int, 16 | 24 | 32) => Encoding::PcmSigned,
        (format, bits) => {
            return Err(ReadError::not_recognized(format!("{format:?} samples of {bits} bits")))
        }
    };
    Ok(AudioFormat::pcm(
        encoding,
        spec.sample_rate as f32,
        spec.bits_per_sample,
        spec.channels,
        false,
    ))
}

fn decode<R: std::io::Read>(reader: hound::WavReader<R>) -> Result<Vec<u8>, ReadError> {
    let spec = reader.spec();
    let bytes_per_sample = spec.bits_per_sample.div_ceil(8) as usize;
    let mut out = Vec::with_capacity(reader.len() as usize * bytes_per_sample);

    match spec.sample_format {
        hound::SampleFormat::Float => {
            for sample in reader.into_samples::<f32>() {
                out.extend_from_slice(&sample.map_err(map_error)?.to_le_bytes());
            }
        }
        hound::SampleFormat::Int => {
            for sample in reader.into_samples::<i32>() {
                let sample = sample.map_err(map_error)?;
                if bytes_per_sample == 1 {
                    out.push((sample + 128) as u8);
                } else {
                    out.extend_from_slice(&sample.to_le_bytes()[..bytes_per_sample]);
                }
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Default)]
pub struct WaveFileReader;

impl WaveFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl AudioFileReader for WaveFileReader {
    fn audio_file_format(&self, stream: &mut dyn ReadSeek) -> Result<AudioFileFormat, ReadError> {
        let start = stream.stream_position()?;
        let (spec, frames) = {
            let reader = hound::WavReader::new(&mut *stream).map_err(map_error)?;
            (reader.spec(), reader.duration())
        };
        let format = audio_format(&spec)?;
        let end = stream.seek(SeekFrom::End(0))?;

        Ok(AudioFileFormat {
            file_type: FILE_TYPE.to_string(),
            format,
            frame_length: Some(frames as u64),
            byte_length: Some(end - start),
        })
    }

    fn audio_input_stream(&self, stream: &mut dyn ReadSeek) -> Result<AudioInputStream, ReadError> {
        let reader = hound::WavReader::new(&mut *stream).map_err(map_error)?;
        let format = audio_format(&reader.spec())?;
        let frames = reader.duration() as u64;
        let data = decode(reader)?;
        log::debug!(target: TARGET, "decoded {} frames as {}", frames, format);
        Ok(AudioInputStream::new(std::io::Cursor::new(data), format, Some(frames)))
    }
}
