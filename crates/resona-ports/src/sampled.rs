use crate::provider::{ProviderError, ReadError, ReadSeek};
use crate::types::DeviceInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    PcmSigned,
    PcmUnsigned,
    PcmFloat,
    ULaw,
    ALaw,
    Other(String),
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::PcmSigned => f.write_str("PCM_SIGNED"),
            Encoding::PcmUnsigned => f.write_str("PCM_UNSIGNED"),
            Encoding::PcmFloat => f.write_str("PCM_FLOAT"),
            Encoding::ULaw => f.write_str("ULAW"),
            Encoding::ALaw => f.write_str("ALAW"),
            Encoding::Other(name) => f.write_str(name),
        }
    }
}

/// Arrangement of sample data in a stream or line. `None` fields are
/// unspecified and act as wildcards when matching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub encoding: Encoding,
    pub sample_rate: Option<f32>,
    pub sample_size_bits: Option<u16>,
    pub channels: Option<u16>,
    pub frame_size: Option<u16>,
    pub frame_rate: Option<f32>,
    pub big_endian: bool,
}

impl AudioFormat {
    /// Linear PCM with frame size and frame rate derived from the sample layout.
    pub fn pcm(
        encoding: Encoding,
        sample_rate: f32,
        sample_size_bits: u16,
        channels: u16,
        big_endian: bool,
    ) -> Self {
        Self {
            encoding,
            sample_rate: Some(sample_rate),
            sample_size_bits: Some(sample_size_bits),
            channels: Some(channels),
            frame_size: Some(sample_size_bits.div_ceil(8) * channels),
            frame_rate: Some(sample_rate),
            big_endian,
        }
    }

    pub fn pcm_signed(sample_rate: f32, sample_size_bits: u16, channels: u16, big_endian: bool) -> Self {
        Self::pcm(Encoding::PcmSigned, sample_rate, sample_size_bits, channels, big_endian)
    }

    /// True when every field `format` specifies agrees with this format.
    /// Byte order is ignored for samples of at most 8 bits.
    pub fn matches(&self, format: &AudioFormat) -> bool {
        self.encoding == format.encoding
            && field_matches(self.channels, format.channels)
            && field_matches(self.sample_rate, format.sample_rate)
            && field_matches(self.sample_size_bits, format.sample_size_bits)
            && field_matches(self.frame_size, format.frame_size)
            && field_matches(self.frame_rate, format.frame_rate)
            && (format.sample_size_bits.map_or(true, |bits| bits <= 8)
                || self.big_endian == format.big_endian)
    }

    /// Fills unspecified fields from `concrete`.
    pub fn resolved_against(&self, concrete: &AudioFormat) -> AudioFormat {
        let sample_size_bits = self.sample_size_bits.or(concrete.sample_size_bits);
        let channels = self.channels.or(concrete.channels);
        let frame_size = self.frame_size.or_else(|| match (sample_size_bits, channels) {
            (Some(bits), Some(channels)) => Some(bits.div_ceil(8) * channels),
            _ => concrete.frame_size,
        });
        AudioFormat {
            encoding: self.encoding.clone(),
            sample_rate: self.sample_rate.or(concrete.sample_rate),
            sample_size_bits,
            channels,
            frame_size,
            frame_rate: self.frame_rate.or(concrete.frame_rate),
            big_endian: self.big_endian,
        }
    }
}

fn field_matches<T: PartialEq>(ours: Option<T>, theirs: Option<T>) -> bool {
    match theirs {
        None => true,
        Some(value) => ours == Some(value),
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encoding)?;
        match self.sample_rate {
            Some(rate) => write!(f, " {rate:.1} Hz")?,
            None => write!(f, " unknown sample rate")?,
        }
        match self.sample_size_bits {
            Some(bits) => write!(f, ", {bits} bit")?,
            None => write!(f, ", unknown bits per sample")?,
        }
        match self.channels {
            Some(1) => write!(f, ", mono")?,
            Some(2) => write!(f, ", stereo")?,
            Some(n) => write!(f, ", {n} channels")?,
            None => write!(f, ", unknown number of channels")?,
        }
        if let Some(size) = self.frame_size {
            write!(f, ", {size} bytes/frame")?;
        }
        if self.sample_size_bits.map_or(false, |bits| bits > 8) {
            let order = if self.big_endian { "big-endian" } else { "little-endian" };
            write!(f, ", {order}")?;
        }
        Ok(())
    }
}

/// Byte stream tagged with the format of its contents.
pub struct AudioInputStream {
    format: AudioFormat,
    frame_length: Option<u64>,
    source: Box<dyn Read + Send>,
}

impl AudioInputStream {
    pub fn new(source: impl Read + Send + 'static, format: AudioFormat, frame_length: Option<u64>) -> Self {
        Self {
            format,
            frame_length,
            source: Box::new(source),
        }
    }

    pub fn from_bytes(data: Vec<u8>, format: AudioFormat) -> Self {
        let frame_length = format
            .frame_size
            .filter(|size| *size > 0)
            .map(|size| data.len() as u64 / size as u64);
        Self::new(Cursor::new(data), format, frame_length)
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn frame_length(&self) -> Option<u64> {
        self.frame_length
    }

    pub fn into_inner(self) -> Box<dyn Read + Send> {
        self.source
    }
}

impl Read for AudioInputStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.source.read(buf)
    }
}

impl fmt::Debug for AudioInputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioInputStream")
            .field("format", &self.format)
            .field("frame_length", &self.frame_length)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioFileFormat {
    /// Container name, e.g. "WAVE".
    pub file_type: String,
    pub format: AudioFormat,
    pub frame_length: Option<u64>,
    pub byte_length: Option<u64>,
}

pub trait AudioFileReader: Send + Sync {
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn audio_file_format(&self, stream: &mut dyn ReadSeek) -> Result<AudioFileFormat, ReadError>;
    fn audio_input_stream(&self, stream: &mut dyn ReadSeek) -> Result<AudioInputStream, ReadError>;
}

pub trait FormatConversionProvider: Send + Sync {
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn source_encodings(&self) -> Vec<Encoding>;
    fn target_encodings(&self) -> Vec<Encoding>;
    fn target_encodings_for(&self, source: &AudioFormat) -> Vec<Encoding>;
    fn target_formats(&self, encoding: &Encoding, source: &AudioFormat) -> Vec<AudioFormat>;

    fn is_conversion_supported(&self, target: &AudioFormat, source: &AudioFormat) -> bool {
        self.target_formats(&target.encoding, source)
            .iter()
            .any(|candidate| target.matches(candidate))
    }

    fn convert(
        &self,
        target: &AudioFormat,
        source: AudioInputStream,
    ) -> Result<AudioInputStream, ProviderError>;
}

#[derive(thiserror::Error, Debug)]
pub enum LineError {
    #[error("line unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("line not open")]
    NotOpen,
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    /// Playback: the application writes, the mixer renders.
    SourceData,
    /// Capture: the mixer records, the application reads.
    TargetData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineInfo {
    pub kind: LineKind,
    pub formats: Vec<AudioFormat>,
    pub min_buffer_size: Option<usize>,
    pub max_buffer_size: Option<usize>,
}

impl LineInfo {
    pub fn new(kind: LineKind, formats: Vec<AudioFormat>) -> Self {
        Self {
            kind,
            formats,
            min_buffer_size: None,
            max_buffer_size: None,
        }
    }

    pub fn for_format(kind: LineKind, format: AudioFormat) -> Self {
        Self::new(kind, vec![format])
    }

    pub fn is_format_supported(&self, format: &AudioFormat) -> bool {
        self.formats.iter().any(|supported| format.matches(supported))
    }

    /// True when a line described by `self` can serve `requested`.
    pub fn matches(&self, requested: &LineInfo) -> bool {
        if self.kind != requested.kind {
            return false;
        }
        if let (Some(wanted), Some(max)) = (requested.max_buffer_size, self.max_buffer_size) {
            if wanted > max {
                return false;
            }
        }
        if let (Some(wanted), Some(min)) = (requested.min_buffer_size, self.min_buffer_size) {
            if wanted < min {
                return false;
            }
        }
        requested
            .formats
            .iter()
            .all(|format| self.is_format_supported(format))
    }
}

pub trait Line: Send {
    fn line_info(&self) -> LineInfo;
    fn open(&mut self, format: &AudioFormat) -> Result<(), LineError>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
    fn format(&self) -> Option<&AudioFormat>;
}

pub trait SourceDataLine: Line {
    /// Queues bytes for playback; returns how many were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, LineError>;
    fn drain(&mut self);
}

pub trait TargetDataLine: Line {
    /// Copies captured bytes into `buf`; returns how many were written.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LineError>;
}

pub trait Mixer: Send + Sync {
    fn info(&self) -> &DeviceInfo;
    fn source_line_infos(&self) -> Vec<LineInfo>;
    fn target_line_infos(&self) -> Vec<LineInfo>;

    fn is_line_supported(&self, requested: &LineInfo) -> bool {
        let supported = match requested.kind {
            LineKind::SourceData => self.source_line_infos(),
            LineKind::TargetData => self.target_line_infos(),
        };
        supported.iter().any(|info| info.matches(requested))
    }

    fn source_line(&self, requested: &LineInfo) -> Result<Box<dyn SourceDataLine>, LineError>;
    fn target_line(&self, requested: &LineInfo) -> Result<Box<dyn TargetDataLine>, LineError>;
}

pub trait MixerProvider: Send + Sync {
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn mixer_infos(&self) -> Vec<DeviceInfo>;

    fn is_mixer_supported(&self, info: &DeviceInfo) -> bool {
        self.mixer_infos().iter().any(|candidate| candidate == info)
    }

    /// `None` asks for the provider's own default mixer.
    fn mixer(&self, info: Option<&DeviceInfo>) -> Result<Arc<dyn Mixer>, ProviderError>;
}
