//! Linear PCM re-encoding: signed and unsigned samples at 8 or 16 bits, and
//! byte-order swaps at 16 bits. Rates and channel counts pass through.

use resona_ports::provider::ProviderError;
use resona_ports::sampled::{AudioFormat, AudioInputStream, Encoding, FormatConversionProvider};
use std::io::Read;

const TARGET: &str = "resona::codec::pcm";

/// Upper bound on the bytes converted per source read.
const CHUNK_BYTES: usize = 4096;

fn is_linear_integer(encoding: &Encoding) -> bool {
    matches!(encoding, Encoding::PcmSigned | Encoding::PcmUnsigned)
}

fn handles(format: &AudioFormat) -> bool {
    is_linear_integer(&format.encoding) && matches!(format.sample_size_bits, Some(8) | Some(16))
}

#[derive(Debug, Default)]
pub struct PcmConverter;

impl PcmConverter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatConversionProvider for PcmConverter {
    fn source_encodings(&self) -> Vec<Encoding> {
        vec![Encoding::PcmSigned, Encoding::PcmUnsigned]
    }

    fn target_encodings(&self) -> Vec<Encoding> {
        vec![Encoding::PcmSigned, Encoding::PcmUnsigned]
    }

    fn target_encodings_for(&self, source: &AudioFormat) -> Vec<Encoding> {
        if handles(source) {
            self.target_encodings()
        } else {
            Vec::new()
        }
    }

    fn target_formats(&self, encoding: &Encoding, source: &AudioFormat) -> Vec<AudioFormat> {
        if !handles(source) || !is_linear_integer(encoding) {
            return Vec::new();
        }
        let retag = |big_endian: bool| AudioFormat {
            encoding: encoding.clone(),
            big_endian,
            ..source.clone()
        };
        match source.sample_size_bits {
            Some(16) => vec![retag(false), retag(true)],
            _ => vec![retag(source.big_endian)],
        }
    }

    fn convert(
        &self,
        target: &AudioFormat,
        source: AudioInputStream,
    ) -> Result<AudioInputStream, ProviderError> {
        let from = source.format().clone();
        if !self.is_conversion_supported(target, &from) {
            return Err(ProviderError::Unsupported(format!("{from} to {target}")));
        }
        let to = target.resolved_against(&from);
        let frame_length = source.frame_length();

        log::debug!(target: TARGET, "re-encoding stream from {} to {}", from, to);
        let transcoder = Transcoder::new(source, from, to.clone());
        Ok(AudioInputStream::new(transcoder, to, frame_length))
    }
}

/// Re-encodes the wrapped stream one frame-aligned chunk at a time.
struct Transcoder {
    source: AudioInputStream,
    from: AudioFormat,
    to: AudioFormat,
    chunk: Box<[u8]>,
    sample_bytes: usize,
    /// Converted bytes not yet handed out live in `pos..ready`.
    pos: usize,
    ready: usize,
    /// Bytes read from the source, including a trailing partial sample.
    filled: usize,
    eof: bool,
}

impl Transcoder {
    fn new(source: AudioInputStream, from: AudioFormat, to: AudioFormat) -> Self {
        let sample_bytes = usize::from(from.sample_size_bits.unwrap_or(8) / 8).max(1);
        let frame_bytes = from
            .frame_size
            .map(usize::from)
            .filter(|size| *size >= sample_bytes)
            .unwrap_or(sample_bytes);
        let frames = (CHUNK_BYTES / frame_bytes).max(1);
        Self {
            source,
            from,
            to,
            chunk: vec![0; frames * frame_bytes].into_boxed_slice(),
            sample_bytes,
            pos: 0,
            ready: 0,
            filled: 0,
            eof: false,
        }
    }

    /// Pulls source bytes until at least one whole sample is converted or the
    /// source runs dry. A partial sample is carried over to the next chunk.
    fn refill(&mut self) -> std::io::Result<()> {
        self.chunk.copy_within(self.ready..self.filled, 0);
        self.filled -= self.ready;
        self.pos = 0;
        self.ready = 0;

        while self.ready == 0 && !self.eof {
            let n = self.source.read(&mut self.chunk[self.filled..])?;
            if n == 0 {
                self.eof = true;
            }
            self.filled += n;
            self.ready = if self.eof {
                self.filled
            } else {
                self.filled - self.filled % self.sample_bytes
            };
        }
        transcode(&mut self.chunk[..self.ready], &self.from, &self.to);
        Ok(())
    }
}

impl Read for Transcoder {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos == self.ready {
            self.refill()?;
        }
        let n = buf.len().min(self.ready - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Rewrites samples in place. Both formats must share their sample size; a
/// trailing partial sample is left untouched.
pub fn transcode(data: &mut [u8], from: &AudioFormat, to: &AudioFormat) {
    let flip_sign = from.encoding != to.encoding;
    match from.sample_size_bits {
        Some(8) => {
            if flip_sign {
                for byte in data.iter_mut() {
                    *byte ^= 0x80;
                }
            }
        }
        Some(16) => {
            for chunk in data.chunks_exact_mut(2) {
                let pair = [chunk[0], chunk[1]];
                let mut value = if from.big_endian {
                    u16::from_be_bytes(pair)
                } else {
                    u16::from_le_bytes(pair)
                };
                if flip_sign {
                    value ^= 0x8000;
                }
                let out = if to.big_endian {
                    value.to_be_bytes()
                } else {
                    value.to_le_bytes()
                };
                chunk.copy_from_slice(&out);
            }
        }
        _ => {}
    }
}
