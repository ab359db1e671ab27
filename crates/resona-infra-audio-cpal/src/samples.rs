use resona_ports::sampled::{AudioFormat, Encoding};

/// Sample layouts a line accepts: interleaved little-endian 16-bit signed
/// or 32-bit float, at any rate the device allows.
pub(crate) fn line_formats(channels: u16) -> Vec<AudioFormat> {
    [(Encoding::PcmSigned, 16), (Encoding::PcmFloat, 32)]
        .into_iter()
        .map(|(encoding, bits)| {
            let mut format = AudioFormat::pcm(encoding, 0.0, bits, channels, false);
            format.sample_rate = None;
            format.frame_rate = None;
            format
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Layout {
    I16,
    F32,
}

impl Layout {
    pub(crate) fn of(format: &AudioFormat) -> Option<Self> {
        if format.big_endian {
            return None;
        }
        match (&format.encoding, format.sample_size_bits) {
            (Encoding::PcmSigned, Some(16)) => Some(Layout::I16),
            (Encoding::PcmFloat, Some(32)) => Some(Layout::F32),
            _ => None,
        }
    }

    pub(crate) fn bytes_per_sample(self) -> usize {
        match self {
            Layout::I16 => 2,
            Layout::F32 => 4,
        }
    }

    /// Decodes whole samples from `data`; a trailing partial sample is ignored.
    pub(crate) fn decode(self, data: &[u8]) -> impl Iterator<Item = f32> + '_ {
        data.chunks_exact(self.bytes_per_sample())
            .map(move |chunk| match self {
                Layout::I16 => i16_to_f32(i16::from_le_bytes([chunk[0], chunk[1]])),
                Layout::F32 => f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            })
    }

    pub(crate) fn encode(self, sample: f32, out: &mut [u8]) {
        match self {
            Layout::I16 => out[..2].copy_from_slice(&f32_to_i16(sample).to_le_bytes()),
            Layout::F32 => out[..4].copy_from_slice(&sample.to_le_bytes()),
        }
    }
}

pub(crate) fn f32_to_i16(value: f32) -> i16 {
    let v = value.clamp(-1.0, 1.0);
    (v * i16::MAX as f32) as i16
}

pub(crate) fn f32_to_u16(value: f32) -> u16 {
    let v = value.clamp(-1.0, 1.0);
    let scaled = (v * 0.5 + 0.5) * u16::MAX as f32;
    scaled.round().clamp(0.0, u16::MAX as f32) as u16
}

pub(crate) fn i16_to_f32(value: i16) -> f32 {
    value as f32 / 32_768.0
}

pub(crate) fn u16_to_f32(value: u16) -> f32 {
    (value as f32 / u16::MAX as f32) * 2.0 - 1.0
}
