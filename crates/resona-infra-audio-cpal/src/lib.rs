mod line;
mod samples;

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{SampleFormat, SupportedStreamConfigRange};
use line::{CpalSourceLine, CpalTargetLine};
use resona_ports::provider::ProviderError;
use resona_ports::sampled::{
    LineError, LineInfo, LineKind, Mixer, MixerProvider, SourceDataLine, TargetDataLine,
};
use resona_ports::types::DeviceInfo;
use std::sync::Arc;

const TARGET: &str = "resona::cpal";

/// One supported stream configuration of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ConfigSpan {
    pub channels: u16,
    pub min_rate: u32,
    pub max_rate: u32,
    pub sample_format: SampleFormat,
}

impl ConfigSpan {
    fn from_range(range: &SupportedStreamConfigRange) -> Self {
        Self {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
            sample_format: range.sample_format(),
        }
    }

    fn score(&self) -> i32 {
        match self.sample_format {
            SampleFormat::F32 => 3,
            SampleFormat::I16 => 2,
            SampleFormat::U16 => 1,
            _ => 0,
        }
    }
}

/// Best span for `channels` at `rate`, preferring float, then i16, then u16.
pub(crate) fn select_span(spans: &[ConfigSpan], channels: u16, rate: u32) -> Option<ConfigSpan> {
    spans
        .iter()
        .filter(|span| span.channels == channels && span.min_rate <= rate && rate <= span.max_rate)
        .filter(|span| span.score() > 0)
        .max_by_key(|span| span.score())
        .copied()
}

fn line_info(kind: LineKind, spans: &[ConfigSpan]) -> Option<LineInfo> {
    let mut channels: Vec<u16> = spans.iter().filter(|s| s.score() > 0).map(|s| s.channels).collect();
    channels.sort_unstable();
    channels.dedup();
    if channels.is_empty() {
        return None;
    }
    let formats = channels.into_iter().flat_map(samples::line_formats).collect();
    Some(LineInfo::new(kind, formats))
}

/// Mixers backed by the devices of a `cpal` host: one mixer per device
/// name, playing through its output side and recording from its input side.
pub struct CpalMixerProvider {
    host: cpal::Host,
}

impl CpalMixerProvider {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    pub fn with_host(host: cpal::Host) -> Self {
        Self { host }
    }

    fn device_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        match self.host.output_devices() {
            Ok(devices) => names.extend(devices.filter_map(|d| d.name().ok())),
            Err(err) => log::warn!(target: TARGET, "output enumeration failed: {}", err),
        }
        match self.host.input_devices() {
            Ok(devices) => {
                for name in devices.filter_map(|d| d.name().ok()) {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
            Err(err) => log::warn!(target: TARGET, "input enumeration failed: {}", err),
        }
        names
    }

    fn default_device_name(&self) -> Option<String> {
        self.host
            .default_output_device()
            .or_else(|| self.host.default_input_device())
            .and_then(|device| device.name().ok())
    }

    fn build_mixer(&self, name: &str) -> Result<CpalMixer, ProviderError> {
        let mut outputs = Vec::new();
        let mut inputs = Vec::new();
        let mut found = false;

        if let Ok(devices) = self.host.output_devices() {
            for device in devices.filter(|d| d.name().is_ok_and(|n| n == name)) {
                found = true;
                if let Ok(ranges) = device.supported_output_configs() {
                    outputs.extend(ranges.map(|r| ConfigSpan::from_range(&r)));
                }
            }
        }
        if let Ok(devices) = self.host.input_devices() {
            for device in devices.filter(|d| d.name().is_ok_and(|n| n == name)) {
                found = true;
                if let Ok(ranges) = device.supported_input_configs() {
                    inputs.extend(ranges.map(|r| ConfigSpan::from_range(&r)));
                }
            }
        }

        if !found {
            return Err(ProviderError::UnknownInfo(name.to_string()));
        }
        Ok(CpalMixer {
            info: mixer_info(name.to_string()),
            host_id: self.host.id(),
            outputs,
            inputs,
        })
    }
}

impl Default for CpalMixerProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn mixer_info(name: String) -> DeviceInfo {
    DeviceInfo::new(name, "cpal", "Audio device mixer", env!("CARGO_PKG_VERSION"))
}

impl MixerProvider for CpalMixerProvider {
    fn mixer_infos(&self) -> Vec<DeviceInfo> {
        self.device_names().into_iter().map(mixer_info).collect()
    }

    fn mixer(&self, info: Option<&DeviceInfo>) -> Result<Arc<dyn Mixer>, ProviderError> {
        let name = match info {
            Some(info) if info.vendor == "cpal" => info.name.clone(),
            Some(info) => return Err(ProviderError::UnknownInfo(info.name.clone())),
            None => self
                .default_device_name()
                .ok_or_else(|| ProviderError::Unsupported("host has no default device".to_string()))?,
        };
        Ok(Arc::new(self.build_mixer(&name)?))
    }
}

pub struct CpalMixer {
    info: DeviceInfo,
    host_id: cpal::HostId,
    outputs: Vec<ConfigSpan>,
    inputs: Vec<ConfigSpan>,
}

impl Mixer for CpalMixer {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn source_line_infos(&self) -> Vec<LineInfo> {
        line_info(LineKind::SourceData, &self.outputs).into_iter().collect()
    }

    fn target_line_infos(&self) -> Vec<LineInfo> {
        line_info(LineKind::TargetData, &self.inputs).into_iter().collect()
    }

    fn source_line(&self, requested: &LineInfo) -> Result<Box<dyn SourceDataLine>, LineError> {
        if !self.is_line_supported(requested) {
            return Err(LineError::Unavailable(format!(
                "{} cannot play {:?}",
                self.info.name, requested.formats
            )));
        }
        Ok(Box::new(CpalSourceLine::new(
            self.host_id,
            self.info.name.clone(),
            self.outputs.clone(),
            requested.clone(),
        )))
    }

    fn target_line(&self, requested: &LineInfo) -> Result<Box<dyn TargetDataLine>, LineError> {
        if !self.is_line_supported(requested) {
            return Err(LineError::Unavailable(format!(
                "{} cannot record {:?}",
                self.info.name, requested.formats
            )));
        }
        Ok(Box::new(CpalTargetLine::new(
            self.host_id,
            self.info.name.clone(),
            self.inputs.clone(),
            requested.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_ports::sampled::AudioFormat;

    fn span(channels: u16, min_rate: u32, max_rate: u32, sample_format: SampleFormat) -> ConfigSpan {
        ConfigSpan {
            channels,
            min_rate,
            max_rate,
            sample_format,
        }
    }

    #[test]
    fn span_selection_prefers_float_within_range() {
        let spans = [
            span(2, 44_100, 48_000, SampleFormat::I16),
            span(2, 8_000, 192_000, SampleFormat::F32),
            span(1, 8_000, 192_000, SampleFormat::F32),
        ];
        assert_eq!(select_span(&spans, 2, 48_000), Some(spans[1]));
        assert_eq!(select_span(&spans, 2, 200_000), None);
        assert_eq!(select_span(&spans, 6, 48_000), None);
    }

    #[test]
    fn mixer_lines_follow_device_sides() {
        let mixer = CpalMixer {
            info: mixer_info("Speakers".to_string()),
            host_id: cpal::default_host().id(),
            outputs: vec![span(2, 8_000, 96_000, SampleFormat::F32)],
            inputs: Vec::new(),
        };

        let play = LineInfo::for_format(LineKind::SourceData, AudioFormat::pcm_signed(48_000.0, 16, 2, false));
        let record = LineInfo::for_format(LineKind::TargetData, AudioFormat::pcm_signed(48_000.0, 16, 2, false));
        assert!(mixer.is_line_supported(&play));
        assert!(!mixer.is_line_supported(&record));
        assert!(mixer.target_line_infos().is_empty());
        assert!(mixer.target_line(&record).is_err());

        let line = mixer.source_line(&play).unwrap();
        assert!(!line.is_open());
    }
}
