use crate::conversion;
use crate::error::SystemError;
use crate::midi_resolver::{self, DeviceReceiver, DeviceTransmitter};
use crate::mixer_resolver;
use crate::preference::{PreferenceKey, Preferences};
use crate::readers;
use crate::registry::{ProviderRegistry, ProviderSet};
use resona_ports::midi::{MidiDevice, MidiFileFormat};
use resona_ports::provider::ReadSeek;
use resona_ports::sampled::{
    AudioFileFormat, AudioFormat, AudioInputStream, Encoding, LineInfo, Mixer, SourceDataLine,
    TargetDataLine,
};
use resona_ports::sequence::Sequence;
use resona_ports::types::{DeviceInfo, DeviceRole};
use std::sync::Arc;

/// Entry point for resolving devices, lines, converters and file readers
/// against an installed provider set and the configured preferences.
pub struct SoundSystem {
    registry: Arc<ProviderRegistry>,
    preferences: Preferences,
}

impl SoundSystem {
    pub fn new(registry: Arc<ProviderRegistry>, preferences: Preferences) -> Self {
        Self {
            registry,
            preferences,
        }
    }

    pub fn providers(&self) -> &ProviderSet {
        self.registry.providers()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    // MIDI devices

    pub fn midi_device_infos(&self) -> Vec<DeviceInfo> {
        midi_resolver::midi_device_infos(self.providers().midi_device_providers())
    }

    pub fn midi_device(&self, info: &DeviceInfo) -> Result<Arc<dyn MidiDevice>, SystemError> {
        midi_resolver::midi_device(self.providers().midi_device_providers(), info)
    }

    pub fn default_device(&self, role: DeviceRole) -> Result<Arc<dyn MidiDevice>, SystemError> {
        midi_resolver::resolve_device(
            self.providers().midi_device_providers(),
            self.preferences.get(PreferenceKey::for_role(role)),
            role,
        )
    }

    pub fn default_synthesizer(&self) -> Result<Arc<dyn MidiDevice>, SystemError> {
        self.default_device(DeviceRole::Synthesizer)
    }

    pub fn default_sequencer(&self) -> Result<Arc<dyn MidiDevice>, SystemError> {
        self.default_device(DeviceRole::Sequencer)
    }

    pub fn default_receiver(&self) -> Result<DeviceReceiver, SystemError> {
        let device = self.default_device(DeviceRole::Receiver)?;
        Ok(DeviceReceiver::acquire(device)?)
    }

    pub fn default_transmitter(&self) -> Result<DeviceTransmitter, SystemError> {
        let device = self.default_device(DeviceRole::Transmitter)?;
        Ok(DeviceTransmitter::acquire(device)?)
    }

    // Mixers and lines

    pub fn mixer_infos(&self) -> Vec<DeviceInfo> {
        mixer_resolver::mixer_infos(self.providers().mixer_providers())
    }

    pub fn mixer(&self, info: Option<&DeviceInfo>) -> Result<Arc<dyn Mixer>, SystemError> {
        mixer_resolver::mixer(self.providers().mixer_providers(), info)
    }

    pub fn source_data_line(
        &self,
        format: &AudioFormat,
    ) -> Result<Box<dyn SourceDataLine>, SystemError> {
        mixer_resolver::source_data_line(
            self.providers().mixer_providers(),
            self.preferences.get(PreferenceKey::SourceDataLine),
            format,
        )
    }

    pub fn target_data_line(
        &self,
        format: &AudioFormat,
    ) -> Result<Box<dyn TargetDataLine>, SystemError> {
        mixer_resolver::target_data_line(
            self.providers().mixer_providers(),
            self.preferences.get(PreferenceKey::TargetDataLine),
            format,
        )
    }

    pub fn is_line_supported(&self, info: &LineInfo) -> bool {
        mixer_resolver::is_line_supported(self.providers().mixer_providers(), info)
    }

    // Format conversion

    pub fn target_encodings(&self, source: &AudioFormat) -> Vec<Encoding> {
        conversion::target_encodings(self.providers().format_converters(), source)
    }

    pub fn target_formats(&self, encoding: &Encoding, source: &AudioFormat) -> Vec<AudioFormat> {
        conversion::target_formats(self.providers().format_converters(), encoding, source)
    }

    pub fn is_conversion_supported(&self, target: &AudioFormat, source: &AudioFormat) -> bool {
        conversion::is_conversion_supported(self.providers().format_converters(), target, source)
    }

    pub fn convert(
        &self,
        target: &AudioFormat,
        stream: AudioInputStream,
    ) -> Result<AudioInputStream, SystemError> {
        conversion::convert(self.providers().format_converters(), target, stream)
    }

    pub fn convert_chained(
        &self,
        target: &AudioFormat,
        stream: AudioInputStream,
    ) -> Result<AudioInputStream, SystemError> {
        conversion::convert_chained(self.providers().format_converters(), target, stream)
    }

    // File readers

    pub fn audio_file_format(&self, stream: &mut dyn ReadSeek) -> Result<AudioFileFormat, SystemError> {
        readers::audio_file_format(self.providers().audio_file_readers(), stream)
    }

    pub fn audio_input_stream(
        &self,
        stream: &mut dyn ReadSeek,
    ) -> Result<AudioInputStream, SystemError> {
        readers::audio_input_stream(self.providers().audio_file_readers(), stream)
    }

    pub fn midi_file_format(&self, stream: &mut dyn ReadSeek) -> Result<MidiFileFormat, SystemError> {
        readers::midi_file_format(self.providers().midi_file_readers(), stream)
    }

    pub fn sequence(&self, stream: &mut dyn ReadSeek) -> Result<Sequence, SystemError> {
        readers::sequence(self.providers().midi_file_readers(), stream)
    }
}
