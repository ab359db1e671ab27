#![allow(dead_code)]

use parking_lot::Mutex;
use resona_core::{Preferences, ProviderRegistry, ProviderSet, SoundSystem};
use resona_ports::midi::{
    MidiDevice, MidiDeviceProvider, MidiError, Receiver, Transmitter, UseCount,
};
use resona_ports::provider::ProviderError;
use resona_ports::sampled::{
    AudioFormat, AudioInputStream, Encoding, FormatConversionProvider, Line, LineError, LineInfo,
    LineKind, Mixer, MixerProvider, SourceDataLine, TargetDataLine,
};
use resona_ports::types::{Capabilities, DeviceInfo, PortLimit};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub fn info(name: &str) -> DeviceInfo {
    DeviceInfo::new(name, "Test", format!("{name} device"), "1.0")
}

pub fn system(providers: ProviderSet, prefs: &[(&str, &str)]) -> SoundSystem {
    let map: BTreeMap<String, String> = prefs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    SoundSystem::new(
        Arc::new(ProviderRegistry::with_providers(providers)),
        Preferences::new(map),
    )
}

// MIDI

pub struct MockDevice {
    info: DeviceInfo,
    capabilities: Capabilities,
    counted: Option<UseCount>,
    open: AtomicBool,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockDevice {
    pub fn new(name: &str, capabilities: Capabilities) -> Arc<Self> {
        Arc::new(Self::build(name, capabilities, None))
    }

    pub fn counted(name: &str, capabilities: Capabilities) -> Arc<Self> {
        Arc::new(Self::build(name, capabilities, Some(UseCount::new())))
    }

    fn build(name: &str, capabilities: Capabilities, counted: Option<UseCount>) -> Self {
        Self {
            info: info(name),
            capabilities,
            counted,
            open: AtomicBool::new(false),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn output_port(name: &str) -> Arc<Self> {
        Self::new(name, Capabilities::port(PortLimit::Unlimited, PortLimit::Limited(0)))
    }

    pub fn input_port(name: &str) -> Arc<Self> {
        Self::new(name, Capabilities::port(PortLimit::Limited(0), PortLimit::Unlimited))
    }

    pub fn synthesizer(name: &str) -> Arc<Self> {
        Self::counted(name, Capabilities::synthesizer(PortLimit::Unlimited))
    }
}

impl MidiDevice for MockDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn open(&self) -> Result<(), MidiError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> Result<Box<dyn Receiver>, MidiError> {
        if !self.capabilities.max_receivers.is_available() {
            return Err(MidiError::DeviceUnavailable("no receivers".to_string()));
        }
        Ok(Box::new(MockReceiver {
            received: self.received.clone(),
        }))
    }

    fn transmitter(&self) -> Result<Box<dyn Transmitter>, MidiError> {
        if !self.capabilities.max_transmitters.is_available() {
            return Err(MidiError::DeviceUnavailable("no transmitters".to_string()));
        }
        Ok(Box::new(MockTransmitter { receiver: None }))
    }

    fn use_count(&self) -> Option<&UseCount> {
        self.counted.as_ref()
    }
}

struct MockReceiver {
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Receiver for MockReceiver {
    fn send(&mut self, message: &[u8], _timestamp_us: Option<i64>) -> Result<(), MidiError> {
        self.received.lock().push(message.to_vec());
        Ok(())
    }

    fn close(self: Box<Self>) {}
}

struct MockTransmitter {
    receiver: Option<Box<dyn Receiver>>,
}

impl Transmitter for MockTransmitter {
    fn set_receiver(&mut self, receiver: Option<Box<dyn Receiver>>) {
        self.receiver = receiver;
    }

    fn has_receiver(&self) -> bool {
        self.receiver.is_some()
    }

    fn close(self: Box<Self>) {}
}

pub struct MockMidiProvider {
    name: String,
    devices: Vec<Arc<MockDevice>>,
    broken: Vec<String>,
}

impl MockMidiProvider {
    pub fn new(name: &str, devices: Vec<Arc<MockDevice>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            devices,
            broken: Vec::new(),
        })
    }

    /// Lists `broken` devices but fails to instantiate them.
    pub fn with_broken(name: &str, devices: Vec<Arc<MockDevice>>, broken: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            devices,
            broken: broken.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl MidiDeviceProvider for MockMidiProvider {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn device_infos(&self) -> Vec<DeviceInfo> {
        self.devices.iter().map(|d| d.info.clone()).collect()
    }

    fn device(&self, info: &DeviceInfo) -> Result<Arc<dyn MidiDevice>, ProviderError> {
        if self.broken.contains(&info.name) {
            return Err(ProviderError::Backend(format!("{} is broken", info.name)));
        }
        self.devices
            .iter()
            .find(|d| &d.info == info)
            .map(|d| d.clone() as Arc<dyn MidiDevice>)
            .ok_or_else(|| ProviderError::UnknownInfo(info.name.clone()))
    }
}

// Sampled

pub struct MockMixer {
    info: DeviceInfo,
    source: Vec<AudioFormat>,
    target: Vec<AudioFormat>,
}

impl MockMixer {
    pub fn new(name: &str, source: Vec<AudioFormat>, target: Vec<AudioFormat>) -> Arc<Self> {
        Arc::new(Self {
            info: info(name),
            source,
            target,
        })
    }
}

impl Mixer for MockMixer {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn source_line_infos(&self) -> Vec<LineInfo> {
        vec![LineInfo::new(LineKind::SourceData, self.source.clone())]
    }

    fn target_line_infos(&self) -> Vec<LineInfo> {
        vec![LineInfo::new(LineKind::TargetData, self.target.clone())]
    }

    fn source_line(&self, requested: &LineInfo) -> Result<Box<dyn SourceDataLine>, LineError> {
        if !self.is_line_supported(requested) {
            return Err(LineError::UnsupportedFormat(self.info.name.clone()));
        }
        Ok(Box::new(MockLine {
            info: requested.clone(),
            mixer: self.info.name.clone(),
            format: None,
        }))
    }

    fn target_line(&self, requested: &LineInfo) -> Result<Box<dyn TargetDataLine>, LineError> {
        if !self.is_line_supported(requested) {
            return Err(LineError::UnsupportedFormat(self.info.name.clone()));
        }
        Ok(Box::new(MockLine {
            info: requested.clone(),
            mixer: self.info.name.clone(),
            format: None,
        }))
    }
}

pub struct MockLine {
    info: LineInfo,
    pub mixer: String,
    format: Option<AudioFormat>,
}

impl Line for MockLine {
    fn line_info(&self) -> LineInfo {
        self.info.clone()
    }

    fn open(&mut self, format: &AudioFormat) -> Result<(), LineError> {
        self.format = Some(format.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.format = None;
    }

    fn is_open(&self) -> bool {
        self.format.is_some()
    }

    fn format(&self) -> Option<&AudioFormat> {
        self.format.as_ref()
    }
}

impl SourceDataLine for MockLine {
    fn write(&mut self, data: &[u8]) -> Result<usize, LineError> {
        if self.format.is_none() {
            return Err(LineError::NotOpen);
        }
        Ok(data.len())
    }

    fn drain(&mut self) {}
}

impl TargetDataLine for MockLine {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LineError> {
        if self.format.is_none() {
            return Err(LineError::NotOpen);
        }
        buf.fill(0);
        Ok(buf.len())
    }
}

pub struct MockMixerProvider {
    name: String,
    mixers: Vec<Arc<MockMixer>>,
    has_default: bool,
}

impl MockMixerProvider {
    pub fn new(name: &str, mixers: Vec<Arc<MockMixer>>, has_default: bool) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            mixers,
            has_default,
        })
    }
}

impl MixerProvider for MockMixerProvider {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn mixer_infos(&self) -> Vec<DeviceInfo> {
        self.mixers.iter().map(|m| m.info.clone()).collect()
    }

    fn mixer(&self, info: Option<&DeviceInfo>) -> Result<Arc<dyn Mixer>, ProviderError> {
        let found = match info {
            Some(info) => self.mixers.iter().find(|m| &m.info == info),
            None if self.has_default => self.mixers.first(),
            None => None,
        };
        found
            .map(|m| m.clone() as Arc<dyn Mixer>)
            .ok_or_else(|| ProviderError::Unsupported(self.name.clone()))
    }
}

/// Re-tags a stream from one encoding to another, counting calls.
pub struct RetagConverter {
    name: String,
    from: Encoding,
    to: Encoding,
    pub calls: AtomicUsize,
}

impl RetagConverter {
    pub fn new(name: &str, from: Encoding, to: Encoding) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            from,
            to,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FormatConversionProvider for RetagConverter {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn source_encodings(&self) -> Vec<Encoding> {
        vec![self.from.clone()]
    }

    fn target_encodings(&self) -> Vec<Encoding> {
        vec![self.to.clone()]
    }

    fn target_encodings_for(&self, source: &AudioFormat) -> Vec<Encoding> {
        if source.encoding == self.from {
            vec![self.to.clone()]
        } else {
            Vec::new()
        }
    }

    fn target_formats(&self, encoding: &Encoding, source: &AudioFormat) -> Vec<AudioFormat> {
        if source.encoding != self.from || *encoding != self.to {
            return Vec::new();
        }
        let mut format = source.clone();
        format.encoding = self.to.clone();
        vec![format]
    }

    fn convert(
        &self,
        target: &AudioFormat,
        source: AudioInputStream,
    ) -> Result<AudioInputStream, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let format = target.resolved_against(source.format());
        let frames = source.frame_length();
        Ok(AudioInputStream::new(source.into_inner(), format, frames))
    }
}
