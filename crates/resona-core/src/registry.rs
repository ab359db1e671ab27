use resona_ports::midi::{MidiDeviceProvider, MidiFileReader};
use resona_ports::sampled::{AudioFileReader, FormatConversionProvider, MixerProvider};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProviderCategory {
    MidiDevice,
    Mixer,
    FormatConverter,
    AudioFileReader,
    MidiFileReader,
}

/// Installed providers per category, in registration order, at most one
/// per type name.
#[derive(Clone, Default)]
pub struct ProviderSet {
    midi_devices: Vec<Arc<dyn MidiDeviceProvider>>,
    mixers: Vec<Arc<dyn MixerProvider>>,
    format_converters: Vec<Arc<dyn FormatConversionProvider>>,
    audio_file_readers: Vec<Arc<dyn AudioFileReader>>,
    midi_file_readers: Vec<Arc<dyn MidiFileReader>>,
}

impl ProviderSet {
    pub fn builder() -> ProviderSetBuilder {
        ProviderSetBuilder::default()
    }

    pub fn midi_device_providers(&self) -> &[Arc<dyn MidiDeviceProvider>] {
        &self.midi_devices
    }

    pub fn mixer_providers(&self) -> &[Arc<dyn MixerProvider>] {
        &self.mixers
    }

    pub fn format_converters(&self) -> &[Arc<dyn FormatConversionProvider>] {
        &self.format_converters
    }

    pub fn audio_file_readers(&self) -> &[Arc<dyn AudioFileReader>] {
        &self.audio_file_readers
    }

    pub fn midi_file_readers(&self) -> &[Arc<dyn MidiFileReader>] {
        &self.midi_file_readers
    }

    /// Type names of the providers in `category`, in order.
    pub fn type_names(&self, category: ProviderCategory) -> Vec<String> {
        match category {
            ProviderCategory::MidiDevice => names(&self.midi_devices, |p| p.type_name()),
            ProviderCategory::Mixer => names(&self.mixers, |p| p.type_name()),
            ProviderCategory::FormatConverter => names(&self.format_converters, |p| p.type_name()),
            ProviderCategory::AudioFileReader => names(&self.audio_file_readers, |p| p.type_name()),
            ProviderCategory::MidiFileReader => names(&self.midi_file_readers, |p| p.type_name()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.midi_devices.is_empty()
            && self.mixers.is_empty()
            && self.format_converters.is_empty()
            && self.audio_file_readers.is_empty()
            && self.midi_file_readers.is_empty()
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field("midi_devices", &self.type_names(ProviderCategory::MidiDevice))
            .field("mixers", &self.type_names(ProviderCategory::Mixer))
            .field("format_converters", &self.type_names(ProviderCategory::FormatConverter))
            .field("audio_file_readers", &self.type_names(ProviderCategory::AudioFileReader))
            .field("midi_file_readers", &self.type_names(ProviderCategory::MidiFileReader))
            .finish()
    }
}

fn names<P: ?Sized>(providers: &[Arc<P>], type_name: impl Fn(&P) -> &str) -> Vec<String> {
    providers.iter().map(|p| type_name(p).to_string()).collect()
}

#[derive(Default)]
pub struct ProviderSetBuilder {
    set: ProviderSet,
}

impl ProviderSetBuilder {
    pub fn midi_device_provider(mut self, provider: Arc<dyn MidiDeviceProvider>) -> Self {
        push_unique(&mut self.set.midi_devices, provider, |p| p.type_name());
        self
    }

    pub fn mixer_provider(mut self, provider: Arc<dyn MixerProvider>) -> Self {
        push_unique(&mut self.set.mixers, provider, |p| p.type_name());
        self
    }

    pub fn format_converter(mut self, provider: Arc<dyn FormatConversionProvider>) -> Self {
        push_unique(&mut self.set.format_converters, provider, |p| p.type_name());
        self
    }

    pub fn audio_file_reader(mut self, provider: Arc<dyn AudioFileReader>) -> Self {
        push_unique(&mut self.set.audio_file_readers, provider, |p| p.type_name());
        self
    }

    pub fn midi_file_reader(mut self, provider: Arc<dyn MidiFileReader>) -> Self {
        push_unique(&mut self.set.midi_file_readers, provider, |p| p.type_name());
        self
    }

    pub fn build(self) -> ProviderSet {
        self.set
    }
}

fn push_unique<P: ?Sized>(list: &mut Vec<Arc<P>>, provider: Arc<P>, type_name: impl Fn(&P) -> &str) {
    let name = type_name(&provider);
    if list.iter().any(|existing| type_name(existing) == name) {
        log::debug!(target: "resona::registry", "skipping duplicate provider {}", name);
        return;
    }
    list.push(provider);
}

type Loader = Box<dyn Fn() -> ProviderSet + Send + Sync>;

/// Process-wide provider registry, populated on first use.
///
/// Population runs at most once even when several threads ask at the same
/// time; every caller sees the completed set.
pub struct ProviderRegistry {
    loader: Loader,
    providers: OnceLock<ProviderSet>,
}

impl ProviderRegistry {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> ProviderSet + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            providers: OnceLock::new(),
        }
    }

    /// A registry whose population is already known.
    pub fn with_providers(providers: ProviderSet) -> Self {
        let registry = Self::new(ProviderSet::default);
        let _ = registry.providers.set(providers);
        registry
    }

    pub fn providers(&self) -> &ProviderSet {
        self.providers.get_or_init(|| {
            let set = (self.loader)();
            log::debug!(target: "resona::registry", "registry populated: {:?}", set);
            set
        })
    }

    pub fn is_populated(&self) -> bool {
        self.providers.get().is_some()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.get())
            .finish_non_exhaustive()
    }
}
