use resona_ports::preferences::PreferenceSource;
use resona_ports::types::DeviceRole;
use std::fmt;
use std::sync::OnceLock;

/// A parsed `ProviderType#InstanceName` preference. Either half may be
/// absent; a value with neither half means "no preference".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preference {
    pub provider_type: Option<String>,
    pub instance_name: Option<String>,
}

impl Preference {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (provider, instance) = match raw.split_once('#') {
            Some((provider, instance)) => (provider.trim(), instance.trim()),
            None => (raw, ""),
        };

        if provider.chars().any(char::is_whitespace) {
            log::warn!(
                target: "resona::preference",
                "ignoring malformed preference {:?}: provider type contains whitespace",
                raw
            );
            return Self::none();
        }

        Self {
            provider_type: non_empty(provider),
            instance_name: non_empty(instance),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.provider_type.is_none() && self.instance_name.is_none()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_type.as_deref().unwrap_or(""))?;
        if let Some(instance) = &self.instance_name {
            write!(f, "#{instance}")?;
        }
        Ok(())
    }
}

/// Preference keys, one per resolvable category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Receiver,
    Transmitter,
    Synthesizer,
    Sequencer,
    SourceDataLine,
    TargetDataLine,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 6] = [
        PreferenceKey::Receiver,
        PreferenceKey::Transmitter,
        PreferenceKey::Synthesizer,
        PreferenceKey::Sequencer,
        PreferenceKey::SourceDataLine,
        PreferenceKey::TargetDataLine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::Receiver => "midi.receiver",
            PreferenceKey::Transmitter => "midi.transmitter",
            PreferenceKey::Synthesizer => "midi.synthesizer",
            PreferenceKey::Sequencer => "midi.sequencer",
            PreferenceKey::SourceDataLine => "sampled.source_data_line",
            PreferenceKey::TargetDataLine => "sampled.target_data_line",
        }
    }

    pub fn for_role(role: DeviceRole) -> Self {
        match role {
            DeviceRole::Receiver => PreferenceKey::Receiver,
            DeviceRole::Transmitter => PreferenceKey::Transmitter,
            DeviceRole::Synthesizer => PreferenceKey::Synthesizer,
            DeviceRole::Sequencer => PreferenceKey::Sequencer,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-category preferences, looked up and parsed once on first use.
pub struct Preferences {
    source: Box<dyn PreferenceSource>,
    parsed: [OnceLock<Preference>; 6],
}

impl Preferences {
    pub fn new(source: impl PreferenceSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            parsed: Default::default(),
        }
    }

    pub fn get(&self, key: PreferenceKey) -> &Preference {
        self.parsed[key.index()].get_or_init(|| {
            let preference = self
                .source
                .lookup(key.as_str())
                .map(|raw| Preference::parse(&raw))
                .unwrap_or_default();
            if !preference.is_empty() {
                log::debug!(
                    target: "resona::preference",
                    "{} preference: {}",
                    key.as_str(),
                    preference
                );
            }
            preference
        })
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(resona_ports::preferences::NoPreferences)
    }
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for key in PreferenceKey::ALL {
            if let Some(preference) = self.parsed[key.index()].get() {
                list.entry(&key.as_str(), preference);
            }
        }
        list.finish()
    }
}
