use resona_ports::preferences::{PreferenceError, PreferenceSource};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "RESONA_";

/// Preferences from a bundled `sound.json` defaults file, overridden by
/// `RESONA_*` environment variables captured at load time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FsPreferences {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl FsPreferences {
    pub fn from_parts(
        defaults: BTreeMap<String, String>,
        environment: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let overrides = environment
            .into_iter()
            .filter(|(name, _)| name.starts_with(ENV_PREFIX))
            .collect();
        Self {
            defaults,
            overrides,
        }
    }

    /// Like [`FsPreferences::from_parts`] for a raw process environment.
    /// Entries whose name or value is not valid UTF-8 are skipped.
    pub fn from_os_parts(
        defaults: BTreeMap<String, String>,
        environment: impl IntoIterator<Item = (OsString, OsString)>,
    ) -> Self {
        let environment = environment.into_iter().filter_map(|(name, value)| {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    log::debug!(target: "resona::config", "skipping non UTF-8 variable {:?}", name);
                    None
                }
            }
        });
        Self::from_parts(defaults, environment)
    }

    /// No defaults, current process environment.
    pub fn from_environment() -> Self {
        Self::from_os_parts(BTreeMap::new(), std::env::vars_os())
    }

    pub fn default_path() -> Result<PathBuf, PreferenceError> {
        let base = dirs_next::config_dir()
            .ok_or_else(|| PreferenceError::Io("config dir not found".to_string()))?;
        Ok(base.join("Resona").join("sound.json"))
    }

    /// Reads defaults from `path`; a missing file means no defaults.
    pub fn load(path: &Path) -> Result<Self, PreferenceError> {
        let defaults = if path.exists() {
            Self::read_json(path)?
        } else {
            log::debug!(target: "resona::config", "no defaults file at {}", path.display());
            BTreeMap::new()
        };
        Ok(Self::from_os_parts(defaults, std::env::vars_os()))
    }

    pub fn load_default() -> Result<Self, PreferenceError> {
        Self::load(&Self::default_path()?)
    }

    /// Environment variable overriding `key`, e.g. `RESONA_MIDI_RECEIVER`.
    pub fn env_key(key: &str) -> String {
        let mut name = String::with_capacity(ENV_PREFIX.len() + key.len());
        name.push_str(ENV_PREFIX);
        for c in key.chars() {
            name.push(if c == '.' { '_' } else { c.to_ascii_uppercase() });
        }
        name
    }

    /// Effective value per key, overrides applied.
    pub fn entries(&self, keys: &[&str]) -> Vec<(String, Option<String>)> {
        keys.iter()
            .map(|key| (key.to_string(), self.lookup(key)))
            .collect()
    }

    fn read_json(path: &Path) -> Result<BTreeMap<String, String>, PreferenceError> {
        let data = fs::read(path).map_err(|e| PreferenceError::Io(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| PreferenceError::Serde(e.to_string()))
    }
}

impl PreferenceSource for FsPreferences {
    fn lookup(&self, key: &str) -> Option<String> {
        self.overrides
            .get(&Self::env_key(key))
            .or_else(|| self.defaults.get(key))
            .cloned()
    }
}
