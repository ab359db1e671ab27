use std::collections::{BTreeMap, HashMap};

#[derive(thiserror::Error, Debug)]
pub enum PreferenceError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

/// Key-value source of `ProviderType#InstanceName` preference strings.
pub trait PreferenceSource: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// A source with nothing configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPreferences;

impl PreferenceSource for NoPreferences {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

impl PreferenceSource for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl PreferenceSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
