use crate::error::SystemError;
use crate::registry::ProviderCategory;
use crate::system::SoundSystem;
use resona_ports::types::{DeviceInfo, DeviceRole};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct PlatformInfo {
    name: String,
    version: String,
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct ProviderSnapshot {
    categories: Vec<CategorySnapshot>,
    midi_devices: Vec<DeviceInfo>,
    mixers: Vec<DeviceInfo>,
    defaults: Vec<DefaultSnapshot>,
}

#[derive(Serialize)]
struct CategorySnapshot {
    category: ProviderCategory,
    providers: Vec<String>,
}

#[derive(Serialize)]
struct DefaultSnapshot {
    role: DeviceRole,
    device: Option<String>,
}

const CATEGORIES: [ProviderCategory; 5] = [
    ProviderCategory::MidiDevice,
    ProviderCategory::Mixer,
    ProviderCategory::FormatConverter,
    ProviderCategory::AudioFileReader,
    ProviderCategory::MidiFileReader,
];

const ROLES: [DeviceRole; 4] = [
    DeviceRole::Synthesizer,
    DeviceRole::Sequencer,
    DeviceRole::Receiver,
    DeviceRole::Transmitter,
];

/// Writes `providers.json` and `platform.json` into `dir`.
pub fn export_diagnostics(dir: &Path, system: &SoundSystem) -> Result<(), SystemError> {
    fs::create_dir_all(dir)?;

    let platform = PlatformInfo {
        name: "Resona".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    };

    let providers = system.providers();
    let snapshot = ProviderSnapshot {
        categories: CATEGORIES
            .into_iter()
            .map(|category| CategorySnapshot {
                category,
                providers: providers.type_names(category),
            })
            .collect(),
        midi_devices: system.midi_device_infos(),
        mixers: system.mixer_infos(),
        defaults: ROLES
            .into_iter()
            .map(|role| DefaultSnapshot {
                role,
                device: system
                    .default_device(role)
                    .ok()
                    .map(|device| device.info().name.clone()),
            })
            .collect(),
    };

    write_json(&dir.join("platform.json"), &platform)?;
    write_json(&dir.join("providers.json"), &snapshot)?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SystemError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| SystemError::Serde(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}
