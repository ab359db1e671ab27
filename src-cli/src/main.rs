use resona_core::{
    export_diagnostics, PreferenceKey, Preferences, ProviderRegistry, ProviderSet, SoundSystem,
};
use resona_infra_audio_cpal::CpalMixerProvider;
use resona_infra_codec_pcm::PcmConverter;
use resona_infra_config_fs::FsPreferences;
use resona_infra_file_hound::WaveFileReader;
use resona_infra_file_midly::StandardMidiFileReader;
use resona_infra_midi_midir::MidirProvider;
use resona_infra_synth_simple::SimpleSynthProvider;
use resona_ports::midi::{MidiFileFormat, Receiver};
use resona_ports::sampled::{AudioFileFormat, AudioFormat};
use resona_ports::types::DeviceRole;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const USAGE: &str = "usage: resona <devices|mixers|defaults|prefs|inspect FILE|note KEY|tone HZ|diagnostics DIR>";

fn registry() -> ProviderRegistry {
    ProviderRegistry::new(|| {
        ProviderSet::builder()
            .midi_device_provider(Arc::new(SimpleSynthProvider::default()))
            .midi_device_provider(Arc::new(MidirProvider::default()))
            .mixer_provider(Arc::new(CpalMixerProvider::default()))
            .format_converter(Arc::new(PcmConverter::new()))
            .audio_file_reader(Arc::new(WaveFileReader::new()))
            .midi_file_reader(Arc::new(StandardMidiFileReader::new()))
            .build()
    })
}

fn load_preferences() -> FsPreferences {
    match FsPreferences::load_default() {
        Ok(preferences) => preferences,
        Err(err) => {
            log::warn!(target: "resona::cli", "preferences unavailable, using defaults: {}", err);
            FsPreferences::from_environment()
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct DefaultEntry {
    role: DeviceRole,
    device: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Inspection {
    Audio(AudioFileFormat),
    Midi(MidiFileFormat),
}

fn inspect(system: &SoundSystem, path: &Path) -> Result<Inspection, String> {
    let mut stream = BufReader::new(File::open(path).map_err(|e| e.to_string())?);
    match system.audio_file_format(&mut stream) {
        Ok(format) => return Ok(Inspection::Audio(format)),
        Err(err) => log::debug!(target: "resona::cli", "not audio: {}", err),
    }
    let mut stream = BufReader::new(File::open(path).map_err(|e| e.to_string())?);
    system
        .midi_file_format(&mut stream)
        .map(Inspection::Midi)
        .map_err(|e| e.to_string())
}

fn note(system: &SoundSystem, key: u8) -> Result<(), String> {
    let mut receiver = system.default_receiver().map_err(|e| e.to_string())?;
    println!("sending to {}", receiver.device().info().name);
    receiver.send(&[0x90, key, 100], None).map_err(|e| e.to_string())?;
    std::thread::sleep(Duration::from_millis(500));
    receiver.send(&[0x80, key, 0], None).map_err(|e| e.to_string())?;
    Box::new(receiver).close();
    Ok(())
}

fn tone(system: &SoundSystem, hz: f32) -> Result<(), String> {
    let format = AudioFormat::pcm_signed(44_100.0, 16, 2, false);
    let mut line = system.source_data_line(&format).map_err(|e| e.to_string())?;
    line.open(&format).map_err(|e| e.to_string())?;

    let mut data = Vec::with_capacity(44_100 * 4);
    for frame in 0..44_100u32 {
        let phase = frame as f32 * hz * std::f32::consts::TAU / 44_100.0;
        let sample = ((phase.sin() * 0.2) * i16::MAX as f32) as i16;
        data.extend_from_slice(&sample.to_le_bytes());
        data.extend_from_slice(&sample.to_le_bytes());
    }
    line.write(&data).map_err(|e| e.to_string())?;
    line.drain();
    line.close();
    Ok(())
}

fn run(args: &[String]) -> Result<(), String> {
    let fs_preferences = load_preferences();
    let keys: Vec<&str> = PreferenceKey::ALL.iter().map(|key| key.as_str()).collect();
    let entries = fs_preferences.entries(&keys);
    let system = SoundSystem::new(Arc::new(registry()), Preferences::new(fs_preferences));

    match args.first().map(String::as_str) {
        Some("devices") => print_json(&system.midi_device_infos()),
        Some("mixers") => print_json(&system.mixer_infos()),
        Some("defaults") => {
            let roles = [
                DeviceRole::Synthesizer,
                DeviceRole::Sequencer,
                DeviceRole::Receiver,
                DeviceRole::Transmitter,
            ];
            let entries: Vec<DefaultEntry> = roles
                .into_iter()
                .map(|role| match system.default_device(role) {
                    Ok(device) => DefaultEntry {
                        role,
                        device: Some(device.info().name.clone()),
                        error: None,
                    },
                    Err(err) => DefaultEntry {
                        role,
                        device: None,
                        error: Some(err.to_string()),
                    },
                })
                .collect();
            print_json(&entries)
        }
        Some("prefs") => print_json(&entries),
        Some("inspect") => {
            let path = args.get(1).ok_or(USAGE)?;
            print_json(&inspect(&system, Path::new(path))?)
        }
        Some("note") => {
            let key = args
                .get(1)
                .map_or(Ok(60), |raw| raw.parse::<u8>())
                .map_err(|e| e.to_string())?;
            if key > 127 {
                return Err(format!("key out of range: {key}"));
            }
            note(&system, key)
        }
        Some("tone") => {
            let hz = args
                .get(1)
                .map_or(Ok(440.0), |raw| raw.parse::<f32>())
                .map_err(|e| e.to_string())?;
            tone(&system, hz)
        }
        Some("diagnostics") => {
            let dir = args.get(1).ok_or(USAGE)?;
            export_diagnostics(Path::new(dir), &system).map_err(|e| e.to_string())?;
            println!("wrote diagnostics to {dir}");
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
