use pretty_assertions::assert_eq;
use resona_infra_config_fs::FsPreferences;
use resona_ports::preferences::{PreferenceError, PreferenceSource};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("resona-config-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn defaults() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("midi.receiver".to_string(), "Ports#Out A".to_string());
    map.insert("midi.synthesizer".to_string(), "Soft".to_string());
    map
}

#[test]
fn override_beats_default() {
    let prefs = FsPreferences::from_parts(
        defaults(),
        vec![
            ("RESONA_MIDI_RECEIVER".to_string(), "Ports#Out B".to_string()),
            ("HOME".to_string(), "/home/someone".to_string()),
        ],
    );

    assert_eq!(prefs.lookup("midi.receiver").as_deref(), Some("Ports#Out B"));
    assert_eq!(prefs.lookup("midi.synthesizer").as_deref(), Some("Soft"));
    assert_eq!(prefs.lookup("midi.sequencer"), None);
}

#[test]
fn entries_report_effective_values() {
    let prefs = FsPreferences::from_parts(
        defaults(),
        vec![("RESONA_MIDI_SEQUENCER".to_string(), "Seq".to_string())],
    );

    assert_eq!(
        prefs.entries(&["midi.receiver", "midi.sequencer", "midi.transmitter"]),
        vec![
            ("midi.receiver".to_string(), Some("Ports#Out A".to_string())),
            ("midi.sequencer".to_string(), Some("Seq".to_string())),
            ("midi.transmitter".to_string(), None),
        ]
    );
}

#[test]
fn loads_defaults_file() {
    let dir = scratch_dir("load");
    let path = dir.join("sound.json");
    fs::write(&path, br#"{ "midi.receiver": "Ports#Out A", "sampled.source_data_line": "Cpal" }"#)
        .unwrap();

    let prefs = FsPreferences::load(&path).unwrap();
    if std::env::var(FsPreferences::env_key("sampled.source_data_line")).is_err() {
        assert_eq!(prefs.lookup("sampled.source_data_line").as_deref(), Some("Cpal"));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_empty_defaults() {
    let dir = scratch_dir("missing");
    let prefs = FsPreferences::load(&dir.join("absent.json")).unwrap();
    if std::env::var("RESONA_MIDI_RECEIVER").is_err() {
        assert_eq!(prefs.lookup("midi.receiver"), None);
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_file_is_a_serde_error() {
    let dir = scratch_dir("malformed");
    let path = dir.join("sound.json");
    fs::write(&path, b"[1, 2, 3]").unwrap();

    assert!(matches!(FsPreferences::load(&path), Err(PreferenceError::Serde(_))));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_override_is_passed_through_verbatim() {
    let prefs = FsPreferences::from_parts(
        defaults(),
        vec![("RESONA_MIDI_RECEIVER".to_string(), "Soft Synth#Synth A".to_string())],
    );
    assert_eq!(prefs.lookup("midi.receiver").as_deref(), Some("Soft Synth#Synth A"));
}

#[cfg(unix)]
#[test]
fn undecodable_environment_entries_are_skipped() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let prefs = FsPreferences::from_os_parts(
        defaults(),
        vec![
            (OsString::from("RESONA_MIDI_RECEIVER"), OsString::from_vec(b"f\xFFo".to_vec())),
            (OsString::from_vec(b"RESONA_\xFF".to_vec()), OsString::from("x")),
            (OsString::from("RESONA_MIDI_SEQUENCER"), OsString::from("Seq")),
        ],
    );

    assert_eq!(prefs.lookup("midi.receiver").as_deref(), Some("Ports#Out A"));
    assert_eq!(prefs.lookup("midi.sequencer").as_deref(), Some("Seq"));
}

#[cfg(unix)]
#[test]
fn load_tolerates_undecodable_process_environment() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let name = "RESONA_UNDECODABLE_TEST_ENTRY";
    std::env::set_var(name, OsStr::from_bytes(b"f\xFFo"));
    let dir = scratch_dir("undecodable");

    let loaded = FsPreferences::load(&dir.join("absent.json"));
    let fallback = FsPreferences::from_environment();
    std::env::remove_var(name);

    assert!(loaded.is_ok());
    assert_eq!(fallback.lookup("undecodable.test.entry"), None);
    let _ = fs::remove_dir_all(&dir);
}
