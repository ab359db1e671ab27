use pretty_assertions::assert_eq;
use resona_domain_soundbank::{GeneratorId, GeneratorRegion};
use resona_infra_synth_simple::{QueuedMessage, SimpleSynthDevice, SimpleSynthProvider, DEVICE_NAME};
use resona_ports::message::ChannelMessage;
use resona_ports::midi::{MidiDevice, MidiDeviceProvider, MidiError};
use resona_ports::types::DeviceInfo;
use std::sync::Arc;

fn opened() -> Arc<SimpleSynthDevice> {
    let device = Arc::new(SimpleSynthDevice::new());
    device.open().unwrap();
    device
}

#[test]
fn provider_offers_one_shared_synthesizer() {
    let provider = SimpleSynthProvider::default();
    let infos = provider.device_infos();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].name, DEVICE_NAME);

    let a = provider.device(&infos[0]).unwrap();
    let b = provider.device(&infos[0]).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.capabilities().synthesizer);
    assert!(a.use_count().is_some());

    let unknown = DeviceInfo::new("Other", "", "", "");
    assert!(provider.device(&unknown).is_err());
}

#[test]
fn closed_synthesizer_rejects_messages() {
    let device = SimpleSynthDevice::new();
    let mut receiver = device.receiver().unwrap();
    assert!(matches!(
        receiver.send(&[0x90, 60, 100], None),
        Err(MidiError::DeviceUnavailable(_))
    ));
}

#[test]
fn receivers_queue_parsed_messages_in_order() {
    let device = opened();
    let mut queue = device.take_queue().unwrap();
    assert!(device.take_queue().is_none());

    let mut first = device.receiver().unwrap();
    let mut second = device.receiver().unwrap();
    first.send(&[0x90, 69, 127], Some(10)).unwrap();
    second.send(&[0xE1, 0x00, 0x40], None).unwrap();
    first.send(&[0x80, 69, 0], Some(30)).unwrap();

    assert_eq!(queue.len(), 3);
    assert_eq!(
        queue.drain(),
        vec![
            QueuedMessage {
                message: ChannelMessage::NoteOn {
                    channel: 0,
                    note: 69,
                    velocity: 127
                },
                timestamp_us: Some(10),
            },
            QueuedMessage {
                message: ChannelMessage::PitchBend {
                    channel: 1,
                    value: 0x2000
                },
                timestamp_us: None,
            },
            QueuedMessage {
                message: ChannelMessage::NoteOff {
                    channel: 0,
                    note: 69,
                    velocity: 0
                },
                timestamp_us: Some(30),
            },
        ]
    );
    assert!(queue.is_empty());
}

#[test]
fn system_messages_are_accepted_but_not_queued() {
    let device = opened();
    let queue = device.take_queue().unwrap();
    let mut receiver = device.receiver().unwrap();
    receiver.send(&[0xFE], None).unwrap();
    receiver.send(&[0xF0, 0x7E, 0xF7], None).unwrap();
    assert!(queue.is_empty());
}

#[test]
fn full_queue_drops_newest_messages() {
    let device = SimpleSynthDevice::with_region(GeneratorRegion::new(), 2);
    device.open().unwrap();
    let mut receiver = device.receiver().unwrap();
    for note in 60..64 {
        receiver.send(&[0x90, note, 100], None).unwrap();
    }

    let mut queue = device.take_queue().unwrap();
    let notes: Vec<ChannelMessage> = queue.drain().into_iter().map(|q| q.message).collect();
    assert_eq!(notes.len(), 2);
    assert_eq!(
        notes[1],
        ChannelMessage::NoteOn {
            channel: 0,
            note: 61,
            velocity: 100
        }
    );
    assert_eq!(device.sounding_notes(), 4);
}

#[test]
fn velocity_zero_is_note_off() {
    let device = opened();
    let mut receiver = device.receiver().unwrap();
    receiver.send(&[0x91, 60, 90], None).unwrap();
    assert_eq!(device.channel_state(1).sounding_notes(), 1);
    receiver.send(&[0x91, 60, 0], None).unwrap();
    assert_eq!(device.sounding_notes(), 0);
}

#[test]
fn sustain_pedal_holds_released_notes() {
    let device = opened();
    let mut receiver = device.receiver().unwrap();

    receiver.send(&[0xB0, 64, 127], None).unwrap();
    receiver.send(&[0x90, 60, 100], None).unwrap();
    receiver.send(&[0x80, 60, 0], None).unwrap();
    assert_eq!(device.sounding_notes(), 1);

    receiver.send(&[0xB0, 64, 0], None).unwrap();
    assert_eq!(device.sounding_notes(), 0);
}

#[test]
fn malformed_bytes_are_invalid_messages() {
    let device = opened();
    let mut receiver = device.receiver().unwrap();
    assert!(matches!(
        receiver.send(&[0x90, 60], None),
        Err(MidiError::InvalidMessage(_))
    ));
}

#[test]
fn region_generators_shape_the_voice() {
    let mut region = GeneratorRegion::new();
    region.set_short(GeneratorId::INITIAL_ATTENUATION, 200);
    region.set_short(GeneratorId::COARSE_TUNE, 12);
    let device = SimpleSynthDevice::with_region(region, 16);

    let params = device.voice_params();
    assert!((params.gain - 0.1).abs() < 1e-6);
    assert_eq!(params.tuning_cents, 1200.0);
    assert_eq!(params.release_seconds, 0.0);
}

#[test]
fn closing_queues_all_sound_off_for_sounding_channels() {
    let device = opened();
    let mut queue = device.take_queue().unwrap();
    let mut receiver = device.receiver().unwrap();
    receiver.send(&[0x92, 60, 100], None).unwrap();
    queue.drain();

    device.close();

    assert_eq!(device.sounding_notes(), 0);
    assert!(!device.is_open());
    assert!(device.transmitter().is_err());
    assert_eq!(
        queue.pop().map(|q| q.message),
        Some(ChannelMessage::ControlChange {
            channel: 2,
            controller: 120,
            value: 0
        })
    );
    assert!(queue.pop().is_none());
}
