mod queue;

pub use queue::{ChannelState, MessageQueue, QueuedMessage, VoiceParams, CHANNELS};

use parking_lot::Mutex;
use queue::Channels;
use resona_domain_soundbank::GeneratorRegion;
use resona_ports::message::ChannelMessage;
use resona_ports::midi::{
    MidiDevice, MidiDeviceProvider, MidiError, Receiver, Transmitter, UseCount,
};
use resona_ports::provider::ProviderError;
use resona_ports::types::{Capabilities, DeviceInfo, PortLimit};
use rtrb::{Producer, RingBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEVICE_NAME: &str = "Resona Simple Synth";

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

const TARGET: &str = "resona::synth";

struct Shared {
    open: AtomicBool,
    producer: Mutex<Producer<QueuedMessage>>,
    channels: Mutex<Channels>,
}

impl Shared {
    fn enqueue(&self, message: ChannelMessage, timestamp_us: Option<i64>) {
        let queued = QueuedMessage {
            message,
            timestamp_us,
        };
        if self.producer.lock().push(queued).is_err() {
            log::debug!(target: TARGET, "queue full, dropping {:?}", message);
        }
    }
}

/// Software synthesizer device. Receivers parse incoming bytes into channel
/// messages and queue them for a renderer, which takes the other end of the
/// queue once with [`SimpleSynthDevice::take_queue`].
///
/// Thread model:
/// - receivers may send from any thread
/// - the queue consumer belongs to whoever took it
pub struct SimpleSynthDevice {
    info: DeviceInfo,
    use_count: UseCount,
    params: VoiceParams,
    shared: Arc<Shared>,
    queue: Mutex<Option<MessageQueue>>,
}

impl SimpleSynthDevice {
    pub fn new() -> Self {
        Self::with_region(queue::default_region(), DEFAULT_QUEUE_CAPACITY)
    }

    /// Voice envelope and level for the renderer come from the generators in
    /// `region`.
    pub fn with_region(region: GeneratorRegion, capacity: usize) -> Self {
        let (producer, consumer) = RingBuffer::new(capacity.max(1));
        Self {
            info: DeviceInfo::new(
                DEVICE_NAME,
                "Resona",
                "Software synthesizer",
                env!("CARGO_PKG_VERSION"),
            ),
            use_count: UseCount::new(),
            params: VoiceParams::from_region(&region),
            shared: Arc::new(Shared {
                open: AtomicBool::new(false),
                producer: Mutex::new(producer),
                channels: Mutex::new(Channels::default()),
            }),
            queue: Mutex::new(Some(MessageQueue::new(consumer))),
        }
    }

    pub fn voice_params(&self) -> VoiceParams {
        self.params
    }

    /// Hands out the renderer end of the queue; `None` once taken.
    pub fn take_queue(&self) -> Option<MessageQueue> {
        self.queue.lock().take()
    }

    pub fn channel_state(&self, channel: u8) -> ChannelState {
        self.shared.channels.lock().get(channel)
    }

    /// Keys held down or kept by the sustain pedal, over all channels.
    pub fn sounding_notes(&self) -> u32 {
        self.shared.channels.lock().sounding_notes()
    }
}

impl Default for SimpleSynthDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiDevice for SimpleSynthDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::synthesizer(PortLimit::Unlimited)
    }

    fn open(&self) -> Result<(), MidiError> {
        self.shared.open.store(true, Ordering::SeqCst);
        log::debug!(target: TARGET, "{} opened", self.info.name);
        Ok(())
    }

    /// Queues "all sound off" on every channel that still has keys sounding.
    fn close(&self) {
        self.shared.open.store(false, Ordering::SeqCst);
        let sounding: Vec<u8> = {
            let mut channels = self.shared.channels.lock();
            let sounding = (0..CHANNELS as u8)
                .filter(|channel| channels.get(*channel).sounding_notes() > 0)
                .collect();
            channels.reset();
            sounding
        };
        for channel in sounding {
            let all_sound_off = ChannelMessage::ControlChange {
                channel,
                controller: 120,
                value: 0,
            };
            self.shared.enqueue(all_sound_off, None);
        }
        log::debug!(target: TARGET, "{} closed", self.info.name);
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> Result<Box<dyn Receiver>, MidiError> {
        Ok(Box::new(SynthReceiver {
            shared: self.shared.clone(),
        }))
    }

    fn transmitter(&self) -> Result<Box<dyn Transmitter>, MidiError> {
        Err(MidiError::DeviceUnavailable(format!(
            "{} has no transmitters",
            self.info.name
        )))
    }

    fn use_count(&self) -> Option<&UseCount> {
        Some(&self.use_count)
    }
}

struct SynthReceiver {
    shared: Arc<Shared>,
}

impl Receiver for SynthReceiver {
    fn send(&mut self, message: &[u8], timestamp_us: Option<i64>) -> Result<(), MidiError> {
        if !self.shared.open.load(Ordering::SeqCst) {
            return Err(MidiError::DeviceUnavailable("synthesizer is closed".to_string()));
        }
        if let Some(message) = ChannelMessage::parse(message)? {
            self.shared.channels.lock().apply(&message);
            self.shared.enqueue(message, timestamp_us);
        }
        Ok(())
    }

    fn close(self: Box<Self>) {}
}

/// Offers a single shared synthesizer instance.
pub struct SimpleSynthProvider {
    device: Arc<SimpleSynthDevice>,
}

impl SimpleSynthProvider {
    pub fn new(device: Arc<SimpleSynthDevice>) -> Self {
        Self { device }
    }

    pub fn device_handle(&self) -> Arc<SimpleSynthDevice> {
        self.device.clone()
    }
}

impl Default for SimpleSynthProvider {
    fn default() -> Self {
        Self::new(Arc::new(SimpleSynthDevice::default()))
    }
}

impl MidiDeviceProvider for SimpleSynthProvider {
    fn device_infos(&self) -> Vec<DeviceInfo> {
        vec![self.device.info.clone()]
    }

    fn device(&self, info: &DeviceInfo) -> Result<Arc<dyn MidiDevice>, ProviderError> {
        if info != &self.device.info {
            return Err(ProviderError::UnknownInfo(info.name.clone()));
        }
        Ok(self.device.clone())
    }
}
