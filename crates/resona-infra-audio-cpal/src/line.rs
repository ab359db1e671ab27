use crate::samples::{f32_to_i16, f32_to_u16, i16_to_f32, u16_to_f32, Layout};
use crate::{select_span, ConfigSpan, TARGET};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, SizedSample, StreamConfig};
use resona_ports::sampled::{AudioFormat, Line, LineError, LineInfo, SourceDataLine, TargetDataLine};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(2);

/// Negotiated stream parameters of an open line.
struct Negotiated {
    layout: Layout,
    channels: usize,
    span: ConfigSpan,
    config: StreamConfig,
}

fn negotiate(spans: &[ConfigSpan], format: &AudioFormat) -> Result<Negotiated, LineError> {
    let unsupported = || LineError::UnsupportedFormat(format.to_string());
    let layout = Layout::of(format).ok_or_else(unsupported)?;
    let channels = format.channels.ok_or_else(unsupported)?;
    let rate = format.sample_rate.ok_or_else(unsupported)?.round() as u32;
    let span = select_span(spans, channels, rate).ok_or_else(unsupported)?;
    Ok(Negotiated {
        layout,
        channels: channels as usize,
        span,
        config: StreamConfig {
            channels,
            sample_rate: SampleRate(rate),
            buffer_size: BufferSize::Default,
        },
    })
}

/// Half a second of interleaved samples.
fn ring_capacity(negotiated: &Negotiated) -> usize {
    (negotiated.config.sample_rate.0 as usize * negotiated.channels / 2).max(1024)
}

fn find_device(host_id: cpal::HostId, name: &str, output: bool) -> Result<cpal::Device, LineError> {
    let host = cpal::host_from_id(host_id).map_err(|e| LineError::Backend(e.to_string()))?;
    let devices: Vec<cpal::Device> = if output {
        host.output_devices().map(|devices| devices.collect())
    } else {
        host.input_devices().map(|devices| devices.collect())
    }
    .map_err(|e| LineError::Backend(e.to_string()))?;

    devices
        .into_iter()
        .find(|device| device.name().is_ok_and(|n| n == name))
        .ok_or_else(|| LineError::Unavailable(name.to_string()))
}

/// Owns the thread that keeps a `cpal::Stream` alive.
struct StreamThread {
    stop_tx: mpsc::Sender<()>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl StreamThread {
    fn spawn<F>(build: F) -> Result<Self, LineError>
    where
        F: FnOnce() -> Result<cpal::Stream, LineError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join_handle = thread::spawn(move || {
            let stream = match build() {
                Ok(stream) => stream,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            if let Err(err) = stream.play() {
                let _ = ready_tx.send(Err(LineError::Backend(err.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));
            let _ = stop_rx.recv();
            drop(stream);
        });

        ready_rx
            .recv()
            .map_err(|e| LineError::Backend(e.to_string()))??;
        Ok(Self {
            stop_tx,
            join_handle: Some(join_handle),
        })
    }

    fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

fn stream_error(err: cpal::StreamError) {
    log::warn!(target: TARGET, "stream error: {}", err);
}

fn build_output<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: Consumer<f32>,
    convert: fn(f32) -> T,
) -> Result<cpal::Stream, LineError>
where
    T: SizedSample + Send + 'static,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
                for sample in data.iter_mut() {
                    *sample = convert(consumer.pop().unwrap_or(0.0));
                }
            },
            stream_error,
            None,
        )
        .map_err(|e| LineError::Backend(e.to_string()))
}

fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: Producer<f32>,
    convert: fn(T) -> f32,
) -> Result<cpal::Stream, LineError>
where
    T: SizedSample + Send + 'static,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _info: &cpal::InputCallbackInfo| {
                for sample in data {
                    if producer.push(convert(*sample)).is_err() {
                        break;
                    }
                }
            },
            stream_error,
            None,
        )
        .map_err(|e| LineError::Backend(e.to_string()))
}

fn identity(value: f32) -> f32 {
    value
}

struct OpenSource {
    format: AudioFormat,
    layout: Layout,
    channels: usize,
    producer: Producer<f32>,
    stream: StreamThread,
}

/// Playback line: `write` queues samples in a ring buffer that the device
/// callback drains.
pub(crate) struct CpalSourceLine {
    host_id: cpal::HostId,
    device_name: String,
    spans: Vec<ConfigSpan>,
    info: LineInfo,
    open: Option<OpenSource>,
}

impl CpalSourceLine {
    pub(crate) fn new(
        host_id: cpal::HostId,
        device_name: String,
        spans: Vec<ConfigSpan>,
        info: LineInfo,
    ) -> Self {
        Self {
            host_id,
            device_name,
            spans,
            info,
            open: None,
        }
    }
}

impl Line for CpalSourceLine {
    fn line_info(&self) -> LineInfo {
        self.info.clone()
    }

    fn open(&mut self, format: &AudioFormat) -> Result<(), LineError> {
        if let Some(open) = &self.open {
            return if &open.format == format {
                Ok(())
            } else {
                Err(LineError::Unavailable(format!("already open as {}", open.format)))
            };
        }

        let negotiated = negotiate(&self.spans, format)?;
        let (producer, consumer) = RingBuffer::<f32>::new(ring_capacity(&negotiated));
        let host_id = self.host_id;
        let name = self.device_name.clone();
        let config = negotiated.config.clone();
        let sample_format = negotiated.span.sample_format;

        let stream = StreamThread::spawn(move || {
            let device = find_device(host_id, &name, true)?;
            match sample_format {
                SampleFormat::F32 => build_output(&device, &config, consumer, identity),
                SampleFormat::I16 => build_output(&device, &config, consumer, f32_to_i16),
                SampleFormat::U16 => build_output(&device, &config, consumer, f32_to_u16),
                other => Err(LineError::UnsupportedFormat(format!("{other:?}"))),
            }
        })?;

        log::debug!(target: TARGET, "{} playing {}", self.device_name, format);
        self.open = Some(OpenSource {
            format: format.clone(),
            layout: negotiated.layout,
            channels: negotiated.channels,
            producer,
            stream,
        });
        Ok(())
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            open.stream.stop();
        }
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn format(&self) -> Option<&AudioFormat> {
        self.open.as_ref().map(|open| &open.format)
    }
}

impl SourceDataLine for CpalSourceLine {
    /// Blocks until every whole frame in `data` is queued.
    fn write(&mut self, data: &[u8]) -> Result<usize, LineError> {
        let open = self.open.as_mut().ok_or(LineError::NotOpen)?;
        let frame_bytes = open.layout.bytes_per_sample() * open.channels;
        let usable = data.len() - data.len() % frame_bytes;

        let mut samples = open.layout.decode(&data[..usable]).peekable();
        while samples.peek().is_some() {
            if open.producer.is_abandoned() {
                return Err(LineError::Backend("stream stopped".to_string()));
            }
            let free = open.producer.slots();
            if free < open.channels {
                thread::sleep(POLL);
                continue;
            }
            for sample in samples.by_ref().take(free - free % open.channels) {
                let _ = open.producer.push(sample);
            }
        }
        Ok(usable)
    }

    fn drain(&mut self) {
        if let Some(open) = self.open.as_ref() {
            let capacity = open.producer.buffer().capacity();
            while !open.producer.is_abandoned() && open.producer.slots() < capacity {
                thread::sleep(POLL);
            }
        }
    }
}

impl Drop for CpalSourceLine {
    fn drop(&mut self) {
        self.close();
    }
}

struct OpenTarget {
    format: AudioFormat,
    layout: Layout,
    channels: usize,
    consumer: Consumer<f32>,
    stream: StreamThread,
}

/// Capture line: the device callback fills a ring buffer that `read`
/// empties. Samples arriving while the buffer is full are dropped.
pub(crate) struct CpalTargetLine {
    host_id: cpal::HostId,
    device_name: String,
    spans: Vec<ConfigSpan>,
    info: LineInfo,
    open: Option<OpenTarget>,
}

impl CpalTargetLine {
    pub(crate) fn new(
        host_id: cpal::HostId,
        device_name: String,
        spans: Vec<ConfigSpan>,
        info: LineInfo,
    ) -> Self {
        Self {
            host_id,
            device_name,
            spans,
            info,
            open: None,
        }
    }
}

impl Line for CpalTargetLine {
    fn line_info(&self) -> LineInfo {
        self.info.clone()
    }

    fn open(&mut self, format: &AudioFormat) -> Result<(), LineError> {
        if let Some(open) = &self.open {
            return if &open.format == format {
                Ok(())
            } else {
                Err(LineError::Unavailable(format!("already open as {}", open.format)))
            };
        }

        let negotiated = negotiate(&self.spans, format)?;
        let (producer, consumer) = RingBuffer::<f32>::new(ring_capacity(&negotiated));
        let host_id = self.host_id;
        let name = self.device_name.clone();
        let config = negotiated.config.clone();
        let sample_format = negotiated.span.sample_format;

        let stream = StreamThread::spawn(move || {
            let device = find_device(host_id, &name, false)?;
            match sample_format {
                SampleFormat::F32 => build_input(&device, &config, producer, identity),
                SampleFormat::I16 => build_input(&device, &config, producer, i16_to_f32),
                SampleFormat::U16 => build_input(&device, &config, producer, u16_to_f32),
                other => Err(LineError::UnsupportedFormat(format!("{other:?}"))),
            }
        })?;

        log::debug!(target: TARGET, "{} recording {}", self.device_name, format);
        self.open = Some(OpenTarget {
            format: format.clone(),
            layout: negotiated.layout,
            channels: negotiated.channels,
            consumer,
            stream,
        });
        Ok(())
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            open.stream.stop();
        }
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn format(&self) -> Option<&AudioFormat> {
        self.open.as_ref().map(|open| &open.format)
    }
}

impl TargetDataLine for CpalTargetLine {
    /// Blocks until `buf` holds as many whole frames as fit.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LineError> {
        let open = self.open.as_mut().ok_or(LineError::NotOpen)?;
        let sample_bytes = open.layout.bytes_per_sample();
        let frame_bytes = sample_bytes * open.channels;
        let usable = buf.len() - buf.len() % frame_bytes;
        let wanted = usable / sample_bytes;

        while open.consumer.slots() < wanted {
            if open.consumer.is_abandoned() {
                return Err(LineError::Backend("stream stopped".to_string()));
            }
            thread::sleep(POLL);
        }
        for chunk in buf[..usable].chunks_exact_mut(sample_bytes) {
            let sample = open.consumer.pop().unwrap_or(0.0);
            open.layout.encode(sample, chunk);
        }
        Ok(usable)
    }
}

impl Drop for CpalTargetLine {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_ports::sampled::{Encoding, LineKind};

    fn spans() -> Vec<ConfigSpan> {
        vec![ConfigSpan {
            channels: 2,
            min_rate: 8_000,
            max_rate: 48_000,
            sample_format: SampleFormat::I16,
        }]
    }

    #[test]
    fn negotiation_needs_a_concrete_supported_format() {
        let ok = negotiate(&spans(), &AudioFormat::pcm_signed(44_100.0, 16, 2, false)).unwrap();
        assert_eq!(ok.layout, Layout::I16);
        assert_eq!(ok.config.sample_rate, SampleRate(44_100));
        assert_eq!(ring_capacity(&ok), 44_100);

        let mut open_rate = AudioFormat::pcm_signed(44_100.0, 16, 2, false);
        open_rate.sample_rate = None;
        assert!(negotiate(&spans(), &open_rate).is_err());
        assert!(negotiate(&spans(), &AudioFormat::pcm_signed(96_000.0, 16, 2, false)).is_err());
        assert!(negotiate(&spans(), &AudioFormat::pcm(Encoding::ULaw, 8_000.0, 8, 2, false)).is_err());
    }

    #[test]
    fn unopened_lines_refuse_io() {
        let info = LineInfo::new(LineKind::SourceData, Vec::new());
        let mut source = CpalSourceLine::new(cpal::default_host().id(), "x".into(), spans(), info.clone());
        assert!(matches!(source.write(&[0; 4]), Err(LineError::NotOpen)));
        source.drain();

        let mut target = CpalTargetLine::new(cpal::default_host().id(), "x".into(), spans(), info);
        assert!(matches!(target.read(&mut [0; 4]), Err(LineError::NotOpen)));
        assert!(target.format().is_none());
    }
}
