use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::frame_reader::FrameReader;
use crate::ring_buffer::{AudioProducer, AudioRingBuffer};
use parley_foundation::AudioError;

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Pipeline sample rate delivered to consumers.
    pub sample_rate: u32,
    /// Pipeline channel count delivered to consumers.
    pub channels: u16,
    /// Samples per delivered frame, at the pipeline rate.
    pub frame_size: usize,
    /// Capacity of the capture ring, in device-rate samples.
    pub ring_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            frame_size: 1_600, // 100ms at 16kHz
            ring_capacity: 65_536,
        }
    }
}

/// Negotiated device format. The frame reader converts from this to the
/// pipeline format.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Default)]
pub struct CaptureStats {
    pub callbacks: AtomicU64,
    pub samples_captured: AtomicU64,
    pub samples_dropped: AtomicU64,
}

/// Handle to the dedicated thread that owns the cpal stream.
pub struct CaptureThread {
    handle: JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
    pub stats: Arc<CaptureStats>,
}

impl CaptureThread {
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.handle.join();
    }
}

/// Open the input device and start delivering frames.
///
/// The cpal stream lives on a dedicated capture thread; its callback only
/// converts samples to i16 and writes them to the ring. Device-open failure
/// is reported here, synchronously, and fails this capture attempt only.
pub fn start_capture(
    config: CaptureConfig,
    device_name: Option<&str>,
) -> Result<(CaptureThread, FrameReader), AudioError> {
    let (producer, consumer) = AudioRingBuffer::new(config.ring_capacity).split();
    let stats = Arc::new(CaptureStats::default());
    let shutdown = Arc::new(AtomicBool::new(false));
    let (startup_tx, startup_rx) = crossbeam_channel::bounded(1);

    let thread_stats = stats.clone();
    let thread_shutdown = shutdown.clone();
    let requested_device = device_name.map(String::from);

    let handle = thread::Builder::new()
        .name("audio-capture".to_string())
        .spawn(move || {
            match open_stream(requested_device.as_deref(), producer, thread_stats) {
                Ok((stream, device_config)) => {
                    let _ = startup_tx.send(Ok(device_config));
                    while !thread_shutdown.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(50));
                    }
                    drop(stream);
                    tracing::debug!("Audio capture thread shutting down");
                }
                Err(e) => {
                    let _ = startup_tx.send(Err(e));
                }
            }
        })
        .map_err(|e| AudioError::Fatal(format!("Failed to spawn audio thread: {}", e)))?;

    let device_config = match startup_rx.recv_timeout(Duration::from_secs(3)) {
        Ok(result) => result?,
        Err(_) => {
            shutdown.store(true, Ordering::SeqCst);
            return Err(AudioError::Fatal(
                "Audio capture thread did not report startup in time".to_string(),
            ));
        }
    };

    tracing::info!(
        "Capture started: device {}Hz {}ch -> pipeline {}Hz mono",
        device_config.sample_rate,
        device_config.channels,
        config.sample_rate
    );

    let reader = FrameReader::new(
        consumer,
        device_config,
        config.sample_rate,
        config.frame_size,
    );

    Ok((
        CaptureThread {
            handle,
            shutdown,
            stats,
        },
        reader,
    ))
}

fn open_stream(
    device_name: Option<&str>,
    producer: AudioProducer,
    stats: Arc<CaptureStats>,
) -> Result<(Stream, DeviceConfig), AudioError> {
    let host = cpal::default_host();

    let device = match device_name {
        Some(name) => host
            .input_devices()
            .map_err(|e| AudioError::Fatal(format!("Failed to enumerate devices: {}", e)))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| AudioError::DeviceNotFound {
                name: Some(name.to_string()),
            })?,
        None => host
            .default_input_device()
            .ok_or(AudioError::DeviceNotFound { name: None })?,
    };

    if let Ok(name) = device.name() {
        tracing::info!("Selected input device: {}", name);
    }

    let (config, sample_format) = negotiate_config(&device)?;
    let device_config = DeviceConfig {
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    };

    let err_fn = |err: cpal::StreamError| {
        tracing::error!("Audio stream error: {}", err);
    };

    let mut producer = producer;
    let mut handle_i16 = move |data: &[i16]| {
        let written = producer.write(data);
        stats.callbacks.fetch_add(1, Ordering::Relaxed);
        stats
            .samples_captured
            .fetch_add(written as u64, Ordering::Relaxed);
        if written < data.len() {
            stats
                .samples_dropped
                .fetch_add((data.len() - written) as u64, Ordering::Relaxed);
        }
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &_| handle_i16(data),
            err_fn,
            None,
        )?,
        SampleFormat::F32 => {
            let mut converted: Vec<i16> = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &_| {
                    converted.clear();
                    converted.reserve(data.len());
                    for &s in data {
                        converted.push((s.clamp(-1.0, 1.0) * 32767.0).round() as i16);
                    }
                    handle_i16(&converted);
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::U16 => {
            let mut converted: Vec<i16> = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &_| {
                    converted.clear();
                    converted.reserve(data.len());
                    for &s in data {
                        converted.push((s as i32 - 32768) as i16);
                    }
                    handle_i16(&converted);
                },
                err_fn,
                None,
            )?
        }
        other => {
            return Err(AudioError::FormatNotSupported {
                format: format!("{:?}", other),
            });
        }
    };

    stream.play()?;
    Ok((stream, device_config))
}

fn negotiate_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), AudioError> {
    if let Ok(default_config) = device.default_input_config() {
        return Ok((
            StreamConfig {
                channels: default_config.channels(),
                sample_rate: default_config.sample_rate(),
                buffer_size: cpal::BufferSize::Default,
            },
            default_config.sample_format(),
        ));
    }

    if let Ok(configs) = device.supported_input_configs() {
        if let Some(config) = configs.into_iter().next() {
            return Ok((config.with_max_sample_rate().into(), config.sample_format()));
        }
    }

    Err(AudioError::FormatNotSupported {
        format: "No supported audio formats".to_string(),
    })
}
