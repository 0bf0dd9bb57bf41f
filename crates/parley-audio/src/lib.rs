pub mod capture;
pub mod detector;
pub mod frame_reader;
pub mod resampler;
pub mod ring_buffer;

pub use capture::{start_capture, CaptureConfig, CaptureStats, CaptureThread, DeviceConfig};
pub use detector::SilenceDetector;
pub use frame_reader::FrameReader;
pub use resampler::StreamResampler;
pub use ring_buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
