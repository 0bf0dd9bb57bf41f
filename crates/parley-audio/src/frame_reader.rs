use std::collections::VecDeque;

use crate::capture::DeviceConfig;
use crate::resampler::StreamResampler;
use crate::ring_buffer::AudioConsumer;

/// Consumer-side frame assembly: drains the capture ring, downmixes to mono,
/// resamples to the pipeline rate, and emits fixed-size frames.
pub struct FrameReader {
    consumer: AudioConsumer,
    device_channels: u16,
    resampler: StreamResampler,
    buffer: VecDeque<i16>,
    frame_size: usize,
    scratch: Vec<i16>,
}

impl FrameReader {
    pub fn new(
        consumer: AudioConsumer,
        device_config: DeviceConfig,
        target_rate: u32,
        frame_size: usize,
    ) -> Self {
        Self {
            consumer,
            device_channels: device_config.channels.max(1),
            resampler: StreamResampler::new(device_config.sample_rate, target_rate),
            buffer: VecDeque::with_capacity(frame_size * 4),
            frame_size,
            scratch: Vec::new(),
        }
    }

    /// Drain pending capture samples and return the next frame if one is
    /// ready. Non-blocking; callers poll at their own interval.
    pub fn read_frame(&mut self) -> Option<Vec<i16>> {
        self.scratch.clear();
        self.consumer.read(&mut self.scratch, 8_192);

        if !self.scratch.is_empty() {
            let mono = downmix(&self.scratch, self.device_channels);
            let resampled = self.resampler.process(&mono);
            self.buffer.extend(resampled);
        }

        if self.buffer.len() >= self.frame_size {
            Some(self.buffer.drain(..self.frame_size).collect())
        } else {
            None
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
}

fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring_buffer::AudioRingBuffer;

    fn reader_with(device_rate: u32, channels: u16, frame_size: usize) -> (super::FrameReader, crate::ring_buffer::AudioProducer) {
        let (prod, cons) = AudioRingBuffer::new(16_384).split();
        let reader = FrameReader::new(
            cons,
            DeviceConfig {
                sample_rate: device_rate,
                channels,
            },
            16_000,
            frame_size,
        );
        (reader, prod)
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let samples = vec![1000i16, -1000, 900, -900, 800, -800, 700, -700];
        assert_eq!(downmix(&samples, 2), vec![0, 0, 0, 0]);
    }

    #[test]
    fn emits_fixed_size_frames_at_native_rate() {
        let (mut reader, mut prod) = reader_with(16_000, 1, 160);
        prod.write(&[42i16; 400]);

        let first = reader.read_frame().unwrap();
        assert_eq!(first.len(), 160);
        let second = reader.read_frame().unwrap();
        assert_eq!(second.len(), 160);
        // 80 samples remain buffered, not enough for a frame
        assert!(reader.read_frame().is_none());
    }

    #[test]
    fn no_data_yields_no_frame() {
        let (mut reader, _prod) = reader_with(16_000, 1, 160);
        assert!(reader.read_frame().is_none());
    }
}
