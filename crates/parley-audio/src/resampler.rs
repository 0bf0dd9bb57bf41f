use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Streaming resampler for mono i16 audio using Rubato's sinc interpolation.
///
/// Maintains internal buffers so arbitrary-sized input chunks can be fed; the
/// filter parameters are a speech-grade preset (the pipeline only ever
/// converts a device rate down to the 16 kHz recognition rate).
pub struct StreamResampler {
    in_rate: u32,
    out_rate: u32,
    resampler: Option<SincFixedIn<f32>>,
    input_buffer: Vec<f32>,
    output_buffer: Vec<f32>,
    chunk_size: usize,
}

impl StreamResampler {
    pub fn new(in_rate: u32, out_rate: u32) -> Self {
        // 512 samples at 16kHz = 32ms, low enough latency for live decoding
        let chunk_size = 512;

        let resampler = if in_rate == out_rate {
            None
        } else {
            let sinc_params = SincInterpolationParameters {
                sinc_len: 64,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Cubic,
                oversampling_factor: 128,
                window: WindowFunction::Blackman2,
            };

            match SincFixedIn::<f32>::new(
                out_rate as f64 / in_rate as f64,
                2.0,
                sinc_params,
                chunk_size,
                1, // mono
            ) {
                Ok(resampler) => Some(resampler),
                Err(e) => {
                    tracing::warn!(
                        "Failed to build {}Hz -> {}Hz resampler, passing audio through: {}",
                        in_rate,
                        out_rate,
                        e
                    );
                    None
                }
            }
        };

        Self {
            in_rate,
            out_rate,
            resampler,
            input_buffer: Vec::with_capacity(chunk_size * 2),
            output_buffer: Vec::new(),
            chunk_size,
        }
    }

    /// Process an arbitrary chunk of mono i16 samples.
    /// Returns a freshly allocated Vec with resampled i16 at the output rate.
    pub fn process(&mut self, input: &[i16]) -> Vec<i16> {
        let Some(resampler) = self.resampler.as_mut() else {
            return input.to_vec();
        };

        for &sample in input {
            self.input_buffer.push(sample as f32 / 32768.0);
        }

        while self.input_buffer.len() >= self.chunk_size {
            let chunk: Vec<f32> = self.input_buffer.drain(..self.chunk_size).collect();
            let input_frames = vec![chunk];

            let output_frames = match resampler.process(&input_frames, None) {
                Ok(frames) => frames,
                Err(e) => {
                    tracing::warn!("Resampler error: {}", e);
                    return Vec::new();
                }
            };

            if let Some(channel) = output_frames.first() {
                self.output_buffer.extend_from_slice(channel);
            }
        }

        let result = self
            .output_buffer
            .iter()
            .map(|&sample| (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16)
            .collect();
        self.output_buffer.clear();
        result
    }

    pub fn reset(&mut self) {
        self.input_buffer.clear();
        self.output_buffer.clear();
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }
    }

    pub fn input_rate(&self) -> u32 {
        self.in_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.out_rate
    }
}
