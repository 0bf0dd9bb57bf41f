//! Record-then-send recognition backend.
//!
//! One attempt is one bounded listen: capture an utterance (endpointed by
//! trailing silence), encode it as WAV in memory, and POST it to a
//! Whisper-compatible transcription endpoint.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use parley_audio::{start_capture, CaptureConfig, SilenceDetector};
use parley_stt::{Recognition, RecognitionEngine, SttError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Trailing silence that ends an utterance.
const PAUSE_THRESHOLD: Duration = Duration::from_millis(800);
/// Maximum phrase length once speech has started.
const PHRASE_TIME_LIMIT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SILENCE_THRESHOLD: i16 = 500;

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Whisper-compatible transcription endpoint.
    pub endpoint: String,
    /// Bearer token; empty disables the Authorization header.
    pub api_key: String,
    pub model: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            api_key: String::new(),
            model: "whisper-1".to_string(),
        }
    }
}

#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct UtteranceTranscriber {
    client: reqwest::Client,
    config: RemoteConfig,
    capture_config: CaptureConfig,
    device_name: Option<String>,
}

impl UtteranceTranscriber {
    pub fn new(config: RemoteConfig) -> Result<Self, SttError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SttError::EngineUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            config,
            capture_config: CaptureConfig::default(),
            device_name: None,
        })
    }

    pub fn with_device(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }

    /// Capture one utterance. Returns an empty buffer when nothing above the
    /// silence threshold was heard before the deadline.
    async fn record_utterance(&self, timeout: Duration) -> Result<Vec<i16>, SttError> {
        let (capture, mut reader) =
            start_capture(self.capture_config.clone(), self.device_name.as_deref())?;

        let mut detector = SilenceDetector::new(SILENCE_THRESHOLD);
        let mut samples: Vec<i16> = Vec::new();
        let wait_deadline = Instant::now() + timeout;
        let mut phrase_start: Option<Instant> = None;

        loop {
            let now = Instant::now();
            let expired = match phrase_start {
                None => now >= wait_deadline,
                Some(started) => now.duration_since(started) >= PHRASE_TIME_LIMIT,
            };
            if expired {
                break;
            }

            match reader.read_frame() {
                Some(frame) => {
                    let silent = detector.is_silence(&frame);
                    if !silent && phrase_start.is_none() {
                        phrase_start = Some(Instant::now());
                    }
                    if phrase_start.is_some() {
                        samples.extend_from_slice(&frame);
                        if silent && detector.silence_duration() >= PAUSE_THRESHOLD {
                            break;
                        }
                    }
                }
                None => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }

        capture.stop();

        if !detector.heard_speech() {
            samples.clear();
        }
        Ok(samples)
    }

    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, SttError> {
        debug!(
            "Uploading {} byte utterance to {}",
            wav.len(),
            self.config.endpoint
        );

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());

        let mut request = self.client.post(&self.config.endpoint).multipart(form);
        if !self.config.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SttError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SttError::Request(format!(
                "Transcription API error {}: {}",
                status, body
            )));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SttError::Request(e.to_string()))?;
        Ok(result.text.trim().to_string())
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for UtteranceTranscriber {
    fn id(&self) -> &'static str {
        "remote"
    }

    async fn attempt(&mut self, timeout: Duration) -> Result<Recognition, SttError> {
        let samples = self.record_utterance(timeout).await?;
        if samples.is_empty() {
            warn!("No speech detected within {:?}", timeout);
            return Ok(Recognition::empty());
        }

        let wav = encode_wav(&samples, self.capture_config.sample_rate)?;
        let text = self.transcribe(wav).await?;
        Ok(Recognition::from_text(text))
    }
}

/// Encode mono 16-bit PCM as an in-memory WAV file.
fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, SttError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| SttError::Decode(e.to_string()))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| SttError::Decode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| SttError::Decode(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_round_trips_through_hound() {
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16).collect();
        let wav = encode_wav(&samples, 16_000).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn default_config_targets_whisper() {
        let config = RemoteConfig::default();
        assert!(config.endpoint.contains("audio/transcriptions"));
        assert_eq!(config.model, "whisper-1");
    }
}
