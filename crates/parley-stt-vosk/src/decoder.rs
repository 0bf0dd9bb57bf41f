use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use vosk::{CompleteResult, DecodingState, Model, Recognizer};

use parley_audio::{start_capture, CaptureConfig, FrameReader};
use parley_stt::{Recognition, RecognitionEngine, SttError};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Frame-by-frame offline decoder.
///
/// The model is loaded once at construction; construction failure disables
/// this engine for the whole session. Each attempt opens its own capture
/// stream and a fresh `Recognizer`.
pub struct VoskDecoder {
    model: Model,
    capture_config: CaptureConfig,
    device_name: Option<String>,
}

impl VoskDecoder {
    pub fn new(model_path: &str) -> Result<Self, SttError> {
        if !Path::new(model_path).exists() {
            return Err(SttError::EngineUnavailable(format!(
                "Vosk model not found at '{}'",
                model_path
            )));
        }

        let model = Model::new(model_path).ok_or_else(|| {
            SttError::EngineUnavailable(format!("Failed to load Vosk model from: {}", model_path))
        })?;

        Ok(Self {
            model,
            capture_config: CaptureConfig::default(),
            device_name: None,
        })
    }

    pub fn with_device(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for VoskDecoder {
    fn id(&self) -> &'static str {
        "vosk"
    }

    async fn attempt(&mut self, timeout: Duration) -> Result<Recognition, SttError> {
        let sample_rate = self.capture_config.sample_rate as f32;
        let mut recognizer = Recognizer::new(&self.model, sample_rate)
            .ok_or_else(|| SttError::Decode("Failed to create Vosk recognizer".to_string()))?;
        recognizer.set_words(true);

        let (capture, mut reader) =
            start_capture(self.capture_config.clone(), self.device_name.as_deref())?;

        let result = decode_utterance(&mut recognizer, &mut reader, timeout).await;
        capture.stop();

        let text = result?;
        if text.is_empty() {
            warn!("Vosk heard no speech within {:?}", timeout);
        }
        Ok(Recognition::from_text(text))
    }
}

/// Poll the frame queue until the decoder finalizes a non-empty utterance or
/// the deadline passes.
async fn decode_utterance(
    recognizer: &mut Recognizer,
    reader: &mut FrameReader,
    timeout: Duration,
) -> Result<String, SttError> {
    let deadline = Instant::now() + timeout;
    let mut text = String::new();

    while Instant::now() < deadline {
        match reader.read_frame() {
            Some(frame) => {
                let state = recognizer.accept_waveform(&frame).map_err(|e| {
                    SttError::Decode(format!("Vosk waveform acceptance failed: {:?}", e))
                })?;
                if matches!(state, DecodingState::Finalized) {
                    if let Some(t) = complete_text(recognizer.result()) {
                        text = t;
                        break;
                    }
                }
            }
            None => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }

    if text.is_empty() {
        // Deadline passed mid-utterance: force a finalize and use whatever
        // partial text exists.
        if let Some(t) = complete_text(recognizer.final_result()) {
            debug!("Vosk forced finalize yielded: {:?}", t);
            text = t;
        }
    }

    Ok(text)
}

fn complete_text(result: CompleteResult) -> Option<String> {
    match result {
        CompleteResult::Single(single) => {
            let text = single.text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        CompleteResult::Multiple(multiple) => multiple.alternatives.first().and_then(|first| {
            let text = first.text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }),
    }
}
