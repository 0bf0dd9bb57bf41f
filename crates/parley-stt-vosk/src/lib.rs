//! Offline streaming recognition backend built on Vosk.

#[cfg(feature = "vosk")]
mod decoder;

#[cfg(feature = "vosk")]
pub use decoder::VoskDecoder;

/// Default model location, overridable via `VOSK_MODEL_PATH`.
pub fn default_model_path() -> String {
    std::env::var("VOSK_MODEL_PATH")
        .unwrap_or_else(|_| "models/vosk-model-small-en-us-0.15".to_string())
}
