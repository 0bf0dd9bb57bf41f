//! Speech-to-text abstraction layer for Parley
//!
//! Defines the engine contract consumed by the orchestrator, the transcript
//! type handed to the intent classifier, and the shared confidence heuristic.

use std::time::Duration;

use thiserror::Error;

pub mod confidence;
pub mod orchestrator;
pub mod types;
pub mod wake;

pub use confidence::length_confidence;
pub use orchestrator::RecognitionOrchestrator;
pub use types::{Recognition, Transcript};
pub use wake::WakeWordGate;

#[derive(Error, Debug)]
pub enum SttError {
    #[error("Audio subsystem error: {0}")]
    Audio(#[from] parley_foundation::AudioError),

    #[error("Recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Transcription request failed: {0}")]
    Request(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// A pluggable recognition backend.
///
/// One `attempt` is one bounded listen: the engine captures audio on its own
/// and returns whatever text it heard before `timeout` elapsed, scored with
/// the shared confidence heuristic. An empty text is a valid outcome (no
/// speech); errors cover device, decode, and transport failures.
#[async_trait::async_trait]
pub trait RecognitionEngine: Send {
    fn id(&self) -> &'static str;

    async fn attempt(&mut self, timeout: Duration) -> Result<Recognition, SttError>;
}
