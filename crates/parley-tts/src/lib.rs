//! Text-to-speech sink for Parley
//!
//! The pipeline treats speech output as a fire-and-confirm sink: `speak`
//! plays synchronously and never reports failure to the caller. When
//! synthesis is unavailable the text is printed instead, so user-facing
//! feedback is never lost.

mod speaker;

pub use speaker::{add_speech_pauses, EspeakSpeaker};

/// Speech output sink.
#[async_trait::async_trait]
pub trait SpeechSink: Send + Sync {
    /// Speak `text`, returning once playback finishes. `priority` stops any
    /// in-progress playback first (last-write-wins).
    async fn speak(&self, text: &str, priority: bool);

    /// Stop in-progress playback, if any.
    async fn stop(&self);
}
