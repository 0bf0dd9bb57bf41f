use std::time::Duration;

use tracing::debug;

use crate::RecognitionEngine;

const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Wake-word gate: a single bounded listen-and-match step.
///
/// This is a one-shot operation, not continuous detection. The gate owns a
/// dedicated engine so its bounded listens never disturb the orchestrator's
/// command engines.
pub struct WakeWordGate {
    engine: Box<dyn RecognitionEngine>,
    phrase: String,
    listen_timeout: Duration,
}

impl WakeWordGate {
    pub fn new(engine: Box<dyn RecognitionEngine>, phrase: impl Into<String>) -> Self {
        Self {
            engine,
            phrase: phrase.into(),
            listen_timeout: DEFAULT_LISTEN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, listen_timeout: Duration) -> Self {
        self.listen_timeout = listen_timeout;
        self
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn set_phrase(&mut self, phrase: impl Into<String>) {
        self.phrase = phrase.into();
    }

    /// Listen once and report whether the wake phrase was heard.
    ///
    /// Activation means the configured phrase is a substring of the
    /// lower-cased transcript. Recognition failures of any kind yield "not
    /// activated", never an error.
    pub async fn detect(&mut self) -> bool {
        match self.engine.attempt(self.listen_timeout).await {
            Ok(rec) => {
                let heard = rec.text.to_lowercase();
                let activated = heard.contains(&self.phrase.to_lowercase());
                if activated {
                    debug!("Wake word {:?} detected in {:?}", self.phrase, rec.text);
                }
                activated
            }
            Err(e) => {
                debug!("Wake word listen failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Recognition;
    use crate::SttError;

    struct FixedEngine(Result<&'static str, ()>);

    #[async_trait::async_trait]
    impl RecognitionEngine for FixedEngine {
        fn id(&self) -> &'static str {
            "fixed"
        }

        async fn attempt(&mut self, _timeout: Duration) -> Result<Recognition, SttError> {
            match self.0 {
                Ok(text) => Ok(Recognition::from_text(text)),
                Err(()) => Err(SttError::Request("unreachable".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn phrase_substring_activates() {
        let mut gate = WakeWordGate::new(
            Box::new(FixedEngine(Ok("Hey Assistant, are you there"))),
            "hey assistant",
        );
        assert!(gate.detect().await);
    }

    #[tokio::test]
    async fn unrelated_speech_does_not_activate() {
        let mut gate = WakeWordGate::new(
            Box::new(FixedEngine(Ok("hello world"))),
            "hey assistant",
        );
        assert!(!gate.detect().await);
    }

    #[tokio::test]
    async fn recognition_failure_is_not_activated() {
        let mut gate = WakeWordGate::new(Box::new(FixedEngine(Err(()))), "hey assistant");
        assert!(!gate.detect().await);
    }

    #[tokio::test]
    async fn phrase_can_be_replaced() {
        let mut gate = WakeWordGate::new(Box::new(FixedEngine(Ok("okay computer"))), "hey assistant");
        assert!(!gate.detect().await);
        gate.set_phrase("okay computer");
        assert!(gate.detect().await);
    }
}
