use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::types::Transcript;
use crate::RecognitionEngine;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Tries recognition engines in priority order until one clears the
/// confidence threshold. Owns nothing beyond the engine list and the
/// threshold.
pub struct RecognitionOrchestrator {
    engines: Vec<Box<dyn RecognitionEngine>>,
    confidence_threshold: f32,
}

impl RecognitionOrchestrator {
    /// `engines` is the priority order: the offline streaming decoder first
    /// when present, then the networked transcriber.
    pub fn new(engines: Vec<Box<dyn RecognitionEngine>>) -> Self {
        Self {
            engines,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, confidence_threshold: f32) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// One recognition pass. Engines are invoked strictly in declared order,
    /// never concurrently; the first result with confidence strictly greater
    /// than the threshold wins. Engines that fail or hear nothing are
    /// skipped. `None` means no command was found, a normal outcome.
    pub async fn recognize(&mut self, timeout: Duration) -> Option<Transcript> {
        for engine in self.engines.iter_mut() {
            match engine.attempt(timeout).await {
                Ok(rec) if !rec.text.is_empty() && rec.confidence > self.confidence_threshold => {
                    debug!(
                        "Engine {} accepted: {:?} (confidence {:.2})",
                        engine.id(),
                        rec.text,
                        rec.confidence
                    );
                    return Some(Transcript {
                        text: rec.text,
                        confidence: rec.confidence,
                        engine_id: engine.id().to_string(),
                        timestamp: Utc::now(),
                    });
                }
                Ok(rec) => {
                    debug!(
                        "Engine {} below threshold (confidence {:.2}, {} chars)",
                        engine.id(),
                        rec.confidence,
                        rec.text.chars().count()
                    );
                }
                Err(e) => {
                    warn!("Recognition failed with {}: {}", engine.id(), e);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Recognition;
    use crate::SttError;

    struct ScriptedEngine {
        id: &'static str,
        result: Result<Recognition, SttError>,
        calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl RecognitionEngine for ScriptedEngine {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn attempt(&mut self, _timeout: Duration) -> Result<Recognition, SttError> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            match &self.result {
                Ok(rec) => Ok(rec.clone()),
                Err(_) => Err(SttError::Request("scripted failure".to_string())),
            }
        }
    }

    fn engine(
        id: &'static str,
        result: Result<Recognition, SttError>,
    ) -> (Box<dyn RecognitionEngine>, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        (
            Box::new(ScriptedEngine {
                id,
                result,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    #[tokio::test]
    async fn falls_through_to_higher_confidence_engine() {
        // First engine below threshold, second above: the second wins.
        let (low, _) = engine(
            "offline",
            Ok(Recognition {
                text: "short".to_string(),
                confidence: 0.1,
            }),
        );
        let (high, _) = engine(
            "remote",
            Ok(Recognition {
                text: "open the quarterly revenue dashboard".to_string(),
                confidence: 0.72,
            }),
        );

        let mut orch = RecognitionOrchestrator::new(vec![low, high]);
        let transcript = orch.recognize(Duration::from_secs(5)).await.unwrap();
        assert_eq!(transcript.engine_id, "remote");
        assert_eq!(transcript.text, "open the quarterly revenue dashboard");
    }

    #[tokio::test]
    async fn first_acceptable_engine_short_circuits() {
        let (first, _) = engine(
            "offline",
            Ok(Recognition {
                text: "show me all records in the database".to_string(),
                confidence: 0.72,
            }),
        );
        let (second, second_calls) = engine(
            "remote",
            Ok(Recognition {
                text: "never consulted".to_string(),
                confidence: 0.9,
            }),
        );

        let mut orch = RecognitionOrchestrator::new(vec![first, second]);
        let transcript = orch.recognize(Duration::from_secs(5)).await.unwrap();
        assert_eq!(transcript.engine_id, "offline");
        assert_eq!(second_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_engine_does_not_abort_the_sequence() {
        let (broken, _) = engine("offline", Err(SttError::Request("down".to_string())));
        let (working, _) = engine(
            "remote",
            Ok(Recognition {
                text: "what are the trends in monthly sales".to_string(),
                confidence: 0.72,
            }),
        );

        let mut orch = RecognitionOrchestrator::new(vec![broken, working]);
        let transcript = orch.recognize(Duration::from_secs(5)).await.unwrap();
        assert_eq!(transcript.engine_id, "remote");
    }

    #[tokio::test]
    async fn exactly_threshold_confidence_is_rejected() {
        let text = "a".repeat(35); // length heuristic scores exactly 0.7
        let (borderline, _) = engine("offline", Ok(Recognition::from_text(text)));

        let mut orch = RecognitionOrchestrator::new(vec![borderline]);
        assert!(orch.recognize(Duration::from_secs(5)).await.is_none());
    }

    #[tokio::test]
    async fn no_acceptable_result_is_none() {
        let (silent, _) = engine("offline", Ok(Recognition::empty()));
        let (broken, _) = engine("remote", Err(SttError::Request("down".to_string())));

        let mut orch = RecognitionOrchestrator::new(vec![silent, broken]);
        assert!(orch.recognize(Duration::from_secs(5)).await.is_none());
    }
}
