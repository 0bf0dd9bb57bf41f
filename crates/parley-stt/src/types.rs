use chrono::{DateTime, Utc};

use crate::confidence::length_confidence;

/// Raw outcome of a single engine attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    pub confidence: f32,
}

impl Recognition {
    /// No speech heard. Scored 0.0, skipped by the orchestrator.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
        }
    }

    /// Score recognized text with the shared length heuristic.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let confidence = length_confidence(&text);
        Self { text, confidence }
    }
}

/// An accepted recognition result. Produced only by the orchestrator once an
/// engine clears the confidence threshold; immutable from then on.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
    pub engine_id: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_recognition_scores_zero() {
        let rec = Recognition::empty();
        assert!(rec.text.is_empty());
        assert_eq!(rec.confidence, 0.0);
    }

    #[test]
    fn from_text_applies_length_heuristic() {
        let rec = Recognition::from_text("show me the sales table");
        assert!((rec.confidence - 23.0 / 50.0).abs() < 1e-6);
    }
}
