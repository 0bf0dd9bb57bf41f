use std::time::{Duration, Instant};

/// RMS-threshold silence detector used for utterance endpointing.
#[derive(Clone)]
pub struct SilenceDetector {
    threshold: i16,
    silence_start: Option<Instant>,
    heard_speech: bool,
}

impl SilenceDetector {
    pub fn new(threshold: i16) -> Self {
        Self {
            threshold,
            silence_start: None,
            heard_speech: false,
        }
    }

    pub fn is_silence(&mut self, samples: &[i16]) -> bool {
        if samples.is_empty() {
            return true;
        }

        let sum: i64 = samples.iter().map(|&s| s as i64 * s as i64).sum();
        let rms = ((sum / samples.len() as i64) as f64).sqrt() as i16;

        tracing::trace!("SilenceDetector: RMS={}, threshold={}", rms, self.threshold);

        if rms < self.threshold {
            if self.silence_start.is_none() {
                self.silence_start = Some(Instant::now());
            }
            true
        } else {
            self.silence_start = None;
            self.heard_speech = true;
            false
        }
    }

    /// Duration of the current trailing silence.
    pub fn silence_duration(&self) -> Duration {
        self.silence_start
            .map(|start| Instant::now().duration_since(start))
            .unwrap_or(Duration::ZERO)
    }

    /// Whether any frame above the threshold has been seen since the last reset.
    pub fn heard_speech(&self) -> bool {
        self.heard_speech
    }

    pub fn reset(&mut self) {
        self.silence_start = None;
        self.heard_speech = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_frames_are_silence() {
        let mut det = SilenceDetector::new(100);
        assert!(det.is_silence(&[0i16; 160]));
        assert!(!det.heard_speech());
    }

    #[test]
    fn loud_frames_mark_speech() {
        let mut det = SilenceDetector::new(100);
        assert!(!det.is_silence(&[5000i16; 160]));
        assert!(det.heard_speech());
        assert_eq!(det.silence_duration(), Duration::ZERO);
    }

    #[test]
    fn trailing_silence_accumulates_after_speech() {
        let mut det = SilenceDetector::new(100);
        det.is_silence(&[5000i16; 160]);
        det.is_silence(&[0i16; 160]);
        std::thread::sleep(Duration::from_millis(20));
        assert!(det.silence_duration() >= Duration::from_millis(20));
    }
}
