//! User preference persistence.
//!
//! Preferences are a small JSON key-value file loaded once at session start
//! and rewritten on explicit update calls. Load and save failures are
//! non-fatal: the session runs on defaults and simply does not persist.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub wake_word: String,
    /// Speech rate in words per minute.
    pub speech_rate: u32,
    /// Playback volume in [0.0, 1.0].
    pub speech_volume: f32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            wake_word: "hey assistant".to_string(),
            speech_rate: 160,
            speech_volume: 0.9,
        }
    }
}

impl Preferences {
    /// Load preferences from `path`, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!("Failed to parse preferences at {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!("Failed to read preferences at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Write preferences to `path`. Callers treat failure as non-fatal.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let contents = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_assistant() {
        let prefs = Preferences::default();
        assert_eq!(prefs.wake_word, "hey assistant");
        assert_eq!(prefs.speech_rate, 160);
        assert!((prefs.speech_volume - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_preferences.json");

        let mut prefs = Preferences::default();
        prefs.wake_word = "hey parley".to_string();
        prefs.speech_rate = 180;
        prefs.save(&path).unwrap();

        assert_eq!(Preferences::load(&path), prefs);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert_eq!(Preferences::load(&path), Preferences::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_preferences.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Preferences::load(&path), Preferences::default());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_preferences.json");
        std::fs::write(&path, r#"{"wake_word": "computer"}"#).unwrap();

        let prefs = Preferences::load(&path);
        assert_eq!(prefs.wake_word, "computer");
        assert_eq!(prefs.speech_rate, 160);
    }
}
