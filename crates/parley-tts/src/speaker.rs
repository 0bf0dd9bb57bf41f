use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::SpeechSink;

static SENTENCE_PAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])\s+").unwrap());
static CONJUNCTION_PAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(but|however|therefore|meanwhile)\s+").unwrap());

/// Insert pauses after sentence punctuation and around contrasting
/// conjunctions so synthesized speech is easier to follow.
pub fn add_speech_pauses(text: &str) -> String {
    let text = SENTENCE_PAUSE.replace_all(text, "$1... ");
    CONJUNCTION_PAUSE
        .replace_all(&text, "... $1... ")
        .into_owned()
}

/// espeak-backed speech sink.
///
/// Construction never fails: when neither `espeak` nor `espeak-ng` is
/// installed the speaker runs in print-fallback mode.
pub struct EspeakSpeaker {
    command: Option<String>,
    rate: u32,
    volume: f32,
    current: Mutex<Option<Child>>,
}

impl EspeakSpeaker {
    pub async fn new(rate: u32, volume: f32) -> Self {
        let command = detect_command().await;
        match &command {
            Some(cmd) => debug!("Speech synthesis via {}", cmd),
            None => warn!("eSpeak not found; speech output falls back to stdout"),
        }

        Self {
            command,
            rate,
            volume,
            current: Mutex::new(None),
        }
    }

    fn build_args(&self, text: &str) -> Vec<String> {
        let amplitude = ((self.volume * 200.0) as u32).min(200);
        vec![
            "-s".to_string(),
            self.rate.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            text.to_string(),
        ]
    }

    /// Wait for the current child to exit, polling so a concurrent `stop`
    /// can take the handle and kill it.
    async fn wait_for_playback(&self, text: &str) {
        loop {
            {
                let mut guard = self.current.lock().await;
                let Some(child) = guard.as_mut() else {
                    return; // stopped from elsewhere
                };
                match child.try_wait() {
                    Ok(Some(status)) => {
                        *guard = None;
                        if !status.success() {
                            error!("Speech synthesis exited with {}", status);
                            println!("Speech output: {}", text);
                        }
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("Error in text-to-speech: {}", e);
                        *guard = None;
                        println!("Speech output: {}", text);
                        return;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

#[async_trait::async_trait]
impl SpeechSink for EspeakSpeaker {
    async fn speak(&self, text: &str, priority: bool) {
        if priority {
            self.stop().await;
        }

        let Some(cmd) = &self.command else {
            println!("Speech output: {}", text);
            return;
        };

        let spoken = add_speech_pauses(text);
        match Command::new(cmd).args(self.build_args(&spoken)).spawn() {
            Ok(child) => {
                *self.current.lock().await = Some(child);
                self.wait_for_playback(text).await;
            }
            Err(e) => {
                error!("Error in text-to-speech: {}", e);
                println!("Speech output: {}", text);
            }
        }
    }

    async fn stop(&self) {
        let mut guard = self.current.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.start_kill();
        }
    }
}

async fn detect_command() -> Option<String> {
    for candidate in ["espeak", "espeak-ng"] {
        if Command::new(candidate)
            .arg("--version")
            .output()
            .await
            .is_ok()
        {
            return Some(candidate.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pauses_follow_sentence_punctuation() {
        assert_eq!(
            add_speech_pauses("Done. Next item"),
            "Done.... Next item"
        );
        assert_eq!(
            add_speech_pauses("Really? Yes! Good."),
            "Really?... Yes!... Good."
        );
    }

    #[test]
    fn pauses_surround_conjunctions() {
        assert_eq!(
            add_speech_pauses("I tried but it failed"),
            "I tried... but... it failed"
        );
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(add_speech_pauses("hello there"), "hello there");
    }

    #[tokio::test]
    async fn args_carry_rate_and_amplitude() {
        let speaker = EspeakSpeaker {
            command: Some("espeak".to_string()),
            rate: 160,
            volume: 0.9,
            current: Mutex::new(None),
        };
        let args = speaker.build_args("hi");
        assert_eq!(args, vec!["-s", "160", "-a", "180", "hi"]);
    }
}
