use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use parley_foundation::{AppError, AssistantState, Preferences, StateManager};
use parley_intent::{ActionDispatcher, IntentClassifier, Launcher, Response};
use parley_stt::{RecognitionOrchestrator, WakeWordGate};
use parley_tts::SpeechSink;

/// Case-insensitive substrings that end conversation mode.
pub const STOP_PHRASES: [&str; 2] = ["stop listening", "exit"];

const ACK_PAUSE: Duration = Duration::from_millis(500);
const RETRY_PAUSE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub prefs_path: PathBuf,
    /// Wall-clock deadline for each listen attempt in conversation mode.
    pub listen_timeout: Duration,
    pub use_wake_word: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prefs_path: PathBuf::from("user_preferences.json"),
            listen_timeout: Duration::from_secs(30),
            use_wake_word: true,
        }
    }
}

/// One completed exchange. Never appended to history until both sides are
/// populated.
#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub assistant: String,
}

/// Rolling context from the most recent processed command.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub last_command: Option<String>,
    pub last_intent: Option<String>,
    pub last_action: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Cooperative stop signal for a running conversation loop.
#[derive(Clone)]
pub struct SessionStopHandle {
    listening: Arc<AtomicBool>,
}

impl SessionStopHandle {
    pub fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }
}

/// The conversation session: owns the assistant state machine, history,
/// context, and preferences for its lifetime, and coordinates the
/// listen -> classify -> dispatch -> speak cycle.
///
/// Constructed explicitly and passed to callers; there is no process-wide
/// instance.
pub struct ConversationSession {
    config: SessionConfig,
    state: StateManager,
    history: Vec<ConversationEntry>,
    context: SessionContext,
    prefs: Preferences,
    classifier: IntentClassifier,
    dispatcher: ActionDispatcher,
    orchestrator: RecognitionOrchestrator,
    wake_gate: Option<WakeWordGate>,
    speaker: Arc<dyn SpeechSink>,
    listening: Arc<AtomicBool>,
}

impl ConversationSession {
    pub fn new(
        config: SessionConfig,
        orchestrator: RecognitionOrchestrator,
        wake_gate: Option<WakeWordGate>,
        speaker: Arc<dyn SpeechSink>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        let prefs = Preferences::load(&config.prefs_path);

        let mut wake_gate = wake_gate;
        if let Some(gate) = wake_gate.as_mut() {
            gate.set_phrase(&prefs.wake_word);
        }

        Self {
            config,
            state: StateManager::new(),
            history: Vec::new(),
            context: SessionContext::default(),
            prefs,
            classifier: IntentClassifier::new(),
            dispatcher: ActionDispatcher::new(launcher),
            orchestrator,
            wake_gate,
            speaker,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> AssistantState {
        self.state.current()
    }

    /// Read-only view of the conversation history.
    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.config.prefs_path.clone()
    }

    pub fn stop_handle(&self) -> SessionStopHandle {
        SessionStopHandle {
            listening: self.listening.clone(),
        }
    }

    /// Process a command as text, with no audio involved.
    ///
    /// Classifies, dispatches, appends the completed exchange to history,
    /// and updates the rolling context. Always returns a fully formed
    /// response.
    pub fn process_command(&mut self, command: &str) -> Response {
        let intent = self.classifier.classify(command);
        let response = self.dispatcher.dispatch(&intent, command);

        // Both sides of the exchange exist now; only then does it enter
        // history.
        self.history.push(ConversationEntry {
            timestamp: Utc::now(),
            user: command.to_string(),
            assistant: response.response_text.clone(),
        });

        self.context = SessionContext {
            last_command: Some(command.to_string()),
            last_intent: Some(intent.category.as_str().to_string()),
            last_action: Some(response.action.clone()),
            timestamp: Some(Utc::now()),
        };

        response
    }

    /// One wake-gated recognition pass.
    ///
    /// With the wake word enabled, a bounded wake listen runs first; no
    /// activation means no command. Deadline expiry with nothing accepted is
    /// a normal `(None, 0.0)` outcome, not a failure.
    pub async fn listen_for_command(
        &mut self,
        timeout: Duration,
        use_wake_word: bool,
    ) -> (Option<String>, f32) {
        if use_wake_word {
            if self.wake_gate.is_none() {
                warn!("Wake word requested but no wake engine is available");
                return (None, 0.0);
            }
            self.enter_or_log(AssistantState::ListeningForWake);
            let activated = match self.wake_gate.as_mut() {
                Some(gate) => gate.detect().await,
                None => false,
            };
            if !activated {
                return (None, 0.0);
            }
            self.speaker
                .speak("I'm listening. How can I help you?", false)
                .await;
            tokio::time::sleep(ACK_PAUSE).await;
        }

        self.enter_or_log(AssistantState::ListeningForCommand);
        match self.orchestrator.recognize(timeout).await {
            Some(transcript) => (Some(transcript.text), transcript.confidence),
            None => (None, 0.0),
        }
    }

    /// Change the wake word, persist it, and confirm aloud. Persistence
    /// failure is logged and otherwise ignored.
    pub async fn set_wake_word(&mut self, new_word: &str) {
        self.prefs.wake_word = new_word.to_string();
        if let Some(gate) = self.wake_gate.as_mut() {
            gate.set_phrase(new_word);
        }
        if let Err(e) = self.prefs.save(&self.config.prefs_path) {
            warn!("Failed to save preferences: {}", e);
        }
        self.speaker
            .speak(&format!("Wake word changed to: {}", new_word), false)
            .await;
    }

    /// Blocking conversation loop. Runs until a stop phrase is heard, the
    /// stop handle fires, or Ctrl-C is received. The session survives any
    /// iteration error with a spoken apology.
    pub async fn start_conversation_mode(&mut self) {
        self.listening.store(true, Ordering::SeqCst);
        self.enter_or_log(AssistantState::ListeningForWake);

        let greeting = format!(
            "I'm now in conversation mode. Say '{}' to talk to me, or 'Stop listening' to exit.",
            self.prefs.wake_word
        );
        self.speaker.speak(&greeting, false).await;

        while self.listening.load(Ordering::SeqCst) {
            // The interrupt arm wins over a mid-flight iteration; the
            // iteration future is dropped before the handler runs.
            let outcome = tokio::select! {
                finished = self.run_iteration() => Some(finished),
                _ = tokio::signal::ctrl_c() => None,
            };

            match outcome {
                Some(Ok(true)) => break,
                Some(Ok(false)) => {}
                Some(Err(e)) => {
                    error!("Error in conversation mode: {}", e);
                    self.speaker
                        .speak("I encountered an error. Let me try to continue listening.", false)
                        .await;
                    self.state.force_idle();
                    self.enter_or_log(AssistantState::ListeningForWake);
                }
                None => {
                    info!("Interrupt received; leaving conversation mode");
                    self.speaker
                        .speak("Goodbye! I'm stopping conversation mode.", true)
                        .await;
                    break;
                }
            }
        }

        self.listening.store(false, Ordering::SeqCst);
        self.state.force_idle();
    }

    /// One loop iteration. `Ok(true)` means a stop phrase ended the session.
    async fn run_iteration(&mut self) -> Result<bool, AppError> {
        let (command, _confidence) = self
            .listen_for_command(self.config.listen_timeout, self.config.use_wake_word)
            .await;

        let Some(command) = command else {
            // No command inside the window; listen again after a short
            // pause. The pause also bounds the loop when no engine is
            // configured and every listen returns immediately.
            self.enter(AssistantState::ListeningForWake)?;
            tokio::time::sleep(RETRY_PAUSE).await;
            return Ok(false);
        };

        let lowered = command.to_lowercase();
        if STOP_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
            self.speaker
                .speak("Goodbye! I'm stopping conversation mode.", false)
                .await;
            return Ok(true);
        }

        self.enter(AssistantState::Processing)?;
        let response = self.process_command(&command);

        self.enter(AssistantState::Speaking)?;
        self.speaker.speak(&response.response_text, false).await;

        self.enter(AssistantState::ListeningForWake)?;
        tokio::time::sleep(ACK_PAUSE).await;
        Ok(false)
    }

    /// Apply a state transition; staying in the current state is a no-op.
    fn enter(&self, target: AssistantState) -> Result<(), AppError> {
        if self.state.current() == target {
            return Ok(());
        }
        self.state.transition(target)
    }

    /// Transition on a path with no error channel; violations are logged.
    fn enter_or_log(&self, target: AssistantState) {
        if let Err(e) = self.enter(target) {
            warn!("{}", e);
        }
    }
}
