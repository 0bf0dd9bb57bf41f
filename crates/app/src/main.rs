use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use parley_app::session::{ConversationSession, SessionConfig};
use parley_foundation::Preferences;
use parley_intent::PlatformLauncher;
use parley_stt::{RecognitionEngine, RecognitionOrchestrator, WakeWordGate};
use parley_stt_remote::{RemoteConfig, UtteranceTranscriber};
use parley_tts::EspeakSpeaker;

#[derive(Parser)]
#[command(name = "parley", about = "Wake-word gated voice-command assistant", version)]
struct Cli {
    /// Preference file location.
    #[arg(long, default_value = "user_preferences.json")]
    prefs: PathBuf,

    /// Vosk model directory for the offline decoder.
    #[arg(long, env = "VOSK_MODEL_PATH")]
    model: Option<String>,

    /// Whisper-compatible transcription endpoint for the remote engine.
    #[arg(long, env = "PARLEY_STT_ENDPOINT")]
    stt_endpoint: Option<String>,

    /// API key for the transcription endpoint.
    #[arg(long, env = "PARLEY_STT_API_KEY")]
    stt_api_key: Option<String>,

    /// Input device name; the host default is used when omitted.
    #[arg(long)]
    device: Option<String>,

    /// Per-attempt listen deadline, in seconds.
    #[arg(long, default_value_t = 30)]
    listen_timeout: u64,

    /// Listen for commands directly, without wake-word gating.
    #[arg(long)]
    no_wake_word: bool,

    /// Recognition confidence threshold.
    #[arg(long, default_value_t = 0.7)]
    confidence_threshold: f32,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive conversation loop (the default).
    Converse,
    /// Process a single text command, no audio involved.
    Process { text: String },
    /// Persist a new wake word.
    SetWakeWord { phrase: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut session = build_session(&cli).await;

    match cli.command.unwrap_or(Command::Converse) {
        Command::Converse => {
            session.start_conversation_mode().await;
        }
        Command::Process { text } => {
            let response = session.process_command(&text);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::SetWakeWord { phrase } => {
            session.set_wake_word(&phrase).await;
        }
    }

    Ok(())
}

async fn build_session(cli: &Cli) -> ConversationSession {
    // The speaker needs the persisted rate and volume before the session
    // owns the preference file.
    let prefs = Preferences::load(&cli.prefs);
    let speaker = Arc::new(EspeakSpeaker::new(prefs.speech_rate, prefs.speech_volume).await);
    let launcher = Arc::new(PlatformLauncher::detect());

    let engines = build_engines(cli);
    if engines.is_empty() {
        warn!("No recognition engines available; voice commands are disabled");
    }
    let orchestrator =
        RecognitionOrchestrator::new(engines).with_threshold(cli.confidence_threshold);

    let wake_gate = build_wake_engine(cli).map(|engine| WakeWordGate::new(engine, ""));
    if wake_gate.is_none() {
        warn!("No wake engine available; wake-word gating is disabled");
    }

    let config = SessionConfig {
        prefs_path: cli.prefs.clone(),
        listen_timeout: Duration::from_secs(cli.listen_timeout),
        use_wake_word: !cli.no_wake_word && wake_gate.is_some(),
    };

    ConversationSession::new(config, orchestrator, wake_gate, speaker, launcher)
}

/// Assemble the engine priority list: the offline streaming decoder first
/// when its model loads, then the networked transcriber. An engine that
/// fails construction is dropped for the whole session, not retried.
fn build_engines(cli: &Cli) -> Vec<Box<dyn RecognitionEngine>> {
    let mut engines: Vec<Box<dyn RecognitionEngine>> = Vec::new();

    #[cfg(feature = "vosk")]
    match build_offline_decoder(cli) {
        Ok(decoder) => engines.push(decoder),
        Err(e) => warn!("Offline decoder disabled: {}", e),
    }

    match remote_config(cli) {
        Some(config) => match UtteranceTranscriber::new(config) {
            Ok(remote) => {
                let remote = match &cli.device {
                    Some(d) => remote.with_device(d.clone()),
                    None => remote,
                };
                info!("Remote transcriber ready");
                engines.push(Box::new(remote));
            }
            Err(e) => warn!("Remote transcriber disabled: {}", e),
        },
        None => info!("Remote transcriber not configured"),
    }

    engines
}

#[cfg(feature = "vosk")]
fn build_offline_decoder(cli: &Cli) -> Result<Box<dyn RecognitionEngine>, parley_stt::SttError> {
    let model_path = cli
        .model
        .clone()
        .unwrap_or_else(parley_stt_vosk::default_model_path);
    let decoder = parley_stt_vosk::VoskDecoder::new(&model_path)?;
    let decoder = match &cli.device {
        Some(d) => decoder.with_device(d.clone()),
        None => decoder,
    };
    info!("Offline decoder ready (model: {})", model_path);
    Ok(Box::new(decoder))
}

/// The wake gate listens on its own engine so bounded wake listens never
/// disturb the command engines: the networked transcriber when configured,
/// else a second offline decoder.
fn build_wake_engine(cli: &Cli) -> Option<Box<dyn RecognitionEngine>> {
    if let Some(config) = remote_config(cli) {
        if let Ok(remote) = UtteranceTranscriber::new(config) {
            let remote = match &cli.device {
                Some(d) => remote.with_device(d.clone()),
                None => remote,
            };
            return Some(Box::new(remote));
        }
    }

    #[cfg(feature = "vosk")]
    if let Ok(decoder) = build_offline_decoder(cli) {
        return Some(decoder);
    }

    None
}

fn remote_config(cli: &Cli) -> Option<RemoteConfig> {
    if cli.stt_endpoint.is_none() && cli.stt_api_key.is_none() {
        return None;
    }
    let mut config = RemoteConfig::default();
    if let Some(endpoint) = &cli.stt_endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(key) = &cli.stt_api_key {
        config.api_key = key.clone();
    }
    Some(config)
}
