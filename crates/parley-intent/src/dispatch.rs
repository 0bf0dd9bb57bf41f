use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::actions::Launcher;
use crate::classifier::{Intent, IntentCategory};
use crate::response::Response;

// Extraction runs against the original-case transcript; only the case
// folding is in the pattern itself.
static APP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)open\s+(.+?)(?:\s|$)").unwrap(),
        Regex::new(r"(?i)launch\s+(.+?)(?:\s|$)").unwrap(),
        Regex::new(r"(?i)start\s+(.+?)(?:\s|$)").unwrap(),
    ]
});

// Non-greedy and anchored to the next whitespace: captures only the token
// immediately following the trigger word.
static SEARCH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)search\s+(?:for\s+)?(.+?)(?:\s|$)").unwrap(),
        Regex::new(r"(?i)find\s+(.+?)(?:\s|$)").unwrap(),
        Regex::new(r"(?i)look\s+up\s+(.+?)(?:\s|$)").unwrap(),
    ]
});

const HELP_TEXT: &str = "I'm your voice assistant! Here are some things I can help you with:

\u{2022} Database queries: \"Show me the data\", \"Analyze this table\"
\u{2022} Data analysis: \"Find trends\", \"Compare results\"
\u{2022} System commands: \"Open calculator\", \"Search for Python tutorials\"
\u{2022} General conversation: \"Hello\", \"How are you\"

Just say the wake word to wake me up, then tell me what you need!";

/// Routes a classified transcript to a handler.
///
/// Every handler is synchronous and infallible at this boundary: side-effect
/// failures are folded into failure responses, never propagated.
pub struct ActionDispatcher {
    launcher: Arc<dyn Launcher>,
}

impl ActionDispatcher {
    pub fn new(launcher: Arc<dyn Launcher>) -> Self {
        Self { launcher }
    }

    pub fn dispatch(&self, intent: &Intent, command: &str) -> Response {
        debug!("Dispatching {:?} for {:?}", intent.category, command);
        match intent.category {
            IntentCategory::DatabaseQuery => self.handle_database_query(command),
            IntentCategory::AnalysisRequest => self.handle_analysis_request(command),
            IntentCategory::SystemCommand => self.handle_system_command(command),
            IntentCategory::Conversation => self.handle_conversation(command),
            IntentCategory::Unknown => self.handle_unknown(command),
        }
    }

    fn handle_database_query(&self, command: &str) -> Response {
        Response::new(
            "database_query",
            format!(
                "I understand you want to query the database. I'll help you with: {}",
                command
            ),
            command,
        )
        .with_data("query_type", "database")
        .with_data("original_command", command)
    }

    fn handle_analysis_request(&self, command: &str) -> Response {
        Response::new(
            "analysis_request",
            format!(
                "I'll help you analyze the data. You're asking about: {}",
                command
            ),
            command,
        )
        .with_data("query_type", "analysis")
        .with_data("original_command", command)
    }

    /// Sub-routes by substring of the lower-cased transcript, in order.
    fn handle_system_command(&self, command: &str) -> Response {
        let lowered = command.to_lowercase();

        if lowered.contains("open") || lowered.contains("launch") {
            self.handle_app_launch(command)
        } else if lowered.contains("search") {
            self.handle_web_search(command)
        } else if lowered.contains("help") {
            self.handle_help(command)
        } else {
            Response::new(
                "system_command",
                format!("I'll help you with the system command: {}", command),
                command,
            )
            .with_data("query_type", "system")
        }
    }

    fn handle_app_launch(&self, command: &str) -> Response {
        let app_name = APP_PATTERNS
            .iter()
            .find_map(|p| p.captures(command))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());

        let Some(app_name) = app_name else {
            return Response::new(
                "unclear_command",
                "I didn't catch which application you want me to open. Could you please specify?",
                command,
            )
            .with_data("app_name", Value::Null);
        };

        match self.launcher.launch(&app_name) {
            Ok(()) => Response::new(
                "app_launched",
                format!("I'm launching {} for you.", app_name),
                command,
            )
            .with_data("app_name", app_name),
            Err(e) => Response::new(
                "app_launch_failed",
                format!("Sorry, I couldn't launch {}. Error: {}", app_name, e),
                command,
            )
            .with_data("app_name", app_name),
        }
    }

    fn handle_web_search(&self, command: &str) -> Response {
        let search_query = SEARCH_PATTERNS
            .iter()
            .find_map(|p| p.captures(command))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());

        let Some(search_query) = search_query else {
            return Response::new(
                "unclear_command",
                "I didn't catch what you want me to search for. Could you please specify?",
                command,
            )
            .with_data("search_query", Value::Null);
        };

        match self.launcher.open_url(&build_search_url(&search_query)) {
            Ok(()) => Response::new(
                "web_search",
                format!("I'm searching the web for: {}", search_query),
                command,
            )
            .with_data("search_query", search_query),
            Err(e) => Response::new(
                "web_search_failed",
                format!("Sorry, I couldn't perform the web search. Error: {}", e),
                command,
            )
            .with_data("search_query", search_query),
        }
    }

    fn handle_help(&self, command: &str) -> Response {
        Response::new("help_provided", HELP_TEXT, command).with_data("help_type", "general")
    }

    fn handle_conversation(&self, command: &str) -> Response {
        let lowered = command.to_lowercase();

        let response_text = if contains_any(&lowered, &["hello", "hi", "hey"]) {
            "Hello! I'm your voice assistant. How can I help you today?".to_string()
        } else if contains_any(&lowered, &["how are you", "how do you do"]) {
            "I'm doing well, thank you for asking! I'm ready to help you with any tasks."
                .to_string()
        } else if contains_any(&lowered, &["thank you", "thanks"]) {
            "You're welcome! I'm happy to help.".to_string()
        } else if contains_any(&lowered, &["goodbye", "bye", "see you"]) {
            "Goodbye! Feel free to call me again if you need anything.".to_string()
        } else {
            format!(
                "That's interesting! You said: {}. How can I assist you with that?",
                command
            )
        };

        Response::new("conversation", response_text, command)
            .with_data("conversation_type", "general")
    }

    fn handle_unknown(&self, command: &str) -> Response {
        Response::new(
            "unknown_command",
            format!(
                "I heard you say: {}. I'm not sure how to help with that yet, but I'm learning! \
                 Could you try rephrasing or ask me for help to see what I can do?",
                command
            ),
            command,
        )
        .with_data("query_type", "unknown")
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Google query URL with spaces replaced by `+`. No general percent-encoding
/// is applied.
fn build_search_url(query: &str) -> String {
    format!("https://www.google.com/search?q={}", query.replace(' ', "+"))
}
