use regex::Regex;
use tracing::debug;

/// Intent buckets, in classification precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentCategory {
    DatabaseQuery,
    AnalysisRequest,
    SystemCommand,
    Conversation,
    Unknown,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::DatabaseQuery => "database_query",
            IntentCategory::AnalysisRequest => "analysis_request",
            IntentCategory::SystemCommand => "system_command",
            IntentCategory::Conversation => "conversation",
            IntentCategory::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Intent {
    pub category: IntentCategory,
    pub matched_rule: Option<String>,
    pub confidence: f32,
}

const MATCH_CONFIDENCE: f32 = 0.8;
const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Ordered rule table mapping a transcript to an intent category.
///
/// The table is a literal ordered list, never a map: category order and
/// pattern order within a category are binding. The first (category,
/// pattern) pair that matches wins. An input matching both `database_query`
/// and `conversation` patterns resolves to `database_query` because it is
/// scanned first.
pub struct IntentClassifier {
    rules: Vec<(IntentCategory, Vec<Regex>)>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        let table: [(IntentCategory, &[&str]); 4] = [
            (
                IntentCategory::DatabaseQuery,
                &[
                    r"(show|display|get|find|search|query|analyze).*(data|table|database|records)",
                    r"(how many|what is|tell me about).*(in|from|of).*(table|database)",
                    r"(create|generate|write).*(sql|query).*(for|to)",
                    r"(explain|describe).*(table|schema|structure)",
                ],
            ),
            (
                IntentCategory::AnalysisRequest,
                &[
                    r"(analyze|examine|investigate).*(data|trends|patterns)",
                    r"(what are|show me|find).*(trends|patterns|insights)",
                    r"(compare|contrast|difference between)",
                    r"(statistics|summary|overview)",
                ],
            ),
            (
                IntentCategory::SystemCommand,
                &[
                    r"(open|launch|start)\s+\S+",
                    r"(search|find|look up).*(on|in|for)",
                    r"(set|change|modify).*(preference|setting)",
                    r"(help|assist|support)",
                ],
            ),
            (
                IntentCategory::Conversation,
                &[
                    r"(hello|hi|hey|good morning|good afternoon|good evening)",
                    r"(how are you|how do you do|what's up)",
                    r"(thank you|thanks|appreciate)",
                    r"(goodbye|bye|see you|farewell)",
                ],
            ),
        ];

        let rules = table
            .into_iter()
            .map(|(category, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p).expect("intent pattern must compile"))
                    .collect();
                (category, compiled)
            })
            .collect();

        Self { rules }
    }

    /// Classify a transcript. Scans categories, then patterns within a
    /// category, in declared order; first match wins at fixed confidence.
    /// No match falls back to `Conversation` at reduced confidence.
    pub fn classify(&self, transcript: &str) -> Intent {
        let lowered = transcript.to_lowercase();

        for (category, patterns) in &self.rules {
            for pattern in patterns {
                if pattern.is_match(&lowered) {
                    debug!("Matched {:?} via {:?}", category, pattern.as_str());
                    return Intent {
                        category: *category,
                        matched_rule: Some(pattern.as_str().to_string()),
                        confidence: MATCH_CONFIDENCE,
                    };
                }
            }
        }

        Intent {
            category: IntentCategory::Conversation,
            matched_rule: None,
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Intent {
        IntentClassifier::new().classify(text)
    }

    #[test]
    fn database_queries_classify() {
        for text in [
            "show me the data",
            "How many rows are in the users table",
            "write a sql query for monthly totals",
            "describe the orders table structure",
        ] {
            let intent = classify(text);
            assert_eq!(intent.category, IntentCategory::DatabaseQuery, "{}", text);
            assert_eq!(intent.confidence, 0.8);
            assert!(intent.matched_rule.is_some());
        }
    }

    #[test]
    fn analysis_requests_classify() {
        for text in ["examine the sales trends", "compare this quarter to last"] {
            assert_eq!(
                classify(text).category,
                IntentCategory::AnalysisRequest,
                "{}",
                text
            );
        }
    }

    #[test]
    fn system_commands_classify() {
        for text in ["Open calculator", "launch firefox", "search for rust on the web", "help"] {
            assert_eq!(
                classify(text).category,
                IntentCategory::SystemCommand,
                "{}",
                text
            );
        }
    }

    #[test]
    fn conversation_classifies() {
        for text in ["hello there", "thank you very much", "goodbye now"] {
            assert_eq!(classify(text).category, IntentCategory::Conversation, "{}", text);
        }
    }

    #[test]
    fn database_precedes_conversation() {
        // Matches both a greeting and a database pattern; category order wins.
        let intent = classify("hello, show me the sales table");
        assert_eq!(intent.category, IntentCategory::DatabaseQuery);
        assert_eq!(intent.confidence, 0.8);
    }

    #[test]
    fn unmatched_input_falls_back_to_conversation() {
        let intent = classify("zzz qqq");
        assert_eq!(intent.category, IntentCategory::Conversation);
        assert_eq!(intent.confidence, 0.5);
        assert!(intent.matched_rule.is_none());
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(
            classify("SHOW ME THE DATA").category,
            IntentCategory::DatabaseQuery
        );
    }
}
