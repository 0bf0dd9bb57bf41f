use serde::Serialize;
use serde_json::{Map, Value};

/// Structured outcome of one dispatched command.
///
/// Exactly one `Response` is produced per processed command, fully formed
/// before it leaves the dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// Action tag, e.g. `app_launched` or `conversation`.
    pub action: String,
    /// Text spoken (or printed) back to the user.
    pub response_text: String,
    /// The original transcript text.
    pub command: String,
    /// Handler-specific payload.
    pub data: Map<String, Value>,
}

impl Response {
    pub fn new(
        action: impl Into<String>,
        response_text: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            response_text: response_text.into(),
            command: command.into(),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_entries_accumulate() {
        let response = Response::new("web_search", "Searching", "search for rust")
            .with_data("search_query", "rust")
            .with_data("engine", "google");
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data["search_query"], "rust");
    }

    #[test]
    fn serializes_with_flat_shape() {
        let response = Response::new("conversation", "Hello!", "hi").with_data("conversation_type", "general");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["action"], "conversation");
        assert_eq!(json["data"]["conversation_type"], "general");
    }
}
