use crate::content_source::ContentSource;
use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Topic label shown when the selected document could not be fetched or parsed.
pub const ERROR_LOADING_TOPIC: &str = "Error loading data";

/// One topic file: a label plus its ordered question set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDocument {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl TopicDocument {
    /// Empty document shown while a load is in flight.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// Degraded document shown after a failed load.
    pub fn load_failed() -> Self {
        Self {
            topic: ERROR_LOADING_TOPIC.to_string(),
            questions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub example: Option<String>,
}

impl Question {
    /// The example block, if it carries any non-whitespace content.
    pub fn example_text(&self) -> Option<&str> {
        self.example
            .as_deref()
            .filter(|example| !example.trim().is_empty())
    }
}

/// Fetch and parse the topic document at `location`.
pub async fn load_document<S: ContentSource>(source: &S, location: &str) -> Result<TopicDocument> {
    source
        .fetch_document(location)
        .await
        .wrap_err_with(|| format!("failed to load topic document {}", location))
}

// Topic files in the wild use both string and numeric ids.
fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
