//! Wire and domain types shared by the API client, the session, and the views.
//!
//! The server issues integer ids while the client mints string ids for
//! optimistic and synthetic messages, so both id newtypes accept either a JSON
//! string or a JSON number and always hold the textual form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a message, either server-issued or client-generated.
///
/// Client ids have the shape `temp-<unix-millis>` (optimistic user message) or
/// `error-<unix-millis>` (synthetic bot error message).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for ids minted on the client that the server has never seen.
    pub fn is_local(&self) -> bool {
        self.0.starts_with("temp-") || self.0.starts_with("error-")
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(Self)
    }
}

/// Opaque token for the server-tracked conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(Self)
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Uint(n) => n.to_string(),
    })
}

/// One detected language error and its correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageError {
    pub error_text: String,
    pub correction: String,
    /// Category (grammar, vocabulary, syntax, ...). Only present on history
    /// and send responses; review responses group by category instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl LanguageError {
    pub fn new(error_text: impl Into<String>, correction: impl Into<String>) -> Self {
        Self {
            error_text: error_text.into(),
            correction: correction.into(),
            error_type: None,
        }
    }
}

/// One turn of a conversation.
///
/// A message is authored by exactly one side, selected by `is_user`.
/// `translated` is only ever rendered for bot messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub is_user: bool,
    /// ISO-8601 timestamp as sent by the server (or generated locally).
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<LanguageError>,
}

impl Message {
    /// Builds a locally-authored user message with the current timestamp.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            is_user: true,
            timestamp: chrono::Utc::now().to_rfc3339(),
            translated: None,
            errors: Vec::new(),
        }
    }

    /// Builds a locally-authored bot message with the current timestamp.
    pub fn bot(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            is_user: false,
            timestamp: chrono::Utc::now().to_rfc3339(),
            translated: None,
            errors: Vec::new(),
        }
    }
}

/// End-of-conversation summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Category name → errors in that category. Ordered by key, matching the
    /// sorted JSON the server emits.
    #[serde(default)]
    pub error_summary: BTreeMap<String, Vec<LanguageError>>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_errors: Option<u32>,
}

/// A named conversational context offered to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
}

impl Scenario {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The built-in scenario catalog served by the reference backend.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("cafe", "At a Café"),
        Scenario::new("shopping", "Shopping at a Mall"),
        Scenario::new("airport", "Traveling at the Airport"),
        Scenario::new("meeting", "Meeting New People"),
        Scenario::new("doctor", "Visiting a Doctor"),
    ]
}

/// Proficiency levels accepted by the registration form.
pub const PROFICIENCY_LEVELS: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

/// Language preferences submitted once per client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub native_language: String,
    pub target_language: String,
    pub proficiency_level: String,
}

impl Default for LearnerProfile {
    fn default() -> Self {
        Self {
            native_language: "English".to_owned(),
            target_language: "Spanish".to_owned(),
            proficiency_level: "Beginner".to_owned(),
        }
    }
}

// Response bodies

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StartConversationResponse {
    pub conversation_id: ConversationId,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub bot_message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeechResponse {
    /// Base64-encoded audio bytes. Absent or empty means nothing to play.
    #[serde(default)]
    pub audio_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}
