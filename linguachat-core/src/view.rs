//! Declarative views built from session data.
//!
//! Views are plain data: raw (unescaped) strings plus structure. Each output
//! backend (the terminal UI, [`crate::markup`]) is responsible for rendering
//! them safely. Nothing here depends on a display technology.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::messages::{Delivery, MessageEntry, MessageList, Placeholder};
use crate::session::{ReviewPanel, Session};
use crate::types::{LanguageError, MessageId, Review};

/// One error/correction pair under a message body or in a review category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionView {
    pub error_text: String,
    pub correction: String,
}

impl From<&LanguageError> for CorrectionView {
    fn from(e: &LanguageError) -> Self {
        Self {
            error_text: e.error_text.clone(),
            correction: e.correction.clone(),
        }
    }
}

/// The "Listen" action attached to bot messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakControl {
    pub message_id: MessageId,
    /// Disabled with a loading indicator while audio is being fetched.
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub element_id: String,
    pub is_user: bool,
    pub delivery: Delivery,
    pub content: String,
    /// Localised `HH:MM`.
    pub time: String,
    /// Bot messages only.
    pub translation: Option<String>,
    /// Bot messages only.
    pub speak: Option<SpeakControl>,
    pub errors: Vec<CorrectionView>,
}

/// Builds the view of one message. `speaking` tells whether its speak control
/// is currently disabled.
pub fn message_view(entry: &MessageEntry, speaking: bool) -> MessageView {
    let message = &entry.message;
    let translation = if message.is_user {
        None
    } else {
        message.translated.clone().filter(|t| !t.is_empty())
    };
    let speak = (!message.is_user).then(|| SpeakControl {
        message_id: message.id.clone(),
        loading: speaking,
    });

    MessageView {
        element_id: entry.element_id(),
        is_user: message.is_user,
        delivery: entry.delivery,
        content: message.content.clone(),
        time: format_time(&message.timestamp),
        translation,
        speak,
        errors: message.errors.iter().map(CorrectionView::from).collect(),
    }
}

/// Everything the chat panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub title: String,
    pub messages: Vec<MessageView>,
    pub placeholder: Option<Placeholder>,
    pub notice: Option<String>,
    pub input_enabled: bool,
}

pub fn chat_view(session: &Session) -> ChatView {
    let list: &MessageList = session.messages();
    ChatView {
        title: session.title().to_owned(),
        messages: list
            .entries()
            .iter()
            .map(|e| message_view(e, session.is_speaking(&e.message.id)))
            .collect(),
        placeholder: list.placeholder().cloned(),
        notice: list.notice().map(str::to_owned),
        input_enabled: session.input_enabled(),
    }
}

/// Icon for the review categories the backend is known to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryIcon {
    Grammar,
    Vocabulary,
    Syntax,
}

impl CategoryIcon {
    /// Unknown categories have no icon.
    pub fn for_category(category: &str) -> Option<Self> {
        match category {
            "grammar" => Some(Self::Grammar),
            "vocabulary" => Some(Self::Vocabulary),
            "syntax" => Some(Self::Syntax),
            _ => None,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Grammar => "💬",
            Self::Vocabulary => "📖",
            Self::Syntax => "✗",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::Vocabulary => "vocabulary",
            Self::Syntax => "syntax",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    pub icon: Option<CategoryIcon>,
    /// `"<Category> Errors (<count>)"`.
    pub title: String,
    pub items: Vec<CorrectionView>,
}

pub const REVIEW_TITLE: &str = "Your Performance Review";
pub const REVIEW_LOADING_TITLE: &str = "Generating Your Performance Review...";
pub const REVIEW_SUCCESS_TEXT: &str = "No errors found! Great job!";
pub const REVIEW_FAILURE_TEXT: &str =
    "Sorry, we couldn't generate your performance review. Please try again.";
pub const SUGGESTIONS_TITLE: &str = "Improvement Suggestions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewView {
    Loading,
    Failed,
    Ready {
        /// Empty exactly when the summary had no categories; renderers then
        /// show the success state instead.
        categories: Vec<CategoryView>,
        suggestions: Vec<String>,
    },
}

impl ReviewView {
    pub fn is_success(&self) -> bool {
        matches!(self, ReviewView::Ready { categories, .. } if categories.is_empty())
    }
}

pub fn review_view(review: &Review) -> ReviewView {
    let categories = review
        .error_summary
        .iter()
        .map(|(category, errors)| CategoryView {
            icon: CategoryIcon::for_category(category),
            title: format!("{} Errors ({})", capitalize_first(category), errors.len()),
            items: errors.iter().map(CorrectionView::from).collect(),
        })
        .collect();

    ReviewView::Ready {
        categories,
        suggestions: review.suggestions.clone(),
    }
}

/// View of the review overlay, or `None` while it is hidden.
pub fn review_panel_view(panel: &ReviewPanel) -> Option<ReviewView> {
    match panel {
        ReviewPanel::Hidden => None,
        ReviewPanel::Loading => Some(ReviewView::Loading),
        ReviewPanel::Failed => Some(ReviewView::Failed),
        ReviewPanel::Ready(review) => Some(review_view(review)),
    }
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Formats an ISO-8601 timestamp as local `HH:MM`.
///
/// RFC 3339 input keeps its offset; naive input is taken as UTC. Anything else
/// is returned unchanged.
pub fn format_time(timestamp: &str) -> String {
    format_time_in(timestamp, &Local)
}

fn format_time_in<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.with_timezone(tz).format("%H:%M").to_string();
    }
    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Utc
            .from_utc_datetime(&naive)
            .with_timezone(tz)
            .format("%H:%M")
            .to_string(),
        Err(_) => timestamp.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use std::collections::BTreeMap;

    #[test]
    fn bot_view_has_translation_and_speak_control() {
        let mut message = Message::bot(MessageId::new("5"), "Hola");
        message.translated = Some("Hello".to_owned());
        let entry = MessageEntry {
            message,
            delivery: Delivery::Confirmed,
        };
        let view = message_view(&entry, true);
        assert_eq!(view.element_id, "message-5");
        assert_eq!(view.translation.as_deref(), Some("Hello"));
        assert_eq!(
            view.speak,
            Some(SpeakControl {
                message_id: MessageId::new("5"),
                loading: true
            })
        );
    }

    #[test]
    fn user_view_never_shows_translation_or_speak() {
        let mut message = Message::user(MessageId::new("temp-1"), "Hi");
        message.translated = Some("ignored".to_owned());
        let entry = MessageEntry {
            message,
            delivery: Delivery::Pending,
        };
        let view = message_view(&entry, false);
        assert_eq!(view.translation, None);
        assert_eq!(view.speak, None);
    }

    #[test]
    fn empty_summary_is_success_state() {
        let view = review_view(&Review {
            error_summary: BTreeMap::new(),
            suggestions: vec!["Keep going".to_owned()],
            total_errors: Some(0),
        });
        assert!(view.is_success());
        let ReviewView::Ready { categories, suggestions } = view else {
            panic!("expected ready view");
        };
        assert!(categories.is_empty());
        assert_eq!(suggestions, vec!["Keep going".to_owned()]);
    }

    #[test]
    fn categories_get_titles_counts_and_icons() {
        let mut summary = BTreeMap::new();
        summary.insert(
            "grammar".to_owned(),
            vec![
                LanguageError::new("I has", "I have"),
                LanguageError::new("he go", "he goes"),
            ],
        );
        summary.insert("idioms".to_owned(), vec![LanguageError::new("a", "b")]);
        let view = review_view(&Review {
            error_summary: summary,
            suggestions: vec![],
            total_errors: None,
        });
        let ReviewView::Ready { categories, .. } = view else {
            panic!("expected ready view");
        };
        assert_eq!(categories[0].title, "Grammar Errors (2)");
        assert_eq!(categories[0].icon, Some(CategoryIcon::Grammar));
        assert_eq!(categories[1].title, "Idioms Errors (1)");
        assert_eq!(categories[1].icon, None);
    }

    #[test]
    fn time_formats_rfc3339_and_naive_iso() {
        assert_eq!(format_time_in("2024-05-01T10:15:00+00:00", &Utc), "10:15");
        assert_eq!(format_time_in("2024-05-01T10:15:42.123456", &Utc), "10:15");
        assert_eq!(format_time_in("2024-05-01T12:15:00+02:00", &Utc), "10:15");
        assert_eq!(format_time_in("yesterday", &Utc), "yesterday");
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("vocabulary"), "Vocabulary");
        assert_eq!(capitalize_first("élision"), "Élision");
    }
}
