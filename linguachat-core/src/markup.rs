//! HTML fragment renderer for message and review views.
//!
//! Produces the markup contract of the web client (element ids, class names)
//! from the same views the terminal draws. Every piece of text that can come
//! from a user or from model output goes through [`escape_html`], and so does
//! every attribute value.

use std::fmt::Write as _;

use crate::messages::Delivery;
use crate::view::{
    CategoryView, CorrectionView, MessageView, ReviewView, REVIEW_FAILURE_TEXT,
    REVIEW_LOADING_TITLE, REVIEW_SUCCESS_TEXT, REVIEW_TITLE, SUGGESTIONS_TITLE,
};

/// Escapes the five HTML-significant characters.
///
/// `&` `<` `>` `"` `'` become `&amp;` `&lt;` `&gt;` `&quot;` `&#039;`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Exact inverse of [`escape_html`].
///
/// Only the five entities it produces are decoded; any other `&` sequence is
/// copied through unchanged.
pub fn unescape_html(text: &str) -> String {
    const ENTITIES: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#039;", '\''),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn corrections_markup(out: &mut String, errors: &[CorrectionView]) {
    if errors.is_empty() {
        return;
    }
    out.push_str(r#"<div class="message-errors">"#);
    for e in errors {
        let _ = write!(
            out,
            r#"<div class="message-error"><div class="error-text">{}</div><div class="message-correction">✓ {}</div></div>"#,
            escape_html(&e.error_text),
            escape_html(&e.correction),
        );
    }
    out.push_str("</div>");
}

/// Renders one message as a `<div id="message-…">` fragment.
pub fn message_markup(view: &MessageView) -> String {
    let mut class = String::from(if view.is_user {
        "message message-user"
    } else {
        "message message-bot"
    });
    match view.delivery {
        Delivery::Pending => class.push_str(" message-pending"),
        Delivery::Failed => class.push_str(" message-failed"),
        Delivery::Confirmed => {}
    }

    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div id="{}" class="{}"><div class="message-content">{}</div><div class="message-time">{}</div>"#,
        escape_html(&view.element_id),
        class,
        escape_html(&view.content),
        escape_html(&view.time),
    );
    if let Some(translation) = &view.translation {
        let _ = write!(
            out,
            r#"<div class="message-translation bot-translation">{}</div>"#,
            escape_html(translation),
        );
    }
    if let Some(speak) = &view.speak {
        let disabled = if speak.loading { " disabled" } else { "" };
        let label = if speak.loading {
            r#"<div class="loading"></div>"#
        } else {
            "Listen"
        };
        let _ = write!(
            out,
            r#"<div class="message-actions"><button class="action-button speak-button" data-message-id="{}"{}>{}</button></div>"#,
            escape_html(speak.message_id.as_str()),
            disabled,
            label,
        );
    }
    corrections_markup(&mut out, &view.errors);
    out.push_str("</div>");
    out
}

fn category_markup(out: &mut String, category: &CategoryView) {
    out.push_str(r#"<div class="error-category"><h3 class="error-category-title">"#);
    if let Some(icon) = category.icon {
        let _ = write!(
            out,
            r#"<span class="category-icon category-{}">{}</span> "#,
            icon.name(),
            icon.glyph(),
        );
    }
    out.push_str(&escape_html(&category.title));
    out.push_str(r#"</h3><div class="error-list">"#);
    for item in &category.items {
        let _ = write!(
            out,
            r#"<div class="error-item"><div class="error-text">{}</div><div class="error-correction">{}</div></div>"#,
            escape_html(&item.error_text),
            escape_html(&item.correction),
        );
    }
    out.push_str("</div></div>");
}

/// Renders the review panel fragment.
pub fn review_markup(view: &ReviewView) -> String {
    let mut out = String::from(r#"<div class="review-panel">"#);
    match view {
        ReviewView::Loading => {
            let _ = write!(
                out,
                r#"<h2 class="review-title">{REVIEW_LOADING_TITLE}</h2><div class="loading"></div>"#
            );
        }
        ReviewView::Failed => {
            let _ = write!(
                out,
                r#"<h2 class="review-title">Error</h2><p class="review-error">{}</p><button class="btn btn-primary review-close">Close</button>"#,
                escape_html(REVIEW_FAILURE_TEXT),
            );
        }
        ReviewView::Ready {
            categories,
            suggestions,
        } => {
            let _ = write!(
                out,
                r#"<h2 class="review-title">{REVIEW_TITLE}</h2><div class="error-summary">"#
            );
            if categories.is_empty() {
                let _ = write!(
                    out,
                    r#"<div class="review-success"><p>{REVIEW_SUCCESS_TEXT}</p></div>"#
                );
            }
            for category in categories {
                category_markup(&mut out, category);
            }
            let _ = write!(
                out,
                r#"</div><div class="suggestions-container"><h3 class="suggestions-title">{SUGGESTIONS_TITLE}</h3><div class="suggestion-list">"#
            );
            for suggestion in suggestions {
                let _ = write!(
                    out,
                    r#"<div class="suggestion-item"><div>{}</div></div>"#,
                    escape_html(suggestion),
                );
            }
            out.push_str(
                r#"</div></div><a href="/" class="btn btn-outline">Return Home</a><button class="btn btn-primary review-close">Close Review</button>"#,
            );
        }
    }
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageEntry;
    use crate::types::{LanguageError, Message, MessageId, Review};
    use crate::view::{message_view, review_view};
    use std::collections::BTreeMap;

    #[test]
    fn script_tags_never_survive_unescaped() {
        let payload = "<script>alert(1)</script>";
        let mut message = Message::bot(MessageId::new("1"), payload);
        message.translated = Some(payload.to_owned());
        message.errors = vec![LanguageError::new(payload, payload)];
        let html = message_markup(&message_view(
            &MessageEntry {
                message,
                delivery: Delivery::Confirmed,
            },
            false,
        ));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("</script>"));
        assert_eq!(html.matches("&lt;script&gt;alert(1)&lt;/script&gt;").count(), 4);
    }

    #[test]
    fn escape_round_trips() {
        for s in [
            "<script>alert(1)</script>",
            r#"Tom & "Jerry" <it's>"#,
            "&amp; already escaped",
            "plain ñandú",
            "",
        ] {
            assert_eq!(unescape_html(&escape_html(s)), s);
        }
    }

    #[test]
    fn unescape_leaves_unknown_entities() {
        assert_eq!(unescape_html("a &nbsp; b & c"), "a &nbsp; b & c");
    }

    #[test]
    fn user_errors_are_listed_under_the_body() {
        let mut message = Message::user(MessageId::new("7"), "I has a apple");
        message.errors = vec![LanguageError::new("I has", "I have")];
        let html = message_markup(&message_view(
            &MessageEntry {
                message,
                delivery: Delivery::Confirmed,
            },
            false,
        ));
        assert!(html.starts_with(r#"<div id="message-7" class="message message-user">"#));
        assert_eq!(html.matches(r#"class="message-error""#).count(), 1);
        assert!(html.contains("✓ I have"));
        assert!(!html.contains("speak-button"));
    }

    #[test]
    fn success_review_has_no_categories() {
        let html = review_markup(&review_view(&Review {
            error_summary: BTreeMap::new(),
            suggestions: vec!["Great job!".to_owned()],
            total_errors: None,
        }));
        assert!(html.contains(REVIEW_SUCCESS_TEXT));
        assert!(!html.contains("error-category"));
        assert!(!html.contains("error-item"));
    }
}
