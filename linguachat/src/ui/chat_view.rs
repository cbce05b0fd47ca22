//! Chat panel and input box renderers for linguachat.
//!
//! The chat panel draws `linguachat_core::view::chat_view` as a `List` of
//! multi-line items, one per message, so the `ListState` selection keeps the
//! selected message scrolled into view. Message text is word-wrapped here
//! because `List` items do not wrap on their own.

use linguachat_core::messages::{Delivery, Placeholder};
use linguachat_core::view::{chat_view, MessageView};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{List, ListItem, Paragraph, Wrap},
};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block, spinner};

/// Left indent of message bodies under their author line.
const BODY_INDENT: &str = "  ";

const STARTING_TEXT: &str = "Starting conversation...";
const REPLYING_TEXT: &str = "Typing...";
const EMPTY_HINT: &str = "Pick a scenario on the left and press Enter to start.";

/// Renders the chat panel: title in the border, then the inline notice, the
/// loading state, or the message list.
pub fn render_chat(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let view = chat_view(&state.session);
    let is_focused = state.focus == PanelFocus::Chat;
    let block = panel_block(format!(" {} ", view.title), is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let placeholder_style = Style::default()
        .fg(theme.placeholder)
        .add_modifier(Modifier::ITALIC);

    if let Some(notice) = view.notice {
        let paragraph = Paragraph::new(Line::styled(notice, Style::default().fg(theme.failed)))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
        return;
    }

    if view.placeholder == Some(Placeholder::Starting) {
        frame.render_widget(Paragraph::new(Line::styled(STARTING_TEXT, placeholder_style)), inner);
        return;
    }

    if view.messages.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::styled(EMPTY_HINT, placeholder_style)).wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }

    let body_width = usize::from(inner.width).saturating_sub(BODY_INDENT.len());
    let mut items: Vec<ListItem> = view
        .messages
        .iter()
        .map(|m| message_item(m, body_width, state.spinner_frame, theme))
        .collect();
    if view.placeholder == Some(Placeholder::Replying) {
        items.push(ListItem::new(Line::from(vec![
            Span::styled("Tutor ", Style::default().fg(theme.bot_message)),
            Span::styled(
                format!("{} {REPLYING_TEXT}", spinner(state.spinner_frame)),
                placeholder_style,
            ),
        ])));
    }

    let highlight = if is_focused {
        Style::default().bg(theme.selection).fg(theme.background)
    } else {
        Style::default()
    };
    let list = List::new(items).highlight_style(highlight);
    frame.render_stateful_widget(list, inner, &mut state.message_list);
}

/// Builds the list item for one message: author line, wrapped body,
/// translation, then the error/correction pairs.
fn message_item(
    view: &MessageView,
    width: usize,
    spinner_frame: usize,
    theme: &Theme,
) -> ListItem<'static> {
    let (author, author_color) = if view.is_user {
        ("You", theme.user_message)
    } else {
        ("Tutor", theme.bot_message)
    };

    let mut header = vec![
        Span::styled(
            author,
            Style::default().fg(author_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" · {}", view.time), Style::default().fg(theme.timestamp)),
    ];
    match view.delivery {
        Delivery::Pending => {
            header.push(Span::styled(" sending…", Style::default().fg(theme.pending)));
        }
        Delivery::Failed => {
            header.push(Span::styled(" not delivered", Style::default().fg(theme.failed)));
        }
        Delivery::Confirmed => {}
    }
    if let Some(speak) = &view.speak {
        let badge = if speak.loading {
            format!("  {} loading", spinner(spinner_frame))
        } else {
            "  [Listen]".to_owned()
        };
        header.push(Span::styled(badge, Style::default().fg(theme.listen_badge)));
    }

    let mut lines = vec![Line::from(header)];
    let body_style = Style::default().fg(author_color);
    lines.extend(
        wrap_text(&view.content, width)
            .into_iter()
            .map(|l| Line::styled(format!("{BODY_INDENT}{l}"), body_style)),
    );

    if let Some(translation) = &view.translation {
        let style = Style::default()
            .fg(theme.translation)
            .add_modifier(Modifier::ITALIC);
        lines.extend(
            wrap_text(translation, width.saturating_sub(2))
                .into_iter()
                .map(|l| Line::styled(format!("{BODY_INDENT}↳ {l}"), style)),
        );
    }

    for error in &view.errors {
        lines.push(Line::from(vec![
            Span::raw(BODY_INDENT),
            Span::styled(
                format!("✗ {}", sanitize(&error.error_text)),
                Style::default().fg(theme.error_text),
            ),
            Span::styled(" → ", Style::default().fg(theme.timestamp)),
            Span::styled(
                format!("✓ {}", sanitize(&error.correction)),
                Style::default().fg(theme.correction),
            ),
        ]));
    }

    lines.push(Line::raw(""));
    ListItem::new(Text::from(lines))
}

/// Renders the one-line message input.
///
/// Disabled until a conversation is chosen. In INSERT mode the terminal
/// cursor sits after the text and long input scrolls to keep its tail visible.
pub fn render_input(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let editing = state.mode == Mode::Insert;
    let title = if editing { " Message (Enter send, Esc done) " } else { " Message " };
    let block = panel_block(title, editing, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let dim = Style::default()
        .fg(theme.placeholder)
        .add_modifier(Modifier::ITALIC);

    let line = if !state.session.input_enabled() {
        Line::styled("Select a scenario to start chatting", dim)
    } else if state.input.is_empty() && !editing {
        Line::styled("Press i to type a message", dim)
    } else {
        let width = usize::from(inner.width.saturating_sub(1));
        let count = state.input.chars().count();
        let visible: String = state.input.chars().skip(count.saturating_sub(width)).collect();
        Line::styled(sanitize(&visible), Style::default().fg(theme.text))
    };
    frame.render_widget(Paragraph::new(line), inner);

    if editing && inner.width > 0 && inner.height > 0 {
        let shown = state.input.chars().count().min(usize::from(inner.width - 1));
        let x = inner.x.saturating_add(u16::try_from(shown).unwrap_or(0));
        frame.set_cursor_position((x, inner.y));
    }
}

/// Replaces control characters so server text cannot drive the terminal.
///
/// ratatui skips control characters when filling its buffer; replacing them
/// here keeps word boundaries intact and renders every server string the same
/// way in the chat panel and the review overlay.
pub(crate) fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Greedy word wrap to `width` columns. Words longer than a line are split;
/// explicit newlines are kept.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = sanitize(paragraph);
        let mut line = String::new();
        let mut len = 0usize;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if len > 0 && len + 1 + word_len > width {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if word_len > width {
                for ch in word.chars() {
                    if len == width {
                        lines.push(std::mem::take(&mut line));
                        len = 0;
                    }
                    line.push(ch);
                    len += 1;
                }
                continue;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.push_str(word);
            len += word_len;
        }
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 9),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("ok abcdefgh", 4), vec!["ok", "abcd", "efgh"]);
    }

    #[test]
    fn keeps_explicit_newlines() {
        assert_eq!(wrap_text("hola\n\nadiós", 20), vec!["hola", "", "adiós"]);
    }

    #[test]
    fn control_characters_are_neutralised() {
        assert_eq!(wrap_text("a\u{1b}[31mb", 20), vec!["a [31mb"]);
        assert_eq!(sanitize("x\u{7}y"), "x y");
    }

    #[test]
    fn zero_width_still_makes_progress() {
        assert_eq!(wrap_text("ab", 0), vec!["a", "b"]);
    }
}
