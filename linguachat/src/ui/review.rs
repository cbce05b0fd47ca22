//! Review overlay renderer for linguachat.
//!
//! Draws the performance review as a centred modal over the panels, erasing
//! the background with `Clear` first, the same way the help overlay does.

use linguachat_core::view::{
    review_panel_view, ReviewView, REVIEW_FAILURE_TEXT, REVIEW_LOADING_TITLE,
    REVIEW_SUCCESS_TEXT, REVIEW_TITLE, SUGGESTIONS_TITLE,
};
use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::chat_view::sanitize;
use crate::ui::layout::spinner;

const FOOTER: &str = " [h] Return Home  [Esc] Close  j/k scroll ";

/// Renders the review overlay when the session has one to show.
pub fn render_review_overlay(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let Some(view) = review_panel_view(state.session.review()) else {
        return;
    };
    let area = frame.area();
    if area.width < 20 || area.height < 6 {
        return;
    }

    let overlay_area = area.centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let title = match view {
        ReviewView::Loading => REVIEW_LOADING_TITLE,
        ReviewView::Failed | ReviewView::Ready { .. } => REVIEW_TITLE,
    };
    let block = Block::bordered()
        .title(Line::styled(
            format!(" {title} "),
            Style::default()
                .fg(theme.review_title)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::styled(FOOTER, Style::default().fg(theme.timestamp)))
        .border_style(Style::default().fg(theme.border_active))
        .style(Style::default().bg(theme.background).fg(theme.text));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    frame.render_widget(
        Paragraph::new(review_text(&view, state.spinner_frame, theme))
            .wrap(Wrap { trim: false })
            .scroll((state.review_scroll, 0)),
        inner,
    );
}

/// Builds the overlay body for one review state.
fn review_text(view: &ReviewView, spinner_frame: usize, theme: &Theme) -> Text<'static> {
    let mut lines: Vec<Line> = Vec::new();
    match view {
        ReviewView::Loading => {
            lines.push(Line::styled(
                format!("{} Analysing the conversation...", spinner(spinner_frame)),
                Style::default().fg(theme.placeholder),
            ));
        }
        ReviewView::Failed => {
            lines.push(Line::styled(REVIEW_FAILURE_TEXT, Style::default().fg(theme.failed)));
        }
        ReviewView::Ready {
            categories,
            suggestions,
        } => {
            if view.is_success() {
                lines.push(Line::styled(
                    format!("✓ {REVIEW_SUCCESS_TEXT}"),
                    Style::default()
                        .fg(theme.review_success)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            for category in categories {
                let icon = category.icon.map_or("•", |i| i.glyph());
                lines.push(Line::styled(
                    format!("{icon} {}", sanitize(&category.title)),
                    Style::default()
                        .fg(theme.review_title)
                        .add_modifier(Modifier::BOLD),
                ));
                for item in &category.items {
                    lines.push(Line::from(vec![
                        Span::raw("   "),
                        Span::styled(
                            sanitize(&item.error_text),
                            Style::default()
                                .fg(theme.error_text)
                                .add_modifier(Modifier::CROSSED_OUT),
                        ),
                        Span::styled(" → ", Style::default().fg(theme.timestamp)),
                        Span::styled(
                            sanitize(&item.correction),
                            Style::default().fg(theme.correction),
                        ),
                    ]));
                }
                lines.push(Line::raw(""));
            }
            if !suggestions.is_empty() {
                if view.is_success() {
                    lines.push(Line::raw(""));
                }
                lines.push(Line::styled(
                    SUGGESTIONS_TITLE,
                    Style::default()
                        .fg(theme.review_title)
                        .add_modifier(Modifier::BOLD),
                ));
                for suggestion in suggestions {
                    lines.push(Line::raw(format!("   • {}", sanitize(suggestion))));
                }
            }
        }
    }
    Text::from(lines)
}
