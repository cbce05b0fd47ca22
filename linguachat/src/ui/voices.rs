//! Voice list overlay for linguachat.
//!
//! Shows the local synthesizer voices matching the target language, as
//! collected by `AppState::show_voices`.

use ratatui::{
    Frame,
    layout::Constraint,
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph},
};

use crate::app::AppState;
use crate::theme::Theme;

pub fn render_voices_overlay(frame: &mut Frame, state: &AppState, theme: &Theme) {
    if frame.area().width < 40 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(60), Constraint::Percentage(60));
    frame.render_widget(Clear, overlay_area);

    let title = format!(
        " Voices for {} ({})  Esc to close ",
        state.profile().target_language,
        state.voices.len()
    );
    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(theme.border_active))
        .style(Style::default().bg(theme.background).fg(theme.text));

    let text = if state.voices.is_empty() {
        Text::from(Line::styled(
            "No matching voices installed",
            Style::default().fg(theme.placeholder),
        ))
    } else {
        Text::from(
            state
                .voices
                .iter()
                .map(|v| {
                    Line::from(vec![
                        Span::raw(format!("  {:<24}", v.name)),
                        Span::styled(v.lang.clone(), Style::default().fg(theme.timestamp)),
                    ])
                })
                .collect::<Vec<_>>(),
        )
    };

    frame.render_widget(
        Paragraph::new(text).block(block).scroll((state.help_scroll, 0)),
        overlay_area,
    );
}
