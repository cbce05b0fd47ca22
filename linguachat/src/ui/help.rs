//! Help overlay renderer for linguachat.
//!
//! Provides `render_help_overlay()` which draws a centred modal box over the existing
//! panel layout using ratatui's `Clear` widget to erase the background first. The
//! overlay is rendered inside the same `terminal.draw()` closure as all other panels.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal.
///
/// The paragraph scrolls vertically by `help_scroll` rows so the whole key list
/// is reachable on short terminals. Skipped below 60 columns to avoid a
/// zero-height `Rect`.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active))
        .style(Style::default().bg(theme.background).fg(theme.text));

    frame.render_widget(
        Paragraph::new(build_help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

/// Builds the help text, grouped by section.
fn build_help_text(theme: &Theme) -> Text<'static> {
    let heading = Style::default()
        .fg(theme.review_title)
        .add_modifier(Modifier::BOLD);
    Text::from(vec![
        Line::styled("Navigation", heading),
        Line::from("  j / k         Move selection down / up"),
        Line::from("  g / G         Jump to first / last"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Tab, H / L    Switch between scenarios and chat"),
        Line::from(""),
        Line::styled("Conversation", heading),
        Line::from("  Enter         Start the selected scenario (scenario panel)"),
        Line::from("  i             Type a message"),
        Line::from("  Enter         Send the message (while typing)"),
        Line::from("  Esc           Stop typing"),
        Line::from("  h             Reload the conversation history"),
        Line::from("  r             Review the conversation"),
        Line::from("  R             Register the learner profile again"),
        Line::from(""),
        Line::styled("Speech", heading),
        Line::from("  s             Listen to the selected tutor message"),
        Line::from("  S             Speak the selected message with the local synthesizer"),
        Line::from("  V             List local voices for the target language"),
        Line::from(""),
        Line::styled("Review", heading),
        Line::from("  h             Return home"),
        Line::from("  Esc / c / q   Close the review"),
        Line::from(""),
        Line::styled("General", heading),
        Line::from("  t             Toggle light / dark theme"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Ctrl-c    Quit"),
    ])
}
