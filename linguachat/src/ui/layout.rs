//! Responsive layout engine for linguachat.
//!
//! Pure layout arithmetic, called inside `terminal.draw()` on every render so
//! each frame reflects the current terminal size.
//!
//! At `>= 80` columns the scenario panel sits left of the chat. Narrower
//! terminals show one panel at a time: whichever has focus.
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panel borders share a single column.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;

/// Width of the scenario panel when both panels fit.
const SCENARIO_PANEL_WIDTH: u16 = 30;

/// Spinner frames for the busy indicator.
const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Panel rects for one frame.
#[derive(Debug, Clone, Copy)]
pub struct PanelLayout {
    pub scenarios: Rect,
    pub chat: Rect,
    pub input: Rect,
    pub status_bar: Rect,
}

/// Splits the frame into scenario panel, chat panel, input box, and status bar.
///
/// Collapsed panels come back with zero width.
pub fn compute_layout(frame: &Frame, state: &AppState) -> PanelLayout {
    let area = frame.area();
    let [main_area, status_bar] =
        area.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let columns = if area.width >= 80 {
        [Constraint::Length(SCENARIO_PANEL_WIDTH), Constraint::Fill(1)]
    } else if state.focus == PanelFocus::Scenarios {
        [Constraint::Fill(1), Constraint::Length(0)]
    } else {
        [Constraint::Length(0), Constraint::Fill(1)]
    };
    let horizontal = Layout::horizontal(columns).spacing(Spacing::Overlap(1));
    let [scenarios, chat_column] = main_area.layout(&horizontal);

    let [chat, input] = chat_column.layout(
        &Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).spacing(Spacing::Overlap(1)),
    );

    PanelLayout {
        scenarios,
        chat,
        input,
        status_bar,
    }
}

/// The inner `Rect` of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

/// Bordered panel block: thick border in the active color when focused.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

pub fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

/// Renders the 1-row status bar.
///
/// Left: mode, connection state, busy spinner, and the current notice.
/// Right: theme toggle icon and the help hint.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Normal | Mode::HelpOverlay | Mode::VoicesOverlay => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    let profile = state.profile();
    let link = if state.session.is_registered() {
        format!(
            " {} → {} ({}) ",
            profile.native_language, profile.target_language, profile.proficiency_level
        )
    } else {
        " not registered ".to_owned()
    };
    spans.push(Span::raw(link));

    if state.session.is_busy() {
        spans.push(Span::raw(format!("{} ", spinner(state.spinner_frame))));
    }

    if let Some(notice) = state.notice.as_deref().or(state.session.status()) {
        spans.push(Span::styled(
            format!(" {notice} "),
            Style::default().fg(theme.status_notice).add_modifier(Modifier::BOLD),
        ));
    }

    let hint = format!(" {} t  ? help ", state.theme_toggle.icon());
    let [left, right] = area.layout(&Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(hint.chars().count() as u16),
    ]));

    let bar_style = Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg);
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar_style), left);
    frame.render_widget(Paragraph::new(hint).style(bar_style), right);
}
