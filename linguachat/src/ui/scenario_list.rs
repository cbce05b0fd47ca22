//! Scenario panel renderer for linguachat.
//!
//! Renders the left panel from the session's scenario catalog. The scenario
//! of the running conversation carries a `●` marker; Enter starts the one
//! under the cursor.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

/// Renders the scenario list with the `ListState` selection highlight.
pub fn render_scenario_list(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Scenarios;
    let block = panel_block("Scenarios", is_focused, theme);

    let active = state.session.active_scenario();
    let items: Vec<ListItem> = if state.session.scenarios().is_empty() {
        vec![ListItem::new(Line::raw("No scenarios configured"))]
    } else {
        state
            .session
            .scenarios()
            .iter()
            .map(|s| {
                let marker = if active == Some(s.id.as_str()) {
                    Span::styled("● ", Style::default().fg(theme.border_active))
                } else {
                    Span::raw("  ")
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(s.name.clone(), Style::default().fg(theme.text)),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(theme.selection)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED),
    );

    frame.render_stateful_widget(list, area, &mut state.scenario_list);
}
