//! UI rendering module for linguachat.
//!
//! This is the module root for `ui/`. It exposes `render()` as the single entry
//! point called by the event loop's `terminal.draw()` closure.
//!
//! Layout arithmetic lives in `layout.rs`; each panel and overlay has its own
//! file.

mod layout;
pub mod chat_view;
pub mod help;
pub mod keybindings;
pub mod review;
pub mod scenario_list;
pub mod voices;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::{AppState, Mode};
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame: scenario panel, chat, input, status bar, and
/// whichever overlays are open.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`.
///
/// The chat viewport height and the panel rects are written back into `state`
/// so the next keypress or mouse click sees this frame's geometry.
pub fn render(frame: &mut Frame, state: &mut AppState) {
    let theme = state.theme.clone();
    state.sync_message_selection();

    frame.render_widget(
        Block::new().style(Style::default().bg(theme.background).fg(theme.text)),
        frame.area(),
    );

    let layout = compute_layout(frame, state);
    state.chat_viewport_height = inner_rect(layout.chat).height;
    state.panel_rects = [layout.scenarios, layout.chat];

    if layout.scenarios.width > 0 {
        scenario_list::render_scenario_list(frame, layout.scenarios, state, &theme);
    }
    if layout.chat.width > 0 {
        chat_view::render_chat(frame, layout.chat, state, &theme);
        chat_view::render_input(frame, layout.input, state, &theme);
    }

    render_status_bar(frame, layout.status_bar, state, &theme);

    // Overlays last so they sit on top.
    review::render_review_overlay(frame, state, &theme);
    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, &theme, state.help_scroll),
        Mode::VoicesOverlay => voices::render_voices_overlay(frame, state, &theme),
        Mode::Normal | Mode::Insert => {}
    }
}
