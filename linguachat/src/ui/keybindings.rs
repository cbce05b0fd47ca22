//! Keybinding dispatcher for linguachat.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. Overlays
//! take keys first (help, then voices, then the review); otherwise the
//! dispatcher branches on `state.mode`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{AppState, Mode, PanelFocus};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Keep running and redraw.
    Continue,
    /// Tear down the terminal and exit.
    Quit,
}

/// Dispatches a key event to the handler for the current overlay or mode.
///
/// Notices from the previous action are cleared first, so each one stays on
/// screen until the next keypress.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    state.notice = None;
    state.session.clear_status();

    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::VoicesOverlay => handle_voices(key, state),
        _ if state.session.review().is_visible() => handle_review(key, state),
        Mode::Insert => handle_insert(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        // Panel focus
        KeyCode::Tab | KeyCode::Char('H') | KeyCode::Char('L') => {
            state.focus = state.focus.next();
        }

        KeyCode::Enter if state.focus == PanelFocus::Scenarios => {
            state.start_selected_scenario();
        }
        KeyCode::Char('i') | KeyCode::Enter if state.session.input_enabled() => {
            state.focus = PanelFocus::Chat;
            state.mode = Mode::Insert;
        }

        // Speech
        KeyCode::Char('s') => {
            state.speak_selected();
        }
        KeyCode::Char('S') => state.speak_selected_locally(),
        KeyCode::Char('V') => {
            state.help_scroll = 0;
            state.show_voices();
        }

        // Conversation
        KeyCode::Char('r') => {
            state.request_review();
        }
        KeyCode::Char('h') => {
            state.reload_history();
        }
        KeyCode::Char('R') => {
            state.register();
        }

        KeyCode::Char('t') => state.toggle_theme(),

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }

        KeyCode::Char('q') => return KeyAction::Quit,

        _ => {}
    }
    KeyAction::Continue
}

/// Handles j / k / g / G and the Ctrl half-page combos.
///
/// Returns `Some(KeyAction)` when the key was consumed, `None` when the key
/// should fall through to the rest of the Normal handler.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.scroll_down(state.half_page()),
        KeyCode::Char('u') if ctrl => state.scroll_up(state.half_page()),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

/// Edits the input buffer. Enter sends; Esc returns to Normal mode.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter => {
            state.send_input();
        }
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.input.clear();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.input.push(c);
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_voices(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('V') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// The review overlay offers Close and Return Home.
fn handle_review(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => {
            state.close_review();
            state.mode = Mode::Normal;
        }
        KeyCode::Char('h') => state.return_home(),
        KeyCode::Char('j') => state.review_scroll = state.review_scroll.saturating_add(1),
        KeyCode::Char('k') => state.review_scroll = state.review_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.review_scroll = 0,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus and scroll-wheel.
///
/// The wheel scrolls whichever overlay is open, otherwise the focused panel,
/// by 3 lines.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            handle_mouse_click(mouse.column, mouse.row, state)
        }
        MouseEventKind::ScrollUp => scroll_by_wheel(state, false),
        MouseEventKind::ScrollDown => scroll_by_wheel(state, true),
        _ => {}
    }
    KeyAction::Continue
}

/// Sets panel focus from the cached panel rects. Collapsed panels are skipped.
fn handle_mouse_click(col: u16, row: u16, state: &mut AppState) {
    if state.mode != Mode::Normal && state.mode != Mode::Insert {
        return;
    }
    let pos = Position { x: col, y: row };
    let [scenarios, chat] = state.panel_rects;

    if scenarios.width > 0 && scenarios.contains(pos) {
        state.focus = PanelFocus::Scenarios;
        state.mode = Mode::Normal;
    } else if chat.width > 0 && chat.contains(pos) {
        state.focus = PanelFocus::Chat;
    }
}

fn scroll_by_wheel(state: &mut AppState, down: bool) {
    const LINES: u16 = 3;
    let offset = match state.mode {
        Mode::HelpOverlay | Mode::VoicesOverlay => &mut state.help_scroll,
        _ if state.session.review().is_visible() => &mut state.review_scroll,
        _ => {
            if down {
                state.scroll_down(LINES);
            } else {
                state.scroll_up(LINES);
            }
            return;
        }
    };
    *offset = if down {
        offset.saturating_add(LINES)
    } else {
        offset.saturating_sub(LINES)
    };
}
