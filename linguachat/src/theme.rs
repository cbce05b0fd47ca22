//! Color palettes for the light and dark presentation modes.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI
//! surface linguachat renders. Both palettes stick to the ANSI 16 colors so
//! they work on any terminal, including SSH sessions without truecolor.
//! Which palette is active is decided by `linguachat_core::theme::ThemeToggle`.

use linguachat_core::theme::ThemeMode;
use ratatui::style::Color;

/// All color values used across linguachat's UI surfaces.
///
/// Callers use `theme.field` directly inside `Style::default().fg(..)`.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Chat panel
    /// Author line and body of the learner's messages.
    pub user_message: Color,
    /// Author line and body of the tutor's messages.
    pub bot_message: Color,
    pub timestamp: Color,
    pub translation: Color,
    /// The learner's original text in a correction pair.
    pub error_text: Color,
    /// The suggested correction in a correction pair.
    pub correction: Color,
    /// Marker on optimistic messages awaiting the server.
    pub pending: Color,
    /// Marker on messages the server never confirmed.
    pub failed: Color,
    /// "Listen" badge on tutor messages.
    pub listen_badge: Color,
    /// Highlight of the selected message or scenario.
    pub selection: Color,
    /// Loading placeholders and inline notices.
    pub placeholder: Color,

    // Review overlay
    pub review_title: Color,
    pub review_success: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub status_notice: Color,

    // General
    pub background: Color,
    pub text: Color,
}

impl Theme {
    /// Palette for dark terminals.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            user_message: Color::LightBlue,
            bot_message: Color::White,
            timestamp: Color::DarkGray,
            translation: Color::Gray,
            error_text: Color::LightRed,
            correction: Color::LightGreen,
            pending: Color::DarkGray,
            failed: Color::Red,
            listen_badge: Color::Magenta,
            selection: Color::Cyan,
            placeholder: Color::Gray,

            review_title: Color::Cyan,
            review_success: Color::Green,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_notice: Color::Yellow,

            background: Color::Black,
            text: Color::White,
        }
    }

    /// Palette for light terminals.
    pub fn light() -> Self {
        Self {
            border_active: Color::Blue,
            border_inactive: Color::Gray,

            user_message: Color::Blue,
            bot_message: Color::Black,
            timestamp: Color::Gray,
            translation: Color::DarkGray,
            error_text: Color::Red,
            correction: Color::Green,
            pending: Color::Gray,
            failed: Color::Red,
            listen_badge: Color::Magenta,
            selection: Color::Blue,
            placeholder: Color::DarkGray,

            review_title: Color::Blue,
            review_success: Color::Green,

            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
            status_mode_normal: Color::Blue,
            status_mode_insert: Color::Green,
            status_notice: Color::Red,

            background: Color::White,
            text: Color::Black,
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }
}
