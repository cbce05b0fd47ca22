//! linguachat: terminal client for a conversational language tutor.
//!
//! Entry point for the `linguachat` binary. Wires together the terminal
//! lifecycle (`tui`), the unified event bus (`event`), the network and audio
//! workers (`net`, `audio`), rendering (`ui`), and the conversation session
//! from `linguachat-core`.
//!
//! # Startup sequence
//!
//! 1. File logging, so config loading can already log.
//! 2. Config, HTTP client, theme preference, local synthesizer. Read-only or
//!    in-memory, safe before terminal init.
//! 3. `install_panic_hook()`, then `register_sigterm()`, then `init_tui()`.
//! 4. Event channel, event task, network worker, audio thread.
//! 5. Learner registration is issued before the first frame.
//!
//! # Safety
//!
//! `restore_tui()` is called after the event loop exits (quit key, SIGTERM,
//! channel close, or a draw error). The loop itself never returns early with
//! `?`. The panic hook covers unexpected panics.

mod app;
mod audio;
mod event;
mod net;
mod theme;
mod tui;
mod ui;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use linguachat_core::api::HttpChatApi;
use linguachat_core::config::{load_config, preferences_path, state_dir};
use linguachat_core::session::Session;
use linguachat_core::speech::{CommandSynthesizer, SpeechSynthesizer};
use linguachat_core::theme::{system_prefers_dark, FilePreferenceStore, ThemeToggle};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

/// Installs the tracing subscriber writing to `linguachat.log` in the state
/// directory.
///
/// The terminal belongs to the UI, so nothing is logged to stdout or stderr.
/// `RUST_LOG` overrides the default `info` filter. Returns the guard that
/// flushes the non-blocking writer; `None` when the directory is unusable, in
/// which case logging is off.
fn init_logging() -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let dir = state_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::never(&dir, "linguachat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .with(filter)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _log_guard = init_logging();

    let config = load_config();
    info!(server = %config.server_url, "starting linguachat");
    let api = HttpChatApi::new(&config.server_url).map_err(std::io::Error::other)?;

    let store = FilePreferenceStore::new(preferences_path());
    let theme_toggle = ThemeToggle::load(Box::new(store), system_prefers_dark());

    let synth = match CommandSynthesizer::detect() {
        Ok(synth) => {
            info!(program = %synth.program().display(), "local speech synthesizer found");
            Some(Box::new(synth) as Box<dyn SpeechSynthesizer>)
        }
        Err(e) => {
            warn!("local speech unavailable: {e}");
            None
        }
    };

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm();
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let (net_tx, net_rx) = tokio::sync::mpsc::unbounded_channel();
    net::spawn_network_worker(Arc::new(api), net_rx, handler.tx.clone());
    let audio_tx = audio::spawn_audio_worker(handler.tx.clone());

    let mut state = app::AppState::new(
        Session::new(config.scenarios.clone()),
        config.profile(),
        theme_toggle,
        net_tx,
        audio_tx,
    )
    .with_synthesizer(synth);
    state.register();

    // Exits only via `break` so `restore_tui()` is always reached.
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: SIGTERM is checked at least every 50ms even when no
            // other event arrives.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        // Exactly one draw() call per Render event.
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state)) {
                            error!("draw failed: {e}");
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Mouse(mouse)) => {
                        if handle_mouse(mouse, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Api(outcome)) => state.apply_outcome(*outcome),
                    Some(event::AppEvent::AudioFinished(result)) => state.apply_audio_result(result),
                    Some(event::AppEvent::Tick) => state.tick(),
                    // The next Render picks up the new frame size.
                    Some(event::AppEvent::Resize(_, _)) => {}
                    Some(event::AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    info!("linguachat stopped");
    Ok(())
}
