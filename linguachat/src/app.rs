//! Central application state for linguachat.
//!
//! `AppState` bundles the UI-only state (mode, focus, selections, the input
//! buffer, overlay scroll offsets) with the conversation [`Session`] and the
//! channels to the network and audio workers. The render module reads it; the
//! keybinding dispatcher and the event loop mutate it.
//!
//! Every conversation operation goes through `linguachat_core::controller`:
//! the begin half runs here, the request is handed to the network worker, and
//! the outcome comes back through [`AppState::apply_outcome`].

use crossbeam_channel::Sender;
use linguachat_core::api::{ApiError, ApiOutcome, ApiRequest};
use linguachat_core::controller::{self, Effect};
use linguachat_core::messages::MessageEntry;
use linguachat_core::session::Session;
use linguachat_core::speech::{speak_text_fallback, voices_for_language, SpeechSynthesizer, Voice};
use linguachat_core::theme::ThemeToggle;
use linguachat_core::types::LearnerProfile;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::audio::{AudioError, AudioRequest};
use crate::theme::Theme;

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Navigation and commands (default).
    #[default]
    Normal,
    /// Typing into the message input.
    Insert,
    /// Help overlay above all panels.
    HelpOverlay,
    /// Voice list overlay.
    VoicesOverlay,
}

/// Which panel currently has keyboard focus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Left panel listing the scenarios.
    #[default]
    Scenarios,
    /// Centre panel with the conversation.
    Chat,
}

impl PanelFocus {
    /// The other panel; there are only two.
    pub fn next(self) -> Self {
        match self {
            PanelFocus::Scenarios => PanelFocus::Chat,
            PanelFocus::Chat => PanelFocus::Scenarios,
        }
    }
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    /// Selection in the scenario panel.
    pub scenario_list: ListState,
    /// Selection in the chat panel. Follows the newest message whenever the
    /// message list changes.
    pub message_list: ListState,
    /// Inner height of the chat panel, cached after each render.
    pub chat_viewport_height: u16,
    /// `[scenarios, chat]` outer rects from the last render, for mouse focus.
    pub panel_rects: [Rect; 2],

    /// Text being composed in the input box.
    pub input: String,
    pub help_scroll: u16,
    pub review_scroll: u16,
    /// Result of the last voice listing.
    pub voices: Vec<Voice>,
    /// One-line UI notice (speech/theme/audio failures). Cleared on the next key.
    pub notice: Option<String>,
    /// Advanced on every tick; drives the busy spinner.
    pub spinner_frame: usize,

    pub session: Session,
    pub theme_toggle: ThemeToggle,
    pub theme: Theme,

    profile: LearnerProfile,
    net_tx: UnboundedSender<ApiRequest>,
    audio_tx: Sender<AudioRequest>,
    synth: Option<Box<dyn SpeechSynthesizer>>,
    /// Message list revision the chat selection was last synced to.
    seen_revision: u64,
}

impl AppState {
    pub fn new(
        session: Session,
        profile: LearnerProfile,
        theme_toggle: ThemeToggle,
        net_tx: UnboundedSender<ApiRequest>,
        audio_tx: Sender<AudioRequest>,
    ) -> Self {
        let mut scenario_list = ListState::default();
        if !session.scenarios().is_empty() {
            scenario_list.select(Some(0));
        }
        let theme = Theme::for_mode(theme_toggle.mode());
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            scenario_list,
            message_list: ListState::default(),
            chat_viewport_height: 0,
            panel_rects: [Rect::default(); 2],
            input: String::new(),
            help_scroll: 0,
            review_scroll: 0,
            voices: Vec::new(),
            notice: None,
            spinner_frame: 0,
            session,
            theme_toggle,
            theme,
            profile,
            net_tx,
            audio_tx,
            synth: None,
            seen_revision: 0,
        }
    }

    /// Installs the local synthesizer used by the speech fallback.
    pub fn with_synthesizer(mut self, synth: Option<Box<dyn SpeechSynthesizer>>) -> Self {
        self.synth = synth;
        self
    }

    pub fn profile(&self) -> &LearnerProfile {
        &self.profile
    }

    /// Hands a begun request to the network worker.
    ///
    /// If the worker is gone the request fails in place, so the session never
    /// stays busy.
    fn issue(&mut self, request: Option<ApiRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };
        if let Err(e) = self.net_tx.send(request) {
            let request = e.0;
            warn!(request = request.label(), "network worker unavailable");
            let outcome = request.into_failure(ApiError::Aborted("network worker stopped".into()));
            self.apply_outcome(outcome);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Conversation operations
    // -----------------------------------------------------------------------

    pub fn register(&mut self) -> bool {
        let request = controller::register(&mut self.session, self.profile.clone());
        self.issue(request)
    }

    /// Starts the scenario under the cursor and moves focus to the chat.
    pub fn start_selected_scenario(&mut self) -> bool {
        let Some(id) = self
            .scenario_list
            .selected()
            .and_then(|i| self.session.scenarios().get(i))
            .map(|s| s.id.clone())
        else {
            return false;
        };
        let request = controller::select_scenario(&mut self.session, &id);
        let issued = self.issue(request);
        if issued {
            self.input.clear();
            self.focus = PanelFocus::Chat;
            self.sync_message_selection();
        }
        issued
    }

    /// Sends the input buffer. The buffer is only cleared when the send is
    /// actually issued.
    pub fn send_input(&mut self) -> bool {
        let request = controller::send_message(&mut self.session, &self.input);
        let issued = self.issue(request);
        if issued {
            self.input.clear();
            self.sync_message_selection();
        }
        issued
    }

    pub fn selected_message(&self) -> Option<&MessageEntry> {
        self.message_list
            .selected()
            .and_then(|i| self.session.messages().entries().get(i))
    }

    /// Fetches server audio for the selected tutor message.
    pub fn speak_selected(&mut self) -> bool {
        let Some(id) = self.selected_message().map(|e| e.message.id.clone()) else {
            return false;
        };
        let request = controller::speak(&mut self.session, &id);
        self.issue(request)
    }

    /// Speaks the selected message through the local synthesizer.
    pub fn speak_selected_locally(&mut self) {
        let Some(text) = self.selected_message().map(|e| e.message.content.clone()) else {
            return;
        };
        let Some(synth) = self.synth.as_deref_mut() else {
            self.notice = Some("No local speech synthesizer found".to_owned());
            return;
        };
        if let Err(e) = speak_text_fallback(synth, &text, &self.profile.target_language) {
            warn!("local speech failed: {e}");
            self.notice = Some("Local speech failed".to_owned());
        }
    }

    /// Lists the local voices for the target language in an overlay.
    pub fn show_voices(&mut self) {
        let Some(synth) = self.synth.as_deref() else {
            self.notice = Some("No local speech synthesizer found".to_owned());
            return;
        };
        match voices_for_language(synth, &self.profile.target_language) {
            Ok(voices) => {
                self.voices = voices;
                self.mode = Mode::VoicesOverlay;
            }
            Err(e) => {
                warn!("listing voices failed: {e}");
                self.notice = Some("Could not list voices".to_owned());
            }
        }
    }

    pub fn request_review(&mut self) -> bool {
        self.review_scroll = 0;
        let request = controller::request_review(&mut self.session);
        self.issue(request)
    }

    pub fn reload_history(&mut self) -> bool {
        let request = controller::reload_history(&mut self.session);
        self.issue(request)
    }

    pub fn close_review(&mut self) {
        self.session.dismiss_review();
    }

    /// Leaves the conversation for scenario selection. Ignored while busy.
    pub fn return_home(&mut self) {
        if self.session.is_busy() {
            return;
        }
        self.session.return_home();
        self.input.clear();
        self.mode = Mode::Normal;
        self.focus = PanelFocus::Scenarios;
        self.sync_message_selection();
    }

    /// Flips light/dark and persists it. The palette follows the toggle even
    /// when saving fails.
    pub fn toggle_theme(&mut self) {
        if let Err(e) = self.theme_toggle.toggle() {
            warn!("failed to save theme preference: {e}");
            self.notice = Some("Could not save theme preference".to_owned());
        }
        self.theme = Theme::for_mode(self.theme_toggle.mode());
    }

    // -----------------------------------------------------------------------
    // Background results
    // -----------------------------------------------------------------------

    /// Settles a network outcome and forwards any audio to the audio thread.
    pub fn apply_outcome(&mut self, outcome: ApiOutcome) {
        if let Effect::PlayAudio(bytes) = controller::settle(&mut self.session, outcome) {
            if self.audio_tx.send(AudioRequest::Play(bytes)).is_err() {
                warn!("audio thread unavailable, dropping clip");
            }
        }
        self.sync_message_selection();
    }

    pub fn apply_audio_result(&mut self, result: Result<(), AudioError>) {
        if result.is_err() {
            self.notice = Some("Could not play audio".to_owned());
        }
    }

    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }

    /// Moves the chat selection to the newest message whenever the message
    /// list has changed since the last sync.
    pub fn sync_message_selection(&mut self) {
        let messages = self.session.messages();
        if messages.revision() == self.seen_revision {
            return;
        }
        self.seen_revision = messages.revision();
        let last = messages.len().checked_sub(1);
        self.message_list.select(last);
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Scenarios => self.scenario_list.scroll_down_by(lines),
            PanelFocus::Chat => self.message_list.scroll_down_by(lines),
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Scenarios => self.scenario_list.scroll_up_by(lines),
            PanelFocus::Chat => self.message_list.scroll_up_by(lines),
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Scenarios => self.scenario_list.select_first(),
            PanelFocus::Chat => self.message_list.select_first(),
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Scenarios => self.scenario_list.select_last(),
            PanelFocus::Chat => self.message_list.select_last(),
        }
    }

    /// Half the cached chat height, at least one row.
    pub fn half_page(&self) -> u16 {
        (self.chat_viewport_height / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguachat_core::theme::{MemoryPreferenceStore, ThemeMode};
    use linguachat_core::types::{
        default_scenarios, ConversationId, Message, MessageId, SpeechResponse,
        StartConversationResponse,
    };
    use tokio::sync::mpsc;

    struct Harness {
        state: AppState,
        net_rx: mpsc::UnboundedReceiver<ApiRequest>,
        audio_rx: crossbeam_channel::Receiver<AudioRequest>,
    }

    fn harness() -> Harness {
        let (net_tx, net_rx) = mpsc::unbounded_channel();
        let (audio_tx, audio_rx) = crossbeam_channel::unbounded();
        let toggle = ThemeToggle::load(Box::<MemoryPreferenceStore>::default(), Some(true));
        let state = AppState::new(
            Session::new(default_scenarios()),
            LearnerProfile::default(),
            toggle,
            net_tx,
            audio_tx,
        );
        Harness {
            state,
            net_rx,
            audio_rx,
        }
    }

    fn start(h: &mut Harness) {
        assert!(h.state.start_selected_scenario());
        let request = h.net_rx.try_recv().unwrap();
        assert_eq!(
            request,
            ApiRequest::StartConversation {
                scenario: "cafe".to_owned()
            }
        );
        h.state.apply_outcome(ApiOutcome::Started(Ok(StartConversationResponse {
            conversation_id: ConversationId::new("9"),
            message: Message::bot(MessageId::new("1"), "¡Hola!"),
        })));
    }

    #[test]
    fn starting_a_scenario_focuses_chat_and_selects_greeting() {
        let mut h = harness();
        start(&mut h);
        assert_eq!(h.state.focus, PanelFocus::Chat);
        assert!(!h.state.session.is_busy());
        assert_eq!(h.state.message_list.selected(), Some(0));
    }

    #[test]
    fn input_is_kept_when_send_is_rejected() {
        let mut h = harness();
        h.state.input = "hola".to_owned();
        assert!(!h.state.send_input());
        assert_eq!(h.state.input, "hola");

        start(&mut h);
        assert!(h.state.send_input());
        assert!(h.state.input.is_empty());
        assert!(matches!(
            h.net_rx.try_recv().unwrap(),
            ApiRequest::SendMessage { .. }
        ));
        assert_eq!(h.state.message_list.selected(), Some(1));
    }

    #[test]
    fn stopped_network_worker_fails_the_request_in_place() {
        let mut h = harness();
        drop(h.net_rx);
        assert!(h.state.start_selected_scenario());
        assert!(!h.state.session.is_busy());
        assert!(h.state.session.messages().notice().is_some());
    }

    #[test]
    fn speech_audio_is_forwarded_to_the_audio_thread() {
        let mut h = harness();
        start(&mut h);
        assert!(h.state.speak_selected());
        let ApiRequest::Speech { message_id } = h.net_rx.try_recv().unwrap() else {
            panic!("expected a speech request");
        };
        h.state.apply_outcome(ApiOutcome::Spoken {
            message_id,
            result: Ok(SpeechResponse {
                audio_data: Some("SUQz".to_owned()),
            }),
        });
        let AudioRequest::Play(bytes) = h.audio_rx.try_recv().unwrap();
        assert_eq!(bytes, b"ID3");
    }

    #[test]
    fn local_speech_without_synthesizer_sets_notice() {
        let mut h = harness();
        start(&mut h);
        h.state.speak_selected_locally();
        assert!(h.state.notice.is_some());
    }

    #[test]
    fn theme_toggle_swaps_palette() {
        let mut h = harness();
        assert_eq!(h.state.theme_toggle.mode(), ThemeMode::Dark);
        h.state.toggle_theme();
        assert_eq!(h.state.theme_toggle.mode(), ThemeMode::Light);
        assert_eq!(h.state.theme.background, Theme::light().background);
        assert!(h.state.notice.is_none());
    }

    #[test]
    fn return_home_refocuses_scenarios() {
        let mut h = harness();
        start(&mut h);
        h.state.return_home();
        assert_eq!(h.state.focus, PanelFocus::Scenarios);
        assert!(h.state.session.active_conversation().is_none());
        assert_eq!(h.state.message_list.selected(), None);
    }
}
