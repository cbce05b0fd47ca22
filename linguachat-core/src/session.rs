//! Per-run session state.
//!
//! A [`Session`] is created once at startup and dropped on exit. Only the
//! operations in [`crate::controller`] mutate it (apart from the explicit
//! user dismissals below); everything else reads it through accessors.

use std::collections::HashSet;

use crate::messages::MessageList;
use crate::types::{ConversationId, MessageId, Review, Scenario};

/// Title shown before any scenario is selected.
pub const DEFAULT_TITLE: &str = "Choose a scenario";

/// State of the review overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReviewPanel {
    #[default]
    Hidden,
    Loading,
    Ready(Review),
    Failed,
}

impl ReviewPanel {
    pub fn is_visible(&self) -> bool {
        !matches!(self, ReviewPanel::Hidden)
    }
}

/// The single active-conversation session.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) scenarios: Vec<Scenario>,
    pub(crate) active_scenario: Option<String>,
    pub(crate) active_conversation: Option<ConversationId>,
    pub(crate) busy: bool,
    pub(crate) registered: bool,
    pub(crate) title: String,
    pub(crate) input_enabled: bool,
    pub(crate) messages: MessageList,
    pub(crate) review: ReviewPanel,
    /// Bot messages whose speak control is disabled while audio is fetched.
    pub(crate) speaking: HashSet<MessageId>,
    pub(crate) status: Option<String>,
}

impl Session {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            active_scenario: None,
            active_conversation: None,
            busy: false,
            registered: false,
            title: DEFAULT_TITLE.to_owned(),
            input_enabled: false,
            messages: MessageList::new(),
            review: ReviewPanel::Hidden,
            speaking: HashSet::new(),
            status: None,
        }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn active_scenario(&self) -> Option<&str> {
        self.active_scenario.as_deref()
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.active_conversation.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn messages(&self) -> &MessageList {
        &self.messages
    }

    pub fn review(&self) -> &ReviewPanel {
        &self.review
    }

    /// `true` while the speak control of `id` is disabled.
    pub fn is_speaking(&self, id: &MessageId) -> bool {
        self.speaking.contains(id)
    }

    /// Transient one-line notice for the status bar.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Closes the review overlay. Only user action calls this.
    pub fn dismiss_review(&mut self) {
        self.review = ReviewPanel::Hidden;
    }

    /// Leaves the current conversation and returns to scenario selection.
    ///
    /// Ignored while a request is in flight so its outcome still has a
    /// conversation to land in.
    pub fn return_home(&mut self) {
        if self.busy {
            return;
        }
        self.review = ReviewPanel::Hidden;
        self.active_scenario = None;
        self.active_conversation = None;
        self.title = DEFAULT_TITLE.to_owned();
        self.input_enabled = false;
        self.messages.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(crate::types::default_scenarios())
    }
}
