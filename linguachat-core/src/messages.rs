//! The displayed message list and its two-phase commit for optimistic sends.
//!
//! A user message is shown the moment it is sent, under a client-minted
//! `temp-<millis>` id, and marked [`Delivery::Pending`]. When the server
//! answers, the same entry is re-keyed to the server id and annotated in place
//! (never removed and re-added), so its position in the list is stable.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{LanguageError, Message, MessageId};

/// Confirmation state of a displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Rendered optimistically; the server has not answered yet.
    Pending,
    /// Server-issued, or reconciled with the server's copy.
    Confirmed,
    /// The send that created this entry failed.
    Failed,
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub message: Message,
    pub delivery: Delivery,
}

impl MessageEntry {
    /// Element key, unique within the list: `message-<id>`.
    pub fn element_id(&self) -> String {
        element_id(&self.message.id)
    }
}

/// Derives the element key used for a message id.
pub fn element_id(id: &MessageId) -> String {
    format!("message-{id}")
}

/// What the chat panel shows instead of (or in addition to) messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// Whole-panel loading state while a conversation starts.
    Starting,
    /// A bot-side "typing" row appended after the newest message.
    Replying,
}

/// Ordered messages of the active conversation.
///
/// Also owns the loading placeholder and the inline notice shown in place of
/// the messages when a conversation fails to start.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    entries: Vec<MessageEntry>,
    placeholder: Option<Placeholder>,
    notice: Option<String>,
    /// Bumped whenever an entry is appended so views can follow the newest.
    revision: u64,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &MessageId) -> Option<&MessageEntry> {
        self.entries.iter().find(|e| &e.message.id == id)
    }

    /// Removes every entry, the placeholder, and any notice.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.placeholder = None;
        self.notice = None;
        self.revision += 1;
    }

    /// Clears the list and shows the whole-panel loading state.
    pub fn show_starting(&mut self) {
        self.clear();
        self.placeholder = Some(Placeholder::Starting);
    }

    /// Appends the "replying" row after the newest message.
    pub fn show_replying(&mut self) {
        self.placeholder = Some(Placeholder::Replying);
        self.revision += 1;
    }

    pub fn clear_placeholder(&mut self) {
        self.placeholder = None;
    }

    /// Replaces everything with an inline error notice.
    pub fn show_notice(&mut self, notice: impl Into<String>) {
        self.clear();
        self.notice = Some(notice.into());
    }

    /// Appends a server-confirmed message.
    pub fn push_confirmed(&mut self, message: Message) {
        self.push(MessageEntry {
            message,
            delivery: Delivery::Confirmed,
        });
    }

    /// Appends an optimistic user message and returns its temporary id.
    pub fn push_pending(&mut self, text: &str) -> MessageId {
        let id = MessageId::new(format!("temp-{}", now_millis()));
        self.push(MessageEntry {
            message: Message::user(id.clone(), text),
            delivery: Delivery::Pending,
        });
        id
    }

    /// Appends a synthetic bot message reporting a failed send.
    pub fn push_send_failure(&mut self) -> MessageId {
        let id = MessageId::new(format!("error-{}", now_millis()));
        self.push(MessageEntry {
            message: Message::bot(id.clone(), SEND_FAILURE_TEXT),
            delivery: Delivery::Confirmed,
        });
        id
    }

    fn push(&mut self, entry: MessageEntry) {
        self.notice = None;
        self.entries.push(entry);
        self.revision += 1;
    }

    /// Reconciles a pending user message with the server's copy.
    ///
    /// Re-keys the entry to `server_id` and appends `errors` to it in place.
    /// Only pending user entries are amended; anything else is left untouched
    /// and `false` is returned.
    pub fn confirm(
        &mut self,
        pending: &MessageId,
        server_id: MessageId,
        errors: Vec<LanguageError>,
    ) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| &e.message.id == pending) else {
            return false;
        };
        if !entry.message.is_user || entry.delivery != Delivery::Pending {
            return false;
        }
        entry.message.id = server_id;
        entry.message.errors.extend(errors);
        entry.delivery = Delivery::Confirmed;
        true
    }

    /// Marks a pending user message as failed.
    pub fn mark_failed(&mut self, pending: &MessageId) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| &e.message.id == pending && e.delivery == Delivery::Pending)
        {
            entry.delivery = Delivery::Failed;
        }
    }

    /// Replaces the whole list with server history.
    pub fn replace_with(&mut self, messages: Vec<Message>) {
        self.clear();
        for message in messages {
            self.push_confirmed(message);
        }
    }
}

/// Content of the synthetic bot message appended when a send fails.
pub const SEND_FAILURE_TEXT: &str = "Sorry, I encountered an error. Please try again.";

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_message_is_rekeyed_and_annotated_in_place() {
        let mut list = MessageList::new();
        list.push_confirmed(Message::bot(MessageId::new("1"), "¡Hola!"));
        let temp = list.push_pending("I has a apple");
        assert!(temp.as_str().starts_with("temp-"));

        let ok = list.confirm(
            &temp,
            MessageId::new("2"),
            vec![LanguageError::new("I has", "I have")],
        );
        assert!(ok);
        assert_eq!(list.len(), 2);
        let entry = &list.entries()[1];
        assert_eq!(entry.element_id(), "message-2");
        assert_eq!(entry.delivery, Delivery::Confirmed);
        assert_eq!(entry.message.errors.len(), 1);
        assert!(list.get(&temp).is_none());
    }

    #[test]
    fn confirm_only_amends_once() {
        let mut list = MessageList::new();
        let temp = list.push_pending("hi");
        assert!(list.confirm(&temp, MessageId::new("9"), vec![]));
        assert!(!list.confirm(
            &MessageId::new("9"),
            MessageId::new("10"),
            vec![LanguageError::new("a", "b")]
        ));
        assert!(list.get(&MessageId::new("9")).unwrap().message.errors.is_empty());
    }

    #[test]
    fn bot_messages_are_never_amended() {
        let mut list = MessageList::new();
        let id = list.push_send_failure();
        assert!(!list.confirm(&id, MessageId::new("3"), vec![]));
    }

    #[test]
    fn notice_replaces_messages() {
        let mut list = MessageList::new();
        list.push_confirmed(Message::bot(MessageId::new("1"), "x"));
        list.show_notice("Error starting conversation. Please try again.");
        assert!(list.is_empty());
        assert!(list.notice().is_some());
        assert_eq!(list.placeholder(), None);
    }

    #[test]
    fn starting_placeholder_clears_previous_conversation() {
        let mut list = MessageList::new();
        list.push_confirmed(Message::bot(MessageId::new("1"), "x"));
        list.show_starting();
        assert!(list.is_empty());
        assert_eq!(list.placeholder(), Some(&Placeholder::Starting));
    }
}
