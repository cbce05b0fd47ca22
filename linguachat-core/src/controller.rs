//! Conversation controller operations.
//!
//! Every operation is split in two halves around the single HTTP call it
//! issues:
//!
//! - a synchronous *begin* function (`select_scenario`, `send_message`, ...)
//!   that checks preconditions, applies the pre-request side effects, and
//!   returns the [`ApiRequest`] to issue, or `None` when a precondition fails
//!   (in which case nothing was changed);
//! - [`settle`], which applies the [`ApiOutcome`] of that call. Its first step
//!   is always the cleanup (busy flag release, speak control re-enable), before
//!   any success or failure handling.
//!
//! [`drive`] glues the halves together for callers that can hold the session
//! across the await.
//!
//! The busy flag serialises registration, scenario selection, sending, review,
//! and history reloads. Speaking only checks it: a speak request disables its
//! own control and leaves the flag alone.

use base64::Engine as _;
use tracing::{info, warn};

use crate::api::{dispatch, ApiOutcome, ApiRequest, ChatApi};
use crate::session::{ReviewPanel, Session};
use crate::types::{LearnerProfile, MessageId};

/// Notice that replaces the message list when a conversation fails to start.
pub const START_FAILURE_TEXT: &str = "Error starting conversation. Please try again.";

/// Side effect the caller must perform after [`settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Decoded audio bytes to play through the audio output.
    PlayAudio(Vec<u8>),
}

/// Registers the learner profile with the server.
pub fn register(session: &mut Session, profile: LearnerProfile) -> Option<ApiRequest> {
    if session.busy {
        return None;
    }
    session.busy = true;
    Some(ApiRequest::Register(profile))
}

/// Starts a new conversation in `scenario_id`.
///
/// Unknown scenario ids are rejected: the title comes from the catalog entry.
pub fn select_scenario(session: &mut Session, scenario_id: &str) -> Option<ApiRequest> {
    if session.busy {
        return None;
    }
    let Some(scenario) = session.scenario(scenario_id).cloned() else {
        warn!(scenario_id, "ignoring unknown scenario");
        return None;
    };

    session.busy = true;
    session.messages.show_starting();
    session.title = scenario.name;
    session.input_enabled = true;
    session.active_scenario = Some(scenario.id.clone());
    Some(ApiRequest::StartConversation {
        scenario: scenario.id,
    })
}

/// Sends `text` in the active conversation, rendering it optimistically.
///
/// Clearing the input field is the caller's job.
pub fn send_message(session: &mut Session, text: &str) -> Option<ApiRequest> {
    let text = text.trim();
    if session.busy || session.active_conversation.is_none() || text.is_empty() {
        return None;
    }

    session.busy = true;
    let pending = session.messages.push_pending(text);
    session.messages.show_replying();
    Some(ApiRequest::SendMessage {
        text: text.to_owned(),
        pending,
    })
}

/// Fetches server-rendered audio for a bot message.
pub fn speak(session: &mut Session, message_id: &MessageId) -> Option<ApiRequest> {
    if session.busy || session.speaking.contains(message_id) {
        return None;
    }
    let entry = session.messages.get(message_id)?;
    if entry.message.is_user {
        return None;
    }

    session.speaking.insert(message_id.clone());
    Some(ApiRequest::Speech {
        message_id: message_id.clone(),
    })
}

/// Requests the end-of-conversation review.
pub fn request_review(session: &mut Session) -> Option<ApiRequest> {
    if session.busy || session.active_conversation.is_none() {
        return None;
    }
    session.busy = true;
    session.review = ReviewPanel::Loading;
    Some(ApiRequest::Review)
}

/// Reloads the message list from the server's history.
pub fn reload_history(session: &mut Session) -> Option<ApiRequest> {
    if session.busy || session.active_conversation.is_none() {
        return None;
    }
    session.busy = true;
    Some(ApiRequest::History)
}

/// Applies the outcome of a request issued by one of the operations above.
pub fn settle(session: &mut Session, outcome: ApiOutcome) -> Effect {
    // Cleanup first, whatever the result.
    match &outcome {
        ApiOutcome::Spoken { message_id, .. } => {
            session.speaking.remove(message_id);
        }
        _ => session.busy = false,
    }

    match outcome {
        ApiOutcome::Registered(Ok(())) => {
            session.registered = true;
            session.status = None;
        }
        ApiOutcome::Registered(Err(e)) => {
            warn!("error registering learner profile: {e}");
            session.status = Some("Could not register with the server".to_owned());
        }
        ApiOutcome::Started(Ok(started)) => {
            info!(conversation_id = %started.conversation_id, "conversation started");
            session.active_conversation = Some(started.conversation_id);
            session.messages.clear();
            session.messages.push_confirmed(started.message);
        }
        ApiOutcome::Started(Err(e)) => {
            warn!("error starting conversation: {e}");
            session.messages.show_notice(START_FAILURE_TEXT);
        }
        ApiOutcome::Sent { pending, result } => {
            session.messages.clear_placeholder();
            match result {
                Ok(sent) => {
                    let user = sent.user_message;
                    session.messages.confirm(&pending, user.id, user.errors);
                    session.messages.push_confirmed(sent.bot_message);
                }
                Err(e) => {
                    warn!("error sending message: {e}");
                    session.messages.mark_failed(&pending);
                    session.messages.push_send_failure();
                }
            }
        }
        ApiOutcome::Reviewed(Ok(review)) => {
            session.review = ReviewPanel::Ready(review);
        }
        ApiOutcome::Reviewed(Err(e)) => {
            warn!("error getting review: {e}");
            session.review = ReviewPanel::Failed;
        }
        ApiOutcome::History(Ok(messages)) => {
            session.messages.replace_with(messages);
        }
        ApiOutcome::History(Err(e)) => {
            warn!("error loading history: {e}");
            session.status = Some("Could not load conversation history".to_owned());
        }
        ApiOutcome::Spoken { message_id, result } => match result {
            Ok(speech) => match speech.audio_data.as_deref() {
                Some(data) if !data.is_empty() => {
                    match base64::engine::general_purpose::STANDARD.decode(data) {
                        Ok(bytes) => return Effect::PlayAudio(bytes),
                        Err(e) => warn!(%message_id, "discarding malformed audio: {e}"),
                    }
                }
                _ => info!(%message_id, "server returned no audio"),
            },
            Err(e) => warn!(%message_id, "error getting speech audio: {e}"),
        },
    }
    Effect::None
}

/// Issues `request` and settles its outcome on `session`.
pub async fn drive(session: &mut Session, api: &dyn ChatApi, request: ApiRequest) -> Effect {
    let outcome = dispatch(api, request).await;
    settle(session, outcome)
}
