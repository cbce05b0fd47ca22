//! Client for the conversation backend.
//!
//! The backend speaks JSON over HTTP and keys every call on a cookie session
//! established by [`ChatApi::register`]. [`HttpChatApi`] is the real client;
//! tests and the TUI both talk to it through the [`ChatApi`] trait so a
//! scripted implementation can stand in for the network.
//!
//! Requests and their outcomes are also reified as [`ApiRequest`] /
//! [`ApiOutcome`] so the controller can hand a request to a background worker
//! and later apply the outcome without holding the session across an await.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::types::{
    HistoryResponse, LearnerProfile, Message, MessageId, Review, SendMessageResponse,
    SpeechResponse, StartConversationResponse,
};

/// Transport or HTTP failure. The only error kind the backend surface has.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request task aborted: {0}")]
    Aborted(String),
}

/// The four conversation endpoints plus registration and history.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /setup` with the learner's language preferences.
    async fn register(&self, profile: &LearnerProfile) -> Result<(), ApiError>;

    /// `POST /api/start_conversation` with `{scenario}`.
    async fn start_conversation(
        &self,
        scenario: &str,
    ) -> Result<StartConversationResponse, ApiError>;

    /// `POST /api/send_message` with `{message}`.
    async fn send_message(&self, text: &str) -> Result<SendMessageResponse, ApiError>;

    /// `GET /api/review`.
    async fn review(&self) -> Result<Review, ApiError>;

    /// `POST /api/get_tts` with `{message_id}`.
    async fn speech(&self, message_id: &MessageId) -> Result<SpeechResponse, ApiError>;

    /// `GET /api/history`.
    async fn history(&self) -> Result<HistoryResponse, ApiError>;
}

/// reqwest-backed [`ChatApi`] with a cookie store for the server session.
///
/// No request timeout is configured: a hung call keeps its control busy until
/// the connection itself fails.
#[derive(Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    /// Creates a client rooted at `base_url` (trailing slashes are ignored).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the TLS backend cannot be initialised.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("linguachat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-success status into [`ApiError::Status`], keeping the body text.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        status: response.status().as_u16(),
        message: response.text().await.unwrap_or_default(),
    })
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn register(&self, profile: &LearnerProfile) -> Result<(), ApiError> {
        debug!(target_language = %profile.target_language, "registering learner profile");
        let response = self
            .client
            .post(self.url("/setup"))
            .form(&[
                ("native_language", profile.native_language.as_str()),
                ("target_language", profile.target_language.as_str()),
                ("proficiency_level", profile.proficiency_level.as_str()),
            ])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn start_conversation(
        &self,
        scenario: &str,
    ) -> Result<StartConversationResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/start_conversation"))
            .json(&json!({ "scenario": scenario }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn send_message(&self, text: &str) -> Result<SendMessageResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/send_message"))
            .json(&json!({ "message": text }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn review(&self) -> Result<Review, ApiError> {
        let response = self.client.get(self.url("/api/review")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn speech(&self, message_id: &MessageId) -> Result<SpeechResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/get_tts"))
            .json(&json!({ "message_id": message_id }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn history(&self) -> Result<HistoryResponse, ApiError> {
        let response = self.client.get(self.url("/api/history")).send().await?;
        Ok(check(response).await?.json().await?)
    }
}

/// One HTTP call the controller wants issued.
///
/// Carries everything [`ApiOutcome`] needs to be applied later without
/// consulting the session again (e.g. the optimistic message id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Register(LearnerProfile),
    StartConversation { scenario: String },
    SendMessage { text: String, pending: MessageId },
    Review,
    Speech { message_id: MessageId },
    History,
}

impl ApiRequest {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ApiRequest::Register(_) => "register",
            ApiRequest::StartConversation { .. } => "start_conversation",
            ApiRequest::SendMessage { .. } => "send_message",
            ApiRequest::Review => "review",
            ApiRequest::Speech { .. } => "speech",
            ApiRequest::History => "history",
        }
    }

    /// Builds the failure outcome for this request.
    ///
    /// Used when the call never produced a response of its own (e.g. the task
    /// running it panicked), so the session can still settle.
    pub fn into_failure(self, error: ApiError) -> ApiOutcome {
        match self {
            ApiRequest::Register(_) => ApiOutcome::Registered(Err(error)),
            ApiRequest::StartConversation { .. } => ApiOutcome::Started(Err(error)),
            ApiRequest::SendMessage { pending, .. } => ApiOutcome::Sent {
                pending,
                result: Err(error),
            },
            ApiRequest::Review => ApiOutcome::Reviewed(Err(error)),
            ApiRequest::Speech { message_id } => ApiOutcome::Spoken {
                message_id,
                result: Err(error),
            },
            ApiRequest::History => ApiOutcome::History(Err(error)),
        }
    }
}

/// The settled result of an [`ApiRequest`].
#[derive(Debug)]
pub enum ApiOutcome {
    Registered(Result<(), ApiError>),
    Started(Result<StartConversationResponse, ApiError>),
    Sent {
        pending: MessageId,
        result: Result<SendMessageResponse, ApiError>,
    },
    Reviewed(Result<Review, ApiError>),
    Spoken {
        message_id: MessageId,
        result: Result<SpeechResponse, ApiError>,
    },
    History(Result<Vec<Message>, ApiError>),
}

/// Issues `request` against `api` and always returns an outcome.
///
/// Failures are values, never early returns, so whoever applies the outcome is
/// guaranteed to run its cleanup.
pub async fn dispatch(api: &dyn ChatApi, request: ApiRequest) -> ApiOutcome {
    debug!(request = request.label(), "dispatching API request");
    match request {
        ApiRequest::Register(profile) => ApiOutcome::Registered(api.register(&profile).await),
        ApiRequest::StartConversation { scenario } => {
            ApiOutcome::Started(api.start_conversation(&scenario).await)
        }
        ApiRequest::SendMessage { text, pending } => ApiOutcome::Sent {
            result: api.send_message(&text).await,
            pending,
        },
        ApiRequest::Review => ApiOutcome::Reviewed(api.review().await),
        ApiRequest::Speech { message_id } => ApiOutcome::Spoken {
            result: api.speech(&message_id).await,
            message_id,
        },
        ApiRequest::History => ApiOutcome::History(api.history().await.map(|h| h.messages)),
    }
}
