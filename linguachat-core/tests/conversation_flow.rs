//! End-to-end conversation flows against a mocked backend.
//!
//! The HTTP tests run [`HttpChatApi`] against wiremock; the failure tests use
//! a scripted [`ChatApi`] that rejects every call.

use async_trait::async_trait;
use linguachat_core::api::{ApiError, ApiRequest, ChatApi, HttpChatApi};
use linguachat_core::controller::{self, Effect, START_FAILURE_TEXT};
use linguachat_core::markup::message_markup;
use linguachat_core::messages::{Delivery, SEND_FAILURE_TEXT};
use linguachat_core::session::{ReviewPanel, Session};
use linguachat_core::types::{
    HistoryResponse, LearnerProfile, MessageId, Review, Scenario, SendMessageResponse,
    SpeechResponse, StartConversationResponse,
};
use linguachat_core::view::{chat_view, review_view, REVIEW_SUCCESS_TEXT};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn restaurant_session() -> Session {
    Session::new(vec![Scenario::new("restaurant", "At a Restaurant")])
}

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/start_conversation"))
        .and(body_json(json!({ "scenario": "restaurant" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": 42,
            "message": {
                "id": 1,
                "content": "¡Hola! ¿Qué le gustaría pedir?",
                "is_user": false,
                "timestamp": "2024-05-01T10:15:00.123456",
                "translated": "Hello! What would you like to order?"
            }
        })))
        .mount(server)
        .await;
}

async fn start(session: &mut Session, api: &HttpChatApi) {
    let request = controller::select_scenario(session, "restaurant").unwrap();
    let effect = controller::drive(session, api, request).await;
    assert_eq!(effect, Effect::None);
}

#[tokio::test]
async fn starting_a_scenario_renders_the_greeting() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    let api = HttpChatApi::new(&server.uri()).unwrap();
    let mut session = restaurant_session();

    start(&mut session, &api).await;

    assert!(!session.is_busy());
    assert_eq!(session.title(), "At a Restaurant");
    assert!(session.input_enabled());
    assert_eq!(session.active_conversation().map(|c| c.as_str()), Some("42"));

    let view = chat_view(&session);
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].element_id, "message-1");
    assert_eq!(
        view.messages[0].translation.as_deref(),
        Some("Hello! What would you like to order?")
    );
    assert!(view.messages[0].speak.is_some());
}

#[tokio::test]
async fn sent_message_is_annotated_with_server_errors() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/send_message"))
        .and(body_json(json!({ "message": "I has a apple" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_message": {
                "id": 2,
                "content": "I has a apple",
                "is_user": true,
                "timestamp": "2024-05-01T10:16:00",
                "errors": [
                    { "error_text": "I has", "correction": "I have", "error_type": "grammar" },
                    { "error_text": "a apple", "correction": "an apple", "error_type": "grammar" }
                ]
            },
            "bot_message": {
                "id": 3,
                "content": "Nice apple!",
                "is_user": false,
                "timestamp": "2024-05-01T10:16:01"
            }
        })))
        .mount(&server)
        .await;
    let api = HttpChatApi::new(&server.uri()).unwrap();
    let mut session = restaurant_session();
    start(&mut session, &api).await;

    let request = controller::send_message(&mut session, "I has a apple").unwrap();
    let ApiRequest::SendMessage { pending, .. } = &request else {
        panic!("expected a send request, got {request:?}");
    };
    assert!(pending.as_str().starts_with("temp-"));
    assert_eq!(session.messages().len(), 2);
    let pending = pending.clone();

    controller::drive(&mut session, &api, request).await;

    assert!(!session.is_busy());
    let entries = session.messages().entries();
    assert_eq!(entries.len(), 3);
    assert!(session.messages().get(&pending).is_none());
    let user = session.messages().get(&MessageId::new("2")).unwrap();
    assert_eq!(user.delivery, Delivery::Confirmed);
    assert_eq!(user.message.errors.len(), 2);
    assert_eq!(entries[2].message.content, "Nice apple!");

    let html = message_markup(&chat_view(&session).messages[1]);
    assert!(html.starts_with(r#"<div id="message-2" class="message message-user">"#));
    assert!(html.contains("✓ I have"));
    assert!(html.contains("✓ an apple"));
}

#[tokio::test]
async fn review_with_no_errors_shows_success() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/review"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_summary": {},
            "suggestions": ["Try using more past tense verbs."],
            "total_errors": 0
        })))
        .mount(&server)
        .await;
    let api = HttpChatApi::new(&server.uri()).unwrap();
    let mut session = restaurant_session();
    start(&mut session, &api).await;

    let request = controller::request_review(&mut session).unwrap();
    assert_eq!(session.review(), &ReviewPanel::Loading);
    controller::drive(&mut session, &api, request).await;

    let ReviewPanel::Ready(review) = session.review() else {
        panic!("expected a ready review, got {:?}", session.review());
    };
    let view = review_view(review);
    assert!(view.is_success());
    let html = linguachat_core::markup::review_markup(&view);
    assert!(html.contains(REVIEW_SUCCESS_TEXT));
    assert!(html.contains("Try using more past tense verbs."));
}

#[tokio::test]
async fn speech_audio_is_decoded_for_playback() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/get_tts"))
        .and(body_json(json!({ "message_id": "1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "audio_data": "SUQzBA==" })),
        )
        .mount(&server)
        .await;
    let api = HttpChatApi::new(&server.uri()).unwrap();
    let mut session = restaurant_session();
    start(&mut session, &api).await;

    let id = MessageId::new("1");
    let request = controller::speak(&mut session, &id).unwrap();
    assert!(session.is_speaking(&id));
    assert!(!session.is_busy());

    let effect = controller::drive(&mut session, &api, request).await;
    assert_eq!(effect, Effect::PlayAudio(vec![b'I', b'D', b'3', 4]));
    assert!(!session.is_speaking(&id));
}

#[tokio::test]
async fn registration_cookie_is_sent_on_later_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/setup"))
        .and(body_string_contains("target_language=Spanish"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session=abc123; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .mount(&server)
        .await;
    let api = HttpChatApi::new(&server.uri()).unwrap();
    let mut session = restaurant_session();

    let request = controller::register(&mut session, LearnerProfile::default()).unwrap();
    controller::drive(&mut session, &api, request).await;
    assert!(session.is_registered());
    assert_eq!(session.status(), None);

    let history = api.history().await.unwrap();
    assert!(history.messages.is_empty());
}

#[tokio::test]
async fn server_error_status_carries_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/review"))
        .respond_with(ResponseTemplate::new(400).set_body_string("No active conversation"))
        .mount(&server)
        .await;
    let api = HttpChatApi::new(&server.uri()).unwrap();

    match api.review().await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "No active conversation");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

/// Rejects every call, as if the backend were down.
struct RejectingApi;

fn rejected() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "unavailable".to_owned(),
    }
}

#[async_trait]
impl ChatApi for RejectingApi {
    async fn register(&self, _profile: &LearnerProfile) -> Result<(), ApiError> {
        Err(rejected())
    }

    async fn start_conversation(
        &self,
        _scenario: &str,
    ) -> Result<StartConversationResponse, ApiError> {
        Err(rejected())
    }

    async fn send_message(&self, _text: &str) -> Result<SendMessageResponse, ApiError> {
        Err(rejected())
    }

    async fn review(&self) -> Result<Review, ApiError> {
        Err(rejected())
    }

    async fn speech(&self, _message_id: &MessageId) -> Result<SpeechResponse, ApiError> {
        Err(rejected())
    }

    async fn history(&self) -> Result<HistoryResponse, ApiError> {
        Err(rejected())
    }
}

#[tokio::test]
async fn failed_operations_always_release_busy() {
    let mut session = restaurant_session();

    let request = controller::register(&mut session, LearnerProfile::default()).unwrap();
    controller::drive(&mut session, &RejectingApi, request).await;
    assert!(!session.is_busy());
    assert!(!session.is_registered());
    assert_eq!(session.status(), Some("Could not register with the server"));

    let request = controller::select_scenario(&mut session, "restaurant").unwrap();
    controller::drive(&mut session, &RejectingApi, request).await;
    assert!(!session.is_busy());
    assert!(session.active_conversation().is_none());
    assert_eq!(session.messages().notice(), Some(START_FAILURE_TEXT));
    assert!(session.messages().is_empty());
}

#[tokio::test]
async fn failed_send_appends_exactly_one_error_message() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    let http = HttpChatApi::new(&server.uri()).unwrap();
    let mut session = restaurant_session();
    start(&mut session, &http).await;

    let request = controller::send_message(&mut session, "Quiero agua").unwrap();
    controller::drive(&mut session, &RejectingApi, request).await;

    assert!(!session.is_busy());
    assert!(session.active_conversation().is_some());
    let entries = session.messages().entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].delivery, Delivery::Failed);
    assert_eq!(entries[1].message.content, "Quiero agua");
    assert_eq!(entries[2].message.content, SEND_FAILURE_TEXT);
    assert!(entries[2].message.id.as_str().starts_with("error-"));
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.message.content == SEND_FAILURE_TEXT)
            .count(),
        1
    );

    let request = controller::request_review(&mut session).unwrap();
    controller::drive(&mut session, &RejectingApi, request).await;
    assert!(!session.is_busy());
    assert_eq!(session.review(), &ReviewPanel::Failed);

    let request = controller::reload_history(&mut session).unwrap();
    controller::drive(&mut session, &RejectingApi, request).await;
    assert!(!session.is_busy());
    assert_eq!(session.messages().len(), 3);
    assert_eq!(session.status(), Some("Could not load conversation history"));

    let id = MessageId::new("1");
    let request = controller::speak(&mut session, &id).unwrap();
    let effect = controller::drive(&mut session, &RejectingApi, request).await;
    assert_eq!(effect, Effect::None);
    assert!(!session.is_speaking(&id));
}

#[tokio::test]
async fn history_reload_replaces_list_with_confirmed_server_messages() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {
                    "id": 1,
                    "content": "¡Hola! ¿Qué le gustaría pedir?",
                    "is_user": false,
                    "timestamp": "2024-05-01T10:15:00",
                    "translated": null
                },
                {
                    "id": 2,
                    "content": "Yo quiero un agua",
                    "is_user": true,
                    "timestamp": "2024-05-01T10:16:00",
                    "translated": null,
                    "errors": [
                        { "error_text": "Yo quiero", "correction": "Quisiera", "error_type": "vocabulary" }
                    ]
                },
                {
                    "id": 3,
                    "content": "Claro, enseguida.",
                    "is_user": false,
                    "timestamp": "2024-05-01T10:16:02",
                    "translated": "Of course, right away."
                }
            ]
        })))
        .mount(&server)
        .await;
    let http = HttpChatApi::new(&server.uri()).unwrap();
    let mut session = restaurant_session();
    start(&mut session, &http).await;

    // A failed send leaves a failed entry and a synthetic error reply behind.
    let request = controller::send_message(&mut session, "Yo quiero un agua").unwrap();
    controller::drive(&mut session, &RejectingApi, request).await;
    assert_eq!(session.messages().len(), 3);

    let request = controller::reload_history(&mut session).unwrap();
    assert!(session.is_busy());
    controller::drive(&mut session, &http, request).await;

    assert!(!session.is_busy());
    assert_eq!(session.status(), None);
    let entries = session.messages().entries();
    let ids: Vec<&str> = entries.iter().map(|e| e.message.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3"]);
    assert!(entries.iter().all(|e| e.delivery == Delivery::Confirmed));
    assert!(!entries
        .iter()
        .any(|e| e.message.content == SEND_FAILURE_TEXT || e.message.id.is_local()));

    let user = &entries[1].message;
    assert!(user.is_user);
    assert_eq!(user.errors.len(), 1);
    assert_eq!(user.errors[0].correction, "Quisiera");
    assert_eq!(user.errors[0].error_type.as_deref(), Some("vocabulary"));
    assert_eq!(entries[0].message.translated, None);

    let view = chat_view(&session);
    assert_eq!(view.messages[1].errors.len(), 1);
    assert_eq!(
        view.messages[2].translation.as_deref(),
        Some("Of course, right away.")
    );
}

#[tokio::test]
async fn unreachable_server_fails_the_start_and_releases_busy() {
    // Pooled mock servers keep listening after drop, so take a port that
    // was bound and released instead.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let api = HttpChatApi::new(&format!("http://127.0.0.1:{port}")).unwrap();

    assert!(matches!(
        api.start_conversation("restaurant").await,
        Err(ApiError::Request(_))
    ));

    let mut session = restaurant_session();
    let request = controller::select_scenario(&mut session, "restaurant").unwrap();
    controller::drive(&mut session, &api, request).await;
    assert!(!session.is_busy());
    assert!(session.active_conversation().is_none());
    assert_eq!(session.messages().notice(), Some(START_FAILURE_TEXT));
    assert!(session.messages().is_empty());
}
