//! Network worker: runs controller requests off the UI loop.
//!
//! Requests arrive over an unbounded channel; each one is dispatched in its
//! own task so a slow call never delays the others. Outcomes go back to the
//! main loop as `AppEvent::Api`, where they are settled on the session.

use std::sync::Arc;

use linguachat_core::api::{dispatch, ApiError, ApiRequest, ChatApi};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::event::AppEvent;

/// Spawns the worker. It runs until every request sender is dropped.
pub fn spawn_network_worker(
    api: Arc<dyn ChatApi>,
    mut rx: UnboundedReceiver<ApiRequest>,
    event_tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let api = Arc::clone(&api);
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let outcome = run_request(api, request).await;
                let _ = event_tx.send(AppEvent::Api(Box::new(outcome)));
            });
        }
        debug!("network worker stopped");
    });
}

/// Dispatches `request` in a child task. A panic in that task becomes a
/// failure outcome for the same request, so the session always settles.
async fn run_request(
    api: Arc<dyn ChatApi>,
    request: ApiRequest,
) -> linguachat_core::api::ApiOutcome {
    let retained = request.clone();
    let handle = tokio::spawn(async move { dispatch(api.as_ref(), request).await });
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(request = retained.label(), "request task failed: {e}");
            retained.into_failure(ApiError::Aborted(e.to_string()))
        }
    }
}
