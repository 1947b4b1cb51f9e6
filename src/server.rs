use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use http::{header, HeaderMap, StatusCode};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::RelayError;
use crate::models::chat::ChatCompletionRequest;
use crate::session::StreamSession;
use crate::translate::{completion_response, flatten_messages};
use crate::util::{bearer_token, AppState};

/// Build the Axum router with the OpenAI-compatible surface.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Service status endpoint exposing the configured model names.
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let mut models = state.config.model_names();
    models.sort();
    Json(serde_json::json!({
        "name": "chat2anakin",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": ["/status", "/v1/chat/completions"],
        "models": models,
    }))
}

/// Handle `POST /v1/chat/completions`.
///
/// Validates the request, resolves the model mapping, then dispatches on
/// the `stream` flag. All input validation happens before any outbound call.
async fn chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Response {
    // Map extractor rejections into the relay's own 400 JSON error shape.
    let Json(req) = match body {
        Ok(json) => json,
        Err(rejection) => {
            return RelayError::InvalidBody(rejection.body_text()).into_response()
        }
    };

    if req.messages.is_empty() {
        return RelayError::EmptyMessages.into_response();
    }

    let Some(app_id) = state.config.app_id(&req.model) else {
        return RelayError::UnknownModel(req.model).into_response();
    };

    let api_key = bearer_token(&headers);
    let content = flatten_messages(&req.messages);

    if req.stream.unwrap_or(false) {
        if state.config.is_single_shot(&req.model) {
            single_shot_stream(&state, &api_key, app_id, &content, &req.model).await
        } else {
            relay_stream(state, api_key, app_id, content, &req.model)
        }
    } else {
        match state.client.send_message(&api_key, app_id, &content).await {
            Ok(reply) => Json(completion_response(reply, &req.model)).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// Streaming path: open a session, hand the upstream fetch to its own task,
/// and return the session's receiver as the response body.
///
/// The body stream stays open until the session's fire-once gate closes the
/// channel, so the inbound exchange completes exactly when the session
/// signals, never before the final `[DONE]` or `error:` frame is written.
fn relay_stream(
    state: AppState,
    api_key: String,
    app_id: u64,
    content: String,
    model: &str,
) -> Response {
    let (session, rx) = StreamSession::open(model);
    tracing::debug!(session = session.id(), app_id, "opening upstream stream");

    tokio::spawn(async move {
        state
            .client
            .relay_stream(&api_key, app_id, &content, session)
            .await;
    });

    event_stream_response(Body::from_stream(
        UnboundedReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>),
    ))
}

/// Compatibility shim for models that reject `stream=true` upstream: one
/// blocking backend call, served back as a single-chunk event stream.
///
/// The backend call runs before any response header is committed, so a
/// failure here is still an ordinary JSON error.
async fn single_shot_stream(
    state: &AppState,
    api_key: &str,
    app_id: u64,
    content: &str,
    model: &str,
) -> Response {
    let reply = match state.client.send_message(api_key, app_id, content).await {
        Ok(reply) => reply,
        Err(e) => return e.into_response(),
    };

    let (session, rx) = StreamSession::open(model);
    let payload = serde_json::json!({ "content": reply }).to_string();
    session.on_event(&payload);
    session.on_complete();

    event_stream_response(Body::from_stream(
        UnboundedReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>),
    ))
}

fn event_stream_response(body: Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
