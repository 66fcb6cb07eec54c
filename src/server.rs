use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use http::StatusCode;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::extract::{extract_reply_text, has_outputs};
use crate::models::{ChatRequest, ChatResponse};
use crate::util::{cors_layer_from_env, AppState};

/// Body returned for `GET /api/chat`.
pub const GET_NOT_SUPPORTED_MESSAGE: &str = "GET method not supported on this endpoint";

/// Build the Axum router with `/api/chat` and `/status`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/api/chat", post(chat).get(chat_get_not_supported))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer_from_env())
}

/// Service status endpoint listing the available routes.
async fn status() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "chat2flow",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": ["/status", "/api/chat"]
    }))
}

/// Forward one chat message to the configured flow and return the reply.
///
/// - Non-streaming with `outputs` in the result: `{ "message": <reply text> }`
/// - Streaming, or no `outputs`: the flow result as-is
///
/// The body is parsed by hand so that undecodable JSON is reported like any
/// other run failure (500) rather than as an extractor rejection.
async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let req: ChatRequest = serde_json::from_slice(&body).map_err(ApiError::InvalidBody)?;
    let input = req.input().ok_or(ApiError::MissingInput)?;
    let stream = req.wants_stream();

    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        %request_id,
        input_type = %req.input_type,
        output_type = %req.output_type,
        stream,
        "running flow"
    );

    let result = state.runner.run(input).await?;
    tracing::debug!(%request_id, response = %result, "flow response");

    if !stream && has_outputs(&result) {
        let text = extract_reply_text(&result)?;
        return Ok((StatusCode::OK, Json(ChatResponse::reply(text))).into_response());
    }

    Ok((StatusCode::OK, Json(result)).into_response())
}

async fn chat_get_not_supported() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ChatResponse::reply(GET_NOT_SUPPORTED_MESSAGE)),
    )
        .into_response()
}
