//! Error types for the flow client and the chat endpoint.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use thiserror::Error;

use crate::extract::ShapeError;
use crate::models::ChatResponse;

/// Message returned with every 500 from `/api/chat`.
pub const RUN_FAILED_MESSAGE: &str = "Error running flow";
/// Message returned when the request carries no usable `inputValue`.
pub const MISSING_INPUT_MESSAGE: &str = "Input value is required";

/// Failures of a single flow-service call.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The flow service answered with a non-2xx status.
    #[error("{status} {reason} - {body}")]
    Upstream {
        status: u16,
        reason: String,
        body: String,
    },
    /// The flow service could not be reached or the connection failed mid-request.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// The flow service answered 2xx with a body that is not JSON.
    #[error("flow service returned invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FlowError {
    pub fn is_transport(&self) -> bool {
        matches!(self, FlowError::Transport(_))
    }
}

/// Errors surfaced by the `/api/chat` handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", MISSING_INPUT_MESSAGE)]
    MissingInput,
    #[error("invalid chat request body: {0}")]
    InvalidBody(#[source] serde_json::Error),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::MissingInput => ChatResponse::reply(MISSING_INPUT_MESSAGE),
            other => {
                tracing::error!(error = %other, "Error running flow");
                ChatResponse::failure(RUN_FAILED_MESSAGE, other.to_string())
            }
        };
        (status, Json(body)).into_response()
    }
}
