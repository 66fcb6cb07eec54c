#![forbid(unsafe_code)]
#![doc = r#"
Chat2Flow

Forward chat messages to a hosted Langflow flow and hand the reply text back to a chat UI.

Crate highlights
- Library: a flow-service client (`FlowClient::run_flow`) and reply extraction
  (`extract_reply_text`) usable without the server.
- HTTP server (in `server`): `POST /api/chat` (run the configured flow) and `/status`.
- Configuration: one flow selected at startup via `FlowConfig::from_env`.

Modules
- `models`: Chat request/response and run-flow request types.
- `client`: Flow service HTTP client and the `FlowRunner` seam used by handlers.
- `extract`: Checked traversal of the nested run result down to the reply text.
- `config`: Environment-driven configuration with startup validation.
- `error`: Error taxonomy and the HTTP error boundary.
- `server`: Axum router/handlers (the binary uses this).
- `util`: Shared helpers (tracing, env, HTTP client, CORS, app state).
"#]

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod server;
pub mod util;

pub use crate::client::{ConfiguredFlow, FlowClient, FlowRunner};
pub use crate::config::FlowConfig;
pub use crate::error::{ApiError, FlowError};
pub use crate::extract::{extract_reply_text, ShapeError};

// Re-export model namespaces for convenience (downstream users can do `use chat2flow::chat`).
pub use crate::models::{chat, flow};
