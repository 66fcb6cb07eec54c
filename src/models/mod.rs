//! Data models for the chat endpoint and the flow service.
//!
//! This module groups two submodules:
//! - `chat`: The request/response contract between the chat UI and `/api/chat`.
//! - `flow`: The outbound run-flow request body and the opaque run result.
//!
//! Pulling the reply text out of a run result is implemented in `crate::extract`.

pub mod chat;
pub mod flow;

pub use chat::{ChatRequest, ChatResponse};
pub use flow::{has_overrides, FlowRunResult, RunFlowRequest, Tweaks};
