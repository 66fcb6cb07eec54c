//! HTTP client for the hosted flow service.
//!
//! One call per run: `POST {base_url}/lf/{service_id}/api/v1/run/{flow_id}` with a
//! bearer token and a `{ "input_value": ... }` body. Non-2xx answers become
//! [`FlowError::Upstream`] with the status and raw body embedded in the message.

use async_trait::async_trait;
use http::header;
use serde::Serialize;
use std::time::Duration;

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::models::{FlowRunResult, RunFlowRequest, Tweaks};

/// Runs the configured flow for a single user input.
///
/// The chat handler only talks to this trait, which keeps the choice of flow
/// (ids, tweaks) out of request handling.
#[async_trait]
pub trait FlowRunner: Send + Sync {
    async fn run(&self, input_value: &str) -> Result<FlowRunResult, FlowError>;
}

#[derive(Clone)]
pub struct FlowClient {
    http: reqwest::Client,
    base_url: String,
    application_token: String,
    transport_retries: u32,
}

impl std::fmt::Debug for FlowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowClient")
            .field("base_url", &self.base_url)
            .field("transport_retries", &self.transport_retries)
            .finish()
    }
}

impl FlowClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        application_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            application_token: application_token.into(),
            transport_retries: 0,
        }
    }

    /// Retry connection-level failures up to `retries` extra times.
    /// Upstream error statuses are never retried.
    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path of the run endpoint for a flow in a given service/tenant.
    pub fn run_endpoint(flow_id: &str, service_id: &str) -> String {
        format!("/lf/{service_id}/api/v1/run/{flow_id}")
    }

    /// Run a flow with no per-node overrides.
    pub async fn run_flow(
        &self,
        flow_id: &str,
        service_id: &str,
        input_value: &str,
    ) -> Result<FlowRunResult, FlowError> {
        self.run_flow_with_tweaks(flow_id, service_id, input_value, &Tweaks::new())
            .await
    }

    pub async fn run_flow_with_tweaks(
        &self,
        flow_id: &str,
        service_id: &str,
        input_value: &str,
        tweaks: &Tweaks,
    ) -> Result<FlowRunResult, FlowError> {
        let endpoint = Self::run_endpoint(flow_id, service_id);
        self.post(&endpoint, &RunFlowRequest::new(input_value, tweaks))
            .await
    }

    /// POST a JSON body to `endpoint` (relative to the base URL) and decode the JSON answer.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<FlowRunResult, FlowError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut attempt = 0u32;
        loop {
            match self.send_once(&url, body).await {
                Err(e) if e.is_transport() && attempt < self.transport_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "flow upstream send attempt failed");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<FlowRunResult, FlowError> {
        let resp = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.application_token)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            return Err(FlowError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body: render_body(&bytes),
            });
        }

        serde_json::from_slice(&bytes).map_err(FlowError::Decode)
    }
}

/// Compact JSON when the body parses, otherwise the raw text.
fn render_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(v) => v.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Delay before retry number `attempt` (1-based): 100ms, 200ms, 400ms, ...
fn backoff(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    Duration::from_millis(100u64 << exp)
}

/// The flow this service was configured to run: client plus fixed ids and tweaks.
#[derive(Debug, Clone)]
pub struct ConfiguredFlow {
    client: FlowClient,
    flow_id: String,
    service_id: String,
    tweaks: Tweaks,
}

impl ConfiguredFlow {
    pub fn new(
        client: FlowClient,
        flow_id: impl Into<String>,
        service_id: impl Into<String>,
        tweaks: Tweaks,
    ) -> Self {
        Self {
            client,
            flow_id: flow_id.into(),
            service_id: service_id.into(),
            tweaks,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &FlowConfig) -> Self {
        let client = FlowClient::new(http, &config.base_url, &config.application_token)
            .with_transport_retries(config.transport_retries);
        Self::new(
            client,
            &config.flow_id,
            &config.service_id,
            config.tweaks.clone(),
        )
    }
}

#[async_trait]
impl FlowRunner for ConfiguredFlow {
    async fn run(&self, input_value: &str) -> Result<FlowRunResult, FlowError> {
        self.client
            .run_flow_with_tweaks(&self.flow_id, &self.service_id, input_value, &self.tweaks)
            .await
    }
}
