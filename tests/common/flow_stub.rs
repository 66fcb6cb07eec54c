#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use http::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One request as received by the stub flow service.
#[derive(Clone, Debug)]
pub struct RecordedRun {
    pub service_id: String,
    pub flow_id: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

/// In-process stand-in for the hosted flow service, bound to an ephemeral port.
#[derive(Clone)]
pub struct FlowStub {
    base_url: String,
    calls: Arc<AtomicUsize>,
    runs: Arc<Mutex<Vec<RecordedRun>>>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[derive(Clone)]
pub enum FlowStubResponse {
    Json(serde_json::Value),
    Error {
        status: StatusCode,
        body: serde_json::Value,
    },
    Raw {
        status: StatusCode,
        body: String,
    },
    /// Answer 200 with `body`, but only after `delay`.
    Slow {
        delay: Duration,
        body: serde_json::Value,
    },
}

#[derive(Clone)]
struct StubState {
    response: FlowStubResponse,
    calls: Arc<AtomicUsize>,
    runs: Arc<Mutex<Vec<RecordedRun>>>,
}

impl FlowStub {
    pub async fn start(response: FlowStubResponse) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            response,
            calls: calls.clone(),
            runs: runs.clone(),
        });

        let router = Router::new()
            .route("/lf/:service_id/api/v1/run/:flow_id", post(run_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub flow service");
        let addr = listener.local_addr().expect("stub flow service local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Stub flow service error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        FlowStub {
            base_url: format!("http://{}", addr),
            calls,
            runs,
            shutdown: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn take_runs(&self) -> Vec<RecordedRun> {
        let mut guard = self.runs.lock().expect("lock stub runs");
        guard.drain(..).collect()
    }
}

impl Drop for FlowStub {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.shutdown.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
    }
}

async fn run_handler(
    State(state): State<Arc<StubState>>,
    Path((service_id, flow_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let header = |name: http::header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    if let Ok(mut guard) = state.runs.lock() {
        guard.push(RecordedRun {
            service_id,
            flow_id,
            authorization: header(http::header::AUTHORIZATION),
            content_type: header(http::header::CONTENT_TYPE),
            body,
        });
    }

    match &state.response {
        FlowStubResponse::Json(v) => (StatusCode::OK, v.to_string()),
        FlowStubResponse::Error { status, body } => (*status, body.to_string()),
        FlowStubResponse::Raw { status, body } => (*status, body.clone()),
        FlowStubResponse::Slow { delay, body } => {
            tokio::time::sleep(*delay).await;
            (StatusCode::OK, body.to_string())
        }
    }
}

/// A run result in the shape the hosted flow service returns for chat flows.
pub fn sample_run_result(text: &str) -> serde_json::Value {
    serde_json::json!({
        "session_id": "d4ed471b-59c3-4c28-8a98-50d839de302a",
        "outputs": [{
            "inputs": {"input_value": "hello"},
            "outputs": [{
                "results": {"message": {"text": text}},
                "artifacts": {"message": text, "sender": "Machine"},
                "outputs": {
                    "message": {
                        "message": {"text": text, "sender": "Machine"},
                        "type": "object"
                    }
                },
                "component_display_name": "Chat Output"
            }]
        }]
    })
}
