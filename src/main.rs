use anyhow::Context;
use chat2flow::config::FlowConfig;
use chat2flow::server::build_router;
use chat2flow::util::{env_bind_addr, init_tracing, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = FlowConfig::from_env().context("invalid flow configuration")?;
    tracing::info!(
        base_url = %config.base_url,
        flow_id = %config.flow_id,
        service_id = %config.service_id,
        tweaks = config.tweaks.len(),
        timeout = ?config.http_timeout,
        transport_retries = config.transport_retries,
        "Flow configuration loaded"
    );
    if chat2flow::models::has_overrides(&config.tweaks) {
        tracing::info!("Per-node tweaks will be sent with every run");
    }

    let state = AppState::from_config(&config).context("failed to build HTTP client")?;
    let app = build_router(Arc::new(state));

    let addr = env_bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Chat2Flow listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
