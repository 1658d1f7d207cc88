//! Research Desk: binary entrypoint.
//! Loads config, wires the research backend client into the page session,
//! and serves the desk over Axum.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use research_desk::{config::DeskConfig, metrics::Metrics};

/// Compact logs by default; `DESK_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("research_desk=info,warn"));

    let json = std::env::var("DESK_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DeskConfig::load().context("loading desk config")?;
    let metrics = Metrics::install()?;
    let app = research_desk::app(&cfg, Some(&metrics))?;

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    info!(
        target: "desk::api",
        addr = %cfg.bind_addr,
        backend = %cfg.api_base_url,
        "research desk listening"
    );

    axum::serve(listener, app).await.context("serving desk")?;
    Ok(())
}
