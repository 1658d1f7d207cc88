// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod api;
pub mod client;
pub mod components;
pub mod config;
pub mod fetch;
pub mod format;
pub mod metrics;
pub mod models;
pub mod page;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::client::{DynResearchApi, HttpResearchApi, ResearchApi};
pub use crate::config::DeskConfig;
pub use crate::page::{HomePage, PageSettings};

use std::sync::Arc;

use axum::Router;
use tracing::info;

/// Builds the full desk router against `api`: page routes, `/static`, and
/// `/metrics` when a recorder handle is supplied.
pub fn build_app(
    cfg: &DeskConfig,
    api: DynResearchApi,
    metrics: Option<&crate::metrics::Metrics>,
) -> Router {
    let settings = PageSettings::from(cfg);
    let state = AppState::new(HomePage::new(api, settings), settings);
    let router = create_router(state, &cfg.static_dir);
    match metrics {
        Some(m) => router.merge(m.router()),
        None => router,
    }
}

/// Same as [`build_app`] but talks HTTP to `cfg.api_base_url`.
pub fn app(
    cfg: &DeskConfig,
    metrics: Option<&crate::metrics::Metrics>,
) -> anyhow::Result<Router> {
    let api: DynResearchApi = Arc::new(HttpResearchApi::new(&cfg.api_base_url)?);
    info!(target: "desk::api", base_url = %cfg.api_base_url, "research backend configured");
    Ok(build_app(cfg, api, metrics))
}
