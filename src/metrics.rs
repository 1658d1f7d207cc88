// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_described();
        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    }
}

/// One-time registration so the series show up on /metrics before first use.
fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "desk_api_requests_total",
            "Calls to the research backend, by operation and outcome."
        );
        describe_histogram!(
            "desk_api_request_ms",
            "Research backend call latency in milliseconds."
        );
        describe_counter!(
            "desk_control_refused_total",
            "Status panel triggers refused because the control was disabled."
        );
    });
}

pub(crate) fn record_api_call(op: &'static str, ok: bool, ms: f64) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("desk_api_requests_total", "op" => op, "outcome" => outcome).increment(1);
    histogram!("desk_api_request_ms", "op" => op).record(ms);
}

pub(crate) fn record_control_refused(action: &'static str) {
    counter!("desk_control_refused_total", "action" => action).increment(1);
}
