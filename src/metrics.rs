use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// The global recorder can be installed once per process; routers built
/// later (tests, reloads) share the same handle.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured history limit.
    pub fn init(history_limit: usize) -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();

        gauge!("engine_history_limit").set(history_limit as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One calculation served, labelled by operation.
pub fn record_calculation(op: &'static str) {
    counter!("engine_calculations_total", "op" => op).increment(1);
}

/// One rejected request, labelled by operation and error kind.
pub fn record_rejection(op: &'static str, kind: &'static str) {
    counter!("engine_rejections_total", "op" => op, "kind" => kind).increment(1);
}

pub fn record_assessment_change(change: &'static str) {
    counter!("engine_assessment_changes_total", "change" => change).increment(1);
}
