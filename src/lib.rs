// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod highlight;
pub mod history;
pub mod metrics;
pub mod narrative;
pub mod parser;
pub mod probability;
pub mod rolling;
pub mod trend;
pub mod volatility;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::category::{categorize, WeightCategory};
pub use crate::engine::{calculate_all_metrics, WindowMetrics, WindowSpec};
pub use crate::error::{Result, ScoringError};
pub use crate::event::WeightedEvent;
pub use crate::highlight::highlight_cie;
pub use crate::probability::{calculate_batch, calculate_immediate, WindowType};
pub use crate::trend::{TrendLabel, TrendResult};

use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api::AppState;
use crate::config::EngineConfig;
use crate::metrics::Metrics;

/// Build the full service router: API routes, optional `/metrics`, optional CORS.
pub fn app(config: &EngineConfig) -> anyhow::Result<Router> {
    let state = AppState::new(config.assessments.history_limit);
    let mut router = api::router(state);

    if config.server.metrics {
        let metrics = Metrics::init(config.assessments.history_limit)?;
        router = router.merge(metrics.router());
        info!("prometheus metrics exposed at /metrics");
    }

    if config.server.cors {
        router = router.layer(CorsLayer::very_permissive());
    }

    Ok(router)
}
