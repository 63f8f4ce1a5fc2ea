use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use narrative_engine::config::{EngineConfig, LogSection};

/// `RUST_LOG` wins over the configured filter; JSON output when `[log] json = true`.
fn init_tracing(log: &LogSection) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));

    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let config = EngineConfig::load_default().context("loading engine config")?;
    init_tracing(&config.log);

    let router = narrative_engine::app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "narrative engine listening");

    axum::serve(listener, router).await.context("serving http")?;
    Ok(())
}
