use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod handlers;
mod metrics;
mod middleware;
mod server;

use crate::db::Role;
use crate::metrics::{scheduler, Collector, MetricStore, Reporter, SysinfoHost};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Users, sessions, franchises, menu and orders.
    pub db: db::Database,

    /// Counters and gauges; handlers mutate, the reporter reads.
    pub metrics: Arc<MetricStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::AppConfig::load().context("load configuration")?;

    // ── 1. Metric store + reporter ───────────────────────────────
    let metrics = Arc::new(MetricStore::new());

    match config.metrics.sink() {
        Some(sink) => {
            tracing::info!(
                url = %sink.url,
                period_ms = config.metrics.period_ms,
                source = %config.metrics.source,
                "starting metrics reporter"
            );
            let reporter = Reporter::new(sink).context("build metrics HTTP client")?;
            let collector = Collector::new(
                metrics.clone(),
                Box::new(SysinfoHost::new()),
                config.metrics.source.clone(),
            );
            // Detached: the loop ends with the runtime.
            let _ = scheduler::spawn(collector, reporter, config.metrics.period());
        }
        None => tracing::warn!("metrics.url not set; metrics push disabled"),
    }

    // ── 2. Seed the administrator ────────────────────────────────
    let db = db::Database::new();
    db.add_user(
        &config.admin.name,
        &config.admin.email,
        &config.admin.password,
        vec![Role::Admin],
    )
    .context("seed admin user")?;

    // ── 3. Build router and serve ────────────────────────────────
    let state = Arc::new(AppState { db, metrics });
    let app = server::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("bind {}", config.listen))?;
    tracing::info!(addr = %config.listen, "server listening");

    axum::serve(listener, app).await.context("server exited with error")?;
    Ok(())
}
