//! Service configuration: defaults, then `config.toml`, then `PIZZA_*`
//! environment variables (`PIZZA_METRICS__URL=...`).

use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::metrics::SinkConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP bind address, e.g. 0.0.0.0:3000
    pub listen: String,
    pub metrics: MetricsConfig,
    /// Administrator seeded into the store at startup
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Push endpoint; reporting is disabled when absent
    pub url: Option<Url>,
    pub user_id: String,
    pub api_key: String,
    /// Tag written as `source=` on every line
    pub source: String,
    pub period_ms: u64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("PIZZA").separator("__"));
        Self::from_builder(builder)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("listen", "0.0.0.0:3000")?
            .set_default("metrics.user_id", "")?
            .set_default("metrics.api_key", "")?
            .set_default("metrics.source", "pizza-service")?
            .set_default("metrics.period_ms", 1000_i64)?
            .set_default("metrics.timeout_ms", 10_000_i64)?
            .set_default("admin.name", "admin")?
            .set_default("admin.email", "a@jwt.com")?
            .set_default("admin.password", "admin")?)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let cfg: Self = builder.build()?.try_deserialize()?;
        if cfg.metrics.period_ms == 0 {
            bail!("metrics.period_ms must be greater than zero");
        }
        Ok(cfg)
    }
}

impl MetricsConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Sink settings, or `None` when no URL is configured.
    pub fn sink(&self) -> Option<SinkConfig> {
        let url = self.url.clone()?;
        Some(SinkConfig {
            url,
            user_id: self.user_id.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}
