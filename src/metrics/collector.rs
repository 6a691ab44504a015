use std::sync::Arc;

use super::builder::{MetricValue, SeriesBuilder};
use super::error::CollectError;
use super::store::MetricStore;
use super::system::{self, HostStats};

/// Turns the current store state plus fresh host readings into one batch.
pub struct Collector {
    store: Arc<MetricStore>,
    host: Box<dyn HostStats>,
    source: String,
}

impl Collector {
    pub fn new(store: Arc<MetricStore>, host: Box<dyn HostStats>, source: impl Into<String>) -> Self {
        Self {
            store,
            host,
            source: source.into(),
        }
    }

    /// Builds the full measurement set for one tick.
    ///
    /// Host readings are taken first so a failure there discards the whole
    /// tick. Store fields are read group by group, so a purchase landing
    /// between two groups shows up in one and not the other.
    pub fn collect(&mut self) -> Result<SeriesBuilder, CollectError> {
        let (total_mem, free_mem) = self.host.memory()?;
        let (load_one, cores) = self.host.load()?;

        let mut buf = SeriesBuilder::new(self.source.as_str());
        self.http_metrics(&mut buf);
        buf.add_measurement(
            "system_memory_usage",
            &[],
            MetricValue::Fixed2(system::memory_usage_percent(total_mem, free_mem)),
        );
        buf.add_measurement(
            "system_cpu_usage",
            &[],
            system::cpu_usage_percent(load_one, cores),
        );
        buf.add_measurement("active_users", &[], self.store.active_users());
        self.purchase_metrics(&mut buf);
        self.auth_metrics(&mut buf);

        Ok(buf)
    }

    fn http_metrics(&self, buf: &mut SeriesBuilder) {
        for (method, count) in self.store.http_counts().entries() {
            buf.add_measurement("http_requests_total", &[("method", method)], count);
        }
    }

    fn purchase_metrics(&self, buf: &mut SeriesBuilder) {
        let p = self.store.purchase_counts();
        buf.add_measurement("pizzas_sold", &[], p.sold);
        buf.add_measurement("revenue_generated", &[], p.revenue);
        buf.add_measurement("creation_latency", &[], p.creation_latency);
        buf.add_measurement("creation_failures", &[], p.creation_failures);
    }

    fn auth_metrics(&self, buf: &mut SeriesBuilder) {
        let a = self.store.auth_counts();
        buf.add_measurement("auth_attempts_total", &[], a.total);
        buf.add_measurement("auth_attempts_successful", &[], a.successful);
        buf.add_measurement("auth_attempts_failed", &[], a.failed);
    }
}
