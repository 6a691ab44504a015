use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use super::latency::{self, LatencySummary, HIST_HIGH, HIST_LOW, HIST_SIGFIG};

// ─── HTTP methods ────────────────────────────────────────────────

/// Methods with their own request counter, in emission order.
pub const TRACKED_METHODS: [&str; 4] = ["GET", "POST", "DELETE", "PUT"];

/// Label value of the aggregate request counter.
pub const ALL_METHODS: &str = "all";

// ─── Public types ────────────────────────────────────────────────

/// Process-wide counters and gauges.
///
/// Constructed once in `main` and shared through `Arc`; request handlers
/// call the `increment_*` / `record_*` methods, the collector reads
/// [`MetricStore::snapshot`] once per tick. None of the operations can
/// fail and none of them wait on I/O.
pub struct MetricStore {
    inner: Mutex<Inner>,
}

/// Per-method request counts. `all` always equals the sum of the others.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct HttpCounts {
    pub get: u64,
    pub post: u64,
    pub delete: u64,
    pub put: u64,
    pub all: u64,
}

impl HttpCounts {
    /// `(label, count)` pairs in emission order, aggregate last.
    pub fn entries(&self) -> [(&'static str, u64); 5] {
        [
            (TRACKED_METHODS[0], self.get),
            (TRACKED_METHODS[1], self.post),
            (TRACKED_METHODS[2], self.delete),
            (TRACKED_METHODS[3], self.put),
            (ALL_METHODS, self.all),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct AuthCounts {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct PurchaseCounts {
    pub sold: u64,
    pub revenue: f64,
    /// Latency of the most recent purchase (seconds), overwritten each time
    pub creation_latency: f64,
    pub creation_failures: u64,
}

/// Read-only copy of the whole store.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub http_requests: HttpCounts,
    pub active_users: i64,
    pub auth_attempts: AuthCounts,
    pub purchases: PurchaseCounts,
    pub creation_latency_summary: LatencySummary,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    http: HttpCounts,
    active_users: i64,
    auth: AuthCounts,
    purchases: PurchaseCounts,
    latency_hist: Option<Histogram<u64>>,
}

// ─── MetricStore impl ────────────────────────────────────────────

impl MetricStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Counts one inbound request. Untracked methods are ignored so the
    /// aggregate stays equal to the per-method sum.
    pub fn increment_http_request(&self, method: &str) {
        let mut inner = self.inner.lock();
        let slot = match method {
            "GET" => &mut inner.http.get,
            "POST" => &mut inner.http.post,
            "DELETE" => &mut inner.http.delete,
            "PUT" => &mut inner.http.put,
            _ => return,
        };
        *slot += 1;
        inner.http.all += 1;
    }

    pub fn increment_active_users(&self) {
        self.inner.lock().active_users += 1;
    }

    /// May go negative if logouts outnumber logins.
    pub fn decrement_active_users(&self) {
        self.inner.lock().active_users -= 1;
    }

    pub fn increment_auth_attempt(&self) {
        self.inner.lock().auth.total += 1;
    }

    pub fn increment_auth_success(&self) {
        self.inner.lock().auth.successful += 1;
    }

    pub fn increment_auth_failure(&self) {
        self.inner.lock().auth.failed += 1;
    }

    /// One purchase: `sold += 1`, `revenue += cost`, latency overwritten.
    pub fn record_purchase(&self, latency_secs: f64, cost: f64, success: bool) {
        self.track_purchase(1, cost, latency_secs, success);
    }

    /// An order of `items` pizzas.
    pub fn track_purchase(&self, items: u64, cost: f64, latency_secs: f64, success: bool) {
        let mut inner = self.inner.lock();
        inner.purchases.sold += items;
        inner.purchases.revenue += cost;
        inner.purchases.creation_latency = latency_secs;
        if !success {
            inner.purchases.creation_failures += 1;
        }
        if let Some(hist) = inner.latency_hist.as_mut() {
            let _ = hist.record(latency::to_micros(latency_secs));
        }
    }

    pub fn http_counts(&self) -> HttpCounts {
        self.inner.lock().http
    }

    pub fn active_users(&self) -> i64 {
        self.inner.lock().active_users
    }

    pub fn auth_counts(&self) -> AuthCounts {
        self.inner.lock().auth
    }

    pub fn purchase_counts(&self) -> PurchaseCounts {
        self.inner.lock().purchases
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock();
        MetricsSnapshot {
            http_requests: inner.http,
            active_users: inner.active_users,
            auth_attempts: inner.auth,
            purchases: inner.purchases,
            creation_latency_summary: inner
                .latency_hist
                .as_ref()
                .map(LatencySummary::from_histogram)
                .unwrap_or_else(LatencySummary::empty),
        }
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn new() -> Self {
        Self {
            http: HttpCounts::default(),
            active_users: 0,
            auth: AuthCounts::default(),
            purchases: PurchaseCounts::default(),
            // Bounds are constants; `None` only if hdrhistogram rejects them.
            latency_hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn http_counters_track_each_method_and_total() {
        let store = MetricStore::new();
        let calls = ["GET", "GET", "POST", "PUT", "GET", "DELETE", "POST"];
        for m in calls {
            store.increment_http_request(m);
        }

        let counts = store.http_counts();
        assert_eq!(counts.all, calls.len() as u64);
        assert_eq!(counts.get, 3);
        assert_eq!(counts.post, 2);
        assert_eq!(counts.put, 1);
        assert_eq!(counts.delete, 1);
    }

    #[test]
    fn untracked_methods_leave_counters_untouched() {
        let store = MetricStore::new();
        store.increment_http_request("PATCH");
        store.increment_http_request("OPTIONS");
        store.increment_http_request("get");
        assert_eq!(store.http_counts(), HttpCounts::default());
    }

    #[test]
    fn purchases_accumulate_with_last_latency() {
        let store = MetricStore::new();
        store.record_purchase(0.5, 10.0, true);
        store.record_purchase(0.2, 2.5, false);
        store.record_purchase(0.9, 0.5, false);

        let p = store.purchase_counts();
        assert_eq!(p.sold, 3);
        assert_eq!(p.revenue, 13.0);
        assert_eq!(p.creation_latency, 0.9);
        assert_eq!(p.creation_failures, 2);
    }

    #[test]
    fn track_purchase_adds_item_count() {
        let store = MetricStore::new();
        store.track_purchase(3, 0.003, 0.1, true);
        store.track_purchase(0, 0.0, 0.4, false);

        let p = store.purchase_counts();
        assert_eq!(p.sold, 3);
        assert_eq!(p.creation_failures, 1);
        assert_eq!(p.creation_latency, 0.4);

        let summary = store.snapshot().creation_latency_summary;
        assert_eq!(summary.count, 2);
        assert!(summary.max_secs >= 0.39);
    }

    #[test]
    fn auth_counters_are_independent() {
        let store = MetricStore::new();
        store.increment_auth_success();
        store.increment_auth_success();
        store.increment_auth_failure();

        assert_eq!(
            store.auth_counts(),
            AuthCounts {
                total: 0,
                successful: 2,
                failed: 1
            }
        );

        store.increment_auth_attempt();
        assert_eq!(store.auth_counts().total, 1);
        assert_eq!(store.auth_counts().successful, 2);
    }

    #[test]
    fn active_users_can_go_negative() {
        let store = MetricStore::new();
        store.increment_active_users();
        store.decrement_active_users();
        store.decrement_active_users();
        assert_eq!(store.active_users(), -1);
    }

    #[test]
    fn concurrent_increments_keep_total_consistent() {
        let store = Arc::new(MetricStore::new());
        std::thread::scope(|s| {
            for method in TRACKED_METHODS {
                let store = store.clone();
                s.spawn(move || {
                    for _ in 0..1_000 {
                        store.increment_http_request(method);
                        let c = store.http_counts();
                        assert_eq!(c.all, c.get + c.post + c.put + c.delete);
                    }
                });
            }
        });

        let c = store.http_counts();
        assert_eq!(c.all, 4_000);
        assert_eq!(c.get, 1_000);
        assert_eq!(c.delete, 1_000);
    }
}
