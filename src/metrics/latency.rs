use hdrhistogram::Histogram;
use serde::Serialize;

/// HdrHistogram range: 1 μs → 5 min, 3 significant figures
pub const HIST_LOW: u64 = 1;
pub const HIST_HIGH: u64 = 300_000_000;
pub const HIST_SIGFIG: u8 = 3;

/// Aggregate view of every purchase latency since process start.
/// Only served locally; the pushed batch keeps the last-write scalar.
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min_secs: f64,
    pub max_secs: f64,
    pub mean_secs: f64,
    pub p50_secs: f64,
    pub p95_secs: f64,
    pub p99_secs: f64,
}

impl LatencySummary {
    /// Histogram values are microseconds.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            count: hist.len(),
            min_secs: to_secs(hist.min()),
            max_secs: to_secs(hist.max()),
            mean_secs: hist.mean() / 1_000_000.0,
            p50_secs: to_secs(hist.value_at_percentile(50.0)),
            p95_secs: to_secs(hist.value_at_percentile(95.0)),
            p99_secs: to_secs(hist.value_at_percentile(99.0)),
        }
    }

    pub fn empty() -> Self {
        Self {
            count: 0,
            min_secs: 0.0,
            max_secs: 0.0,
            mean_secs: 0.0,
            p50_secs: 0.0,
            p95_secs: 0.0,
            p99_secs: 0.0,
        }
    }
}

/// Converts an observed latency into histogram units, clamped into range.
pub fn to_micros(latency_secs: f64) -> u64 {
    if !latency_secs.is_finite() || latency_secs <= 0.0 {
        return HIST_LOW;
    }
    ((latency_secs * 1_000_000.0) as u64).clamp(HIST_LOW, HIST_HIGH)
}

fn to_secs(us: u64) -> f64 {
    us as f64 / 1_000_000.0
}
