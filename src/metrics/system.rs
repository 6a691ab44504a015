//! Host resource readings used for the two system gauges.

use sysinfo::{CpuRefreshKind, System};

use super::error::CollectError;

/// Raw host readings, refreshed on every call.
pub trait HostStats: Send {
    /// `(total, available)` memory in bytes. Available counts reclaimable
    /// page cache as free (Linux `MemAvailable`).
    fn memory(&mut self) -> Result<(u64, u64), CollectError>;

    /// 1-minute load average and logical core count.
    fn load(&mut self) -> Result<(f64, usize), CollectError>;
}

/// [`HostStats`] backed by `sysinfo`.
pub struct SysinfoHost {
    system: System,
}

impl SysinfoHost {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostStats for SysinfoHost {
    fn memory(&mut self) -> Result<(u64, u64), CollectError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(CollectError::MemoryUnavailable(
                "total memory reported as zero".into(),
            ));
        }
        Ok((total, self.system.available_memory()))
    }

    fn load(&mut self) -> Result<(f64, usize), CollectError> {
        self.system.refresh_cpu_list(CpuRefreshKind::nothing());
        let cores = self.system.cpus().len();
        if cores == 0 {
            return Err(CollectError::CpuUnavailable("no cpus reported".into()));
        }
        Ok((System::load_average().one, cores))
    }
}

// ─── Derived gauges ──────────────────────────────────────────────

/// Used memory as a percentage of total.
pub fn memory_usage_percent(total: u64, free: u64) -> f64 {
    let used = total.saturating_sub(free);
    used as f64 / total as f64 * 100.0
}

/// Load per core rounded to two decimals, then scaled by 100.
pub fn cpu_usage_percent(load_one: f64, cores: usize) -> f64 {
    round2(load_one / cores as f64) * 100.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
