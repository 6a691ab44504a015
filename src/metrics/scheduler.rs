use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::collector::Collector;
use super::reporter::Reporter;

/// Separator between lines in the pushed body.
const LINE_SEPARATOR: &str = "\n";

/// Spawns the flush loop: every `period`, collect then hand the batch to
/// the reporter without waiting for delivery.
///
/// The task is detached work on the runtime and never keeps the process
/// alive on its own. Drop the handle to leave it running until shutdown,
/// or abort it.
pub fn spawn(mut collector: Collector, reporter: Reporter, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            flush(&mut collector, &reporter);
        }
    })
}

/// One tick. Errors are logged here and go no further.
fn flush(collector: &mut Collector, reporter: &Reporter) {
    let batch = match collector.collect() {
        Ok(batch) => batch,
        Err(err) => {
            tracing::error!(error = %err, "metrics collection failed, skipping tick");
            return;
        }
    };

    if batch.is_empty() {
        return;
    }

    let _ = reporter.dispatch(batch.serialize(LINE_SEPARATOR));
}
