//! In-process counters and gauges, pushed to a remote sink on a timer.
//!
//! Request handlers mutate the [`MetricStore`]. Once per period the
//! [`scheduler`] asks the [`Collector`] for a batch and hands it to the
//! [`Reporter`], which POSTs it without blocking the next tick.

pub mod builder;
pub mod collector;
pub mod error;
pub mod latency;
pub mod reporter;
pub mod scheduler;
pub mod store;
pub mod stream;
pub mod system;

pub use collector::Collector;
pub use reporter::{Reporter, SinkConfig};
pub use store::MetricStore;
pub use system::SysinfoHost;
