//! Local, read-only views of the metric store. Nothing here is pushed.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

use super::store::MetricsSnapshot;
use crate::AppState;

const SNAPSHOT_EVERY: Duration = Duration::from_secs(1);

/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// `GET /api/metrics/stream`: one `snapshot` event per second.
pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let ticks = IntervalStream::new(tokio::time::interval(SNAPSHOT_EVERY));

    let events = ticks.filter_map(move |_| {
        match Event::default()
            .event("snapshot")
            .json_data(state.metrics.snapshot())
        {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unserializable snapshot");
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
