use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::task::JoinHandle;
use url::Url;

use super::error::ReportError;

/// Where and how batches are delivered.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub url: Url,
    pub user_id: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Best-effort pusher. At most one push is in flight; a batch offered
/// while another is still being sent is dropped.
#[derive(Clone)]
pub struct Reporter {
    client: reqwest::Client,
    sink: Arc<SinkConfig>,
    in_flight: Arc<AtomicBool>,
}

/// Releases the in-flight slot when the push task finishes or panics.
struct InFlightSlot(Arc<AtomicBool>);

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Reporter {
    pub fn new(sink: SinkConfig) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder().timeout(sink.timeout).build()?;
        Ok(Self {
            client,
            sink: Arc::new(sink),
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Starts a detached push of `body`. Returns `None` (and logs) when the
    /// previous push has not finished yet.
    pub fn dispatch(&self, body: String) -> Option<JoinHandle<()>> {
        let slot = match self.try_claim() {
            Ok(slot) => slot,
            Err(err) => {
                tracing::warn!(error = %err, "dropping metrics batch");
                return None;
            }
        };

        let this = self.clone();
        Some(tokio::spawn(async move {
            let _slot = slot;
            let lines = body.lines().count();
            match this.push(body).await {
                Ok(()) => tracing::info!(lines, "pushed metrics batch"),
                Err(err) => tracing::error!(error = %err, lines, "failed to push metrics batch"),
            }
        }))
    }

    fn try_claim(&self) -> Result<InFlightSlot, ReportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightSlot(self.in_flight.clone()))
            .map_err(|_| ReportError::InFlight)
    }

    /// One POST of an already-serialized batch.
    pub async fn push(&self, body: String) -> Result<(), ReportError> {
        let response = self
            .client
            .post(self.sink.url.clone())
            // The sink expects this header even though the body is line protocol.
            .header(CONTENT_TYPE, "application/json")
            .header(
                AUTHORIZATION,
                format!("Bearer {}:{}", self.sink.user_id, self.sink.api_key),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let raw = response.text().await.unwrap_or_default();
        let body = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(json) => json.to_string(),
            Err(_) => raw,
        };
        Err(ReportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
