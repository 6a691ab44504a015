use thiserror::Error;

/// Failure while building one tick's measurement set. The tick is skipped.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("memory statistics unavailable: {0}")]
    MemoryUnavailable(String),
    #[error("cpu statistics unavailable: {0}")]
    CpuUnavailable(String),
}

/// Failure delivering one batch to the sink. The batch is discarded.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sink rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("previous push still in flight")]
    InFlight,
}
