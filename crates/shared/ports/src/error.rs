use thiserror::Error;

/// Failure reported by an execution backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend timed out after {0} ms")]
    Timeout(u64),

    #[error("Connection failure: {0}")]
    Connection(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Order rejected by venue: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Errors worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        !matches!(self, BackendError::Rejected(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, BackendError::RateLimited(_))
    }
}

/// Persistence failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed: {0}")]
    Write(String),
}

/// Scoring gate failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid features: {0}")]
    InvalidFeatures(String),

    #[error("Unknown score record: {0}")]
    UnknownRecord(String),
}
