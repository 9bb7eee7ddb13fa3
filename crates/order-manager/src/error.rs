//! Order Manager errors

use aegis_ports::{BackendError, RepositoryError};
use aegis_risk_manager::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Venue rejected order: {0}")]
    Rejected(BackendError),

    #[error("Gave up after {attempts} attempts: {last}")]
    MaxRetriesExceeded { attempts: u32, last: BackendError },

    #[error("Portfolio admission revoked after {attempts} attempts")]
    AdmissionRevoked { attempts: u32 },

    #[error("Invalid fill: {0}")]
    InvalidFill(String),

    #[error("Risk state: {0}")]
    Risk(#[from] RiskError),

    #[error("Repository: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Settlement validation failed: {0}")]
    Validation(String),
}

impl Error {
    /// True when the venue throttled us; the caller should give back its trade slot
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Error::Rejected(e) | Error::MaxRetriesExceeded { last: e, .. } => e.is_rate_limited(),
            _ => false,
        }
    }

    /// Attempts made before the error surfaced, when known
    pub fn attempts(&self) -> u32 {
        match self {
            Error::MaxRetriesExceeded { attempts, .. } | Error::AdmissionRevoked { attempts } => {
                *attempts
            }
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
