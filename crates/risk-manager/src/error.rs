use thiserror::Error;

/// Errors raised by the risk layer
///
/// All of these are invariant violations detected before any state mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Position already open for {0}")]
    PositionAlreadyOpen(String),

    #[error("No open position for {0}")]
    NoPosition(String),
}

pub type Result<T> = std::result::Result<T, RiskError>;
