//! Error types for the gateway crate

use thiserror::Error;

/// Adapter construction and configuration errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid venue configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Serialization(e.to_string())
    }
}
