use aegis_core::{Fill, Order};
use async_trait::async_trait;

use crate::error::BackendError;

/// Port for an execution venue
///
/// Implementations submit market orders and report complete fills.
/// Partial fills are not modelled: a venue either fills or errors.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Venue identifier for logs
    fn name(&self) -> &str;

    /// Submit an order and wait for its fill
    async fn place(&self, order: &Order) -> Result<Fill, BackendError>;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
