//! Aegis Ports
//!
//! Port definitions (traits) for the Aegis decision loop.
//! These define the boundaries between domain logic and infrastructure:
//! time, execution venues, the learned scoring gate and persistence.

mod clock;
mod error;
mod execution;
mod repository;
mod scoring;

pub use clock::Clock;
pub use error::{BackendError, RepositoryError, ScoringError};
pub use execution::ExecutionBackend;
pub use repository::{FailureRecord, FailureStage, LearningSample, TradeRepository};
pub use scoring::{GateFeatures, GateScore, ScoringGate};
