//! Aegis Gateway
//!
//! Adapters that plug the outside world into the ports of the decision loop:
//! - Paper execution venue (slippage + fee model, simulated connectivity)
//! - In-memory trade repository
//! - Scoring gates: logistic regression over the trainer's feature layout,
//!   and a constant-score placeholder
//!
//! ## Architecture
//!
//! ```text
//!            Decision loop
//!                 │
//!    ┌────────────┼──────────────┐
//!    │            │              │
//! ExecutionBackend ScoringGate  TradeRepository     (aegis-ports)
//!    │            │              │
//! ┌──▼───────┐ ┌──▼──────────┐ ┌─▼──────────────┐
//! │PaperVenue│ │Logistic /   │ │InMemory        │   (this crate)
//! │          │ │Constant gate│ │Repository      │
//! └──────────┘ └─────────────┘ └────────────────┘
//! ```
//!
//! Live venue and database adapters implement the same traits.

pub mod adapters;
pub mod error;

pub use adapters::{
    ConstantScoringGate, InMemoryRepository, LogisticModel, LogisticScoringGate, PaperVenue,
    PaperVenueConfig,
};
pub use error::GatewayError;
