//! Aegis Order Manager
//!
//! Everything between an approved trade idea and booked state:
//! - **Stop Planning**: ordered chain of stop/target methods
//! - **Frequency Limits**: per-asset cooldown and hourly trade cap
//! - **Execution**: retrying submission with timeout, backoff and jitter
//! - **Settlement**: post-fill bookkeeping as a compensated unit of work
//!
//! ## Architecture
//!
//! ```text
//! Approved idea ──► StopPlanner ──► FrequencyLimiter.reserve()
//!                                          │
//!                   ┌──────────────────────▼─────────────────────┐
//!                   │            ExecutionPipeline               │
//!                   │  ping ─► place (timeout) ─► validate fill  │
//!                   │    ▲                            │          │
//!                   │    └── backoff + jitter ◄── transient      │
//!                   │        admission re-check (entries)        │
//!                   └──────────────────────┬─────────────────────┘
//!                                          │ Fill
//!                   ┌──────────────────────▼─────────────────────┐
//!                   │               Settlement                   │
//!                   │  risk state ─► position ─► trade ─► ...    │
//!                   │  entry: compensations, newest first        │
//!                   │  exit: settle forward, defer failed writes │
//!                   └────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aegis_order_manager::{ExecutionConfig, ExecutionPipeline, settle_entry};
//!
//! let pipeline = ExecutionPipeline::new(backend, ExecutionConfig::default())
//!     .with_admission(portfolio.clone());
//! let execution = pipeline.submit(&order).await?;
//! let booked = settle_entry(&mut risk, repo.as_ref(), &execution.fill, plan).await?;
//! ```

pub mod error;
pub mod execution;
pub mod frequency;
pub mod settlement;
pub mod stops;

pub use error::{Error, Result};
pub use execution::{
    AdmissionGate, Execution, ExecutionConfig, ExecutionPipeline, ExecutionStatsSnapshot,
    validate_fill,
};
pub use frequency::{FrequencyBlock, FrequencyConfig, FrequencyLimiter, FrequencyLimits, Reservation};
pub use settlement::{
    DeferredWrite, DeferredWrites, EntryPlan, EntrySettlement, ExitSettlement, settle_entry,
    settle_exit,
};
pub use stops::{StopInputs, StopMethod, StopPlanner, StopPlannerConfig, StopTarget};
