//! Port adapters
//!
//! Each adapter implements one trait from `aegis-ports`.

pub mod memory;
pub mod paper;
pub mod scoring;

pub use memory::InMemoryRepository;
pub use paper::{PaperVenue, PaperVenueConfig};
pub use scoring::{ConstantScoringGate, LogisticModel, LogisticScoringGate};
