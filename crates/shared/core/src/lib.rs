//! Aegis Core Domain
//!
//! Pure domain types for the Aegis decision loop.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod instruments;
pub mod market;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    ExitReason, Fill, Order, OrderId, OrderIntent, Position, PositionId, PositionSide, Side,
    StrategyKind, TradeIdea, TradeRecord,
};
pub use instruments::{AssetClass, InstrumentSpec};
pub use market::{Candle, IndicatorSnapshot, MarketRegime, RegimeAnalysis};
pub use values::{Price, Quantity, Symbol, Timestamp};
