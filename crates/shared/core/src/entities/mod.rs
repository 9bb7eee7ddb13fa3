mod idea;
mod order;
mod position;
mod side;
mod strategy;
mod trade;

pub use idea::TradeIdea;
pub use order::{Fill, Order, OrderId, OrderIntent};
pub use position::{ExitReason, Position, PositionId};
pub use side::{PositionSide, Side};
pub use strategy::StrategyKind;
pub use trade::TradeRecord;
