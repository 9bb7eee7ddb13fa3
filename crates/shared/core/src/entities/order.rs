use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExitReason, Side, StrategyKind};
use crate::values::{Price, Quantity, Symbol};

/// Unique identifier for an order
pub type OrderId = Uuid;

/// What an order is meant to do to the position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderIntent {
    /// Open a new position
    Entry,
    /// Close the open position for the given reason
    Exit(ExitReason),
}

impl OrderIntent {
    pub fn is_entry(&self) -> bool {
        matches!(self, OrderIntent::Entry)
    }
}

/// A market order submitted to an execution backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Quantity,
    /// Price the decision was taken at; venues fill around it
    pub reference_price: Price,
    pub intent: OrderIntent,
    pub strategy: StrategyKind,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new order with explicit timestamp
    pub fn new(
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Quantity,
        reference_price: Price,
        intent: OrderIntent,
        strategy: StrategyKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            quantity,
            reference_price,
            intent,
            strategy,
            created_at: timestamp,
        }
    }

    /// Notional at the reference price
    pub fn notional(&self) -> Decimal {
        self.quantity * self.reference_price
    }
}

/// Execution report for an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// Build a complete fill for `order` at `price`
    pub fn for_order(order: &Order, price: Price, fee: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            fee,
            timestamp,
        }
    }

    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}
