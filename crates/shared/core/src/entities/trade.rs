use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ExitReason, Position, PositionId, PositionSide, StrategyKind};
use crate::values::{Price, Quantity, Symbol};

/// Persisted trade row
///
/// Written open when the entry fills and rewritten closed on exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub position_id: PositionId,
    pub symbol: Symbol,
    pub side: PositionSide,
    pub strategy: StrategyKind,
    pub quantity: Quantity,
    pub entry_price: Price,
    pub exit_price: Option<Price>,
    pub realized_pnl: Option<Decimal>,
    pub exit_reason: Option<ExitReason>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl TradeRecord {
    /// Open trade row for a freshly filled position
    pub fn opened(position: &Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            position_id: position.id,
            symbol: position.symbol.clone(),
            side: position.side,
            strategy: position.strategy,
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price: None,
            realized_pnl: None,
            exit_reason: None,
            opened_at: position.entry_time,
            closed_at: None,
        }
    }

    /// Closed copy of the row
    pub fn close(
        &self,
        exit_price: Price,
        realized_pnl: Decimal,
        reason: ExitReason,
        closed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            exit_price: Some(exit_price),
            realized_pnl: Some(realized_pnl),
            exit_reason: Some(reason),
            closed_at: Some(closed_at),
            ..self.clone()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}
