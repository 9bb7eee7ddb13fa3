use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PositionSide, StrategyKind};
use crate::values::{Price, Quantity, Symbol};

/// Unique identifier for a position
pub type PositionId = Uuid;

/// Why a position was (or was not) closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Price crossed the protective stop
    StopLoss,
    /// Exit conditions were evaluated inside the minimum holding period.
    /// Reported without an exit.
    MinHoldViolated,
    /// Price reached the profit target
    TakeProfit,
    /// Position exceeded the maximum holding time
    MaxHoldTime,
    /// Market regime turned against the entry strategy
    RegimeShift,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::MinHoldViolated => "min_hold_violated",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::MaxHoldTime => "max_hold_time",
            ExitReason::RegimeShift => "regime_shift",
        };
        f.write_str(label)
    }
}

/// An open position in a single symbol
///
/// Created when an entry order fills, mutated only by trailing-stop ratchets
/// and partial closes, and destroyed on full close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique position identifier
    pub id: PositionId,

    /// Instrument being traded
    pub symbol: Symbol,

    /// Position side (long/short)
    pub side: PositionSide,

    /// Open quantity (always positive)
    pub quantity: Quantity,

    /// Fill price of the entry order
    pub entry_price: Price,

    /// Current protective stop
    pub stop_price: Price,

    /// Profit target
    pub target_price: Price,

    /// When the entry filled
    pub entry_time: DateTime<Utc>,

    /// Strategy that opened the position
    pub strategy: StrategyKind,

    /// Money at risk at entry: |entry - stop| * quantity
    pub initial_risk: Decimal,

    /// Fee paid on the entry fill for the open quantity
    pub entry_fee: Decimal,

    /// Scoring-gate record to report the outcome against
    pub gate_record_id: Option<Uuid>,

    /// Feature vector presented to the scoring gate at entry
    pub entry_features: Option<Vec<f64>>,
}

impl Position {
    /// Create a new position from a filled entry
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<Symbol>,
        side: PositionSide,
        quantity: Quantity,
        entry_price: Price,
        stop_price: Price,
        target_price: Price,
        strategy: StrategyKind,
        entry_time: DateTime<Utc>,
    ) -> Self {
        let initial_risk = (entry_price - stop_price).abs() * quantity;
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            quantity,
            entry_price,
            stop_price,
            target_price,
            entry_time,
            strategy,
            initial_risk,
            entry_fee: Decimal::ZERO,
            gate_record_id: None,
            entry_features: None,
        }
    }

    /// Builder: record the entry fee
    pub fn with_entry_fee(mut self, fee: Decimal) -> Self {
        self.entry_fee = fee;
        self
    }

    /// Builder: attach the scoring-gate record and the features it saw
    pub fn with_gate_record(mut self, record_id: Option<Uuid>, features: Option<Vec<f64>>) -> Self {
        self.gate_record_id = record_id;
        self.entry_features = features;
        self
    }

    /// Directional price move from entry to `price`
    pub fn price_delta(&self, price: Price) -> Decimal {
        match self.side {
            PositionSide::Long => price - self.entry_price,
            PositionSide::Short => self.entry_price - price,
        }
    }

    /// Unrealized P&L at `price`, before fees
    pub fn unrealized_pnl(&self, price: Price) -> Decimal {
        self.price_delta(price) * self.quantity
    }

    /// Unrealized P&L at `price` as a fraction of the entry price
    pub fn pnl_pct(&self, price: Price) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        self.price_delta(price) / self.entry_price
    }

    /// True when `price` is at or beyond the stop
    pub fn stop_breached(&self, price: Price) -> bool {
        match self.side {
            PositionSide::Long => price <= self.stop_price,
            PositionSide::Short => price >= self.stop_price,
        }
    }

    /// True when `price` is at or beyond the target
    pub fn target_reached(&self, price: Price) -> bool {
        match self.side {
            PositionSide::Long => price >= self.target_price,
            PositionSide::Short => price <= self.target_price,
        }
    }

    /// True when `candidate` is strictly more protective than the current stop
    pub fn improves_stop(&self, candidate: Price) -> bool {
        match self.side {
            PositionSide::Long => candidate > self.stop_price,
            PositionSide::Short => candidate < self.stop_price,
        }
    }

    /// Move the stop to `candidate` only if it tightens. Returns whether it moved.
    pub fn ratchet_stop(&mut self, candidate: Price) -> bool {
        if self.improves_stop(candidate) {
            self.stop_price = candidate;
            true
        } else {
            false
        }
    }

    /// Reward-to-risk ratio implied by the stop and target
    pub fn reward_risk(&self) -> Decimal {
        let risk = (self.entry_price - self.stop_price).abs();
        if risk.is_zero() {
            return Decimal::ZERO;
        }
        (self.target_price - self.entry_price).abs() / risk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long() -> Position {
        Position::new(
            "BTC-USD",
            PositionSide::Long,
            dec!(2),
            dec!(100),
            dec!(98),
            dec!(104),
            StrategyKind::TrendFollow,
            Utc::now(),
        )
    }

    #[test]
    fn test_initial_risk_and_pnl() {
        let pos = long();
        assert_eq!(pos.initial_risk, dec!(4));
        assert_eq!(pos.unrealized_pnl(dec!(103)), dec!(6));
        assert_eq!(pos.pnl_pct(dec!(106)), dec!(0.06));
        assert_eq!(pos.reward_risk(), dec!(2));
    }

    #[test]
    fn test_long_stop_only_tightens() {
        let mut pos = long();
        assert!(pos.ratchet_stop(dec!(99)));
        assert!(!pos.ratchet_stop(dec!(97)));
        assert_eq!(pos.stop_price, dec!(99));
    }

    #[test]
    fn test_short_stop_only_tightens() {
        let mut pos = Position::new(
            "ES",
            PositionSide::Short,
            dec!(1),
            dec!(100),
            dec!(102),
            dec!(96),
            StrategyKind::RangeBounce,
            Utc::now(),
        );
        assert!(pos.ratchet_stop(dec!(101)));
        assert!(!pos.ratchet_stop(dec!(101.5)));
        assert_eq!(pos.stop_price, dec!(101));
        assert!(pos.stop_breached(dec!(101)));
        assert!(pos.target_reached(dec!(95)));
    }
}
