use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PositionSide, StrategyKind};
use crate::values::{Price, Symbol};

/// A trade idea emitted by a strategy
///
/// Ideas carry direction and conviction only. Stops, targets and size are
/// decided downstream by the risk chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIdea {
    /// Strategy that produced the idea
    pub strategy: StrategyKind,
    /// Instrument
    pub symbol: Symbol,
    /// Direction of the proposed position
    pub side: PositionSide,
    /// Reference entry price (usually the candle close)
    pub entry_price: Price,
    /// Strategy conviction (0.0 - 1.0)
    pub confidence: f64,
    /// Human-readable trigger description for logs
    pub reason: String,
    /// When the idea was generated
    pub created_at: DateTime<Utc>,
}

impl TradeIdea {
    /// Create a new idea with neutral confidence
    pub fn new(
        strategy: StrategyKind,
        symbol: impl Into<Symbol>,
        side: PositionSide,
        entry_price: Price,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy,
            symbol: symbol.into(),
            side,
            entry_price,
            confidence: 0.5,
            reason: String::new(),
            created_at,
        }
    }

    /// Builder: set confidence (clamped to 0..1)
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Builder: set trigger description
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_confidence_is_clamped() {
        let idea = TradeIdea::new(
            StrategyKind::TrendFollow,
            "BTC-USD",
            PositionSide::Long,
            dec!(100),
            Utc::now(),
        )
        .with_confidence(1.7);
        assert_eq!(idea.confidence, 1.0);

        let idea = idea.with_confidence(f64::NAN);
        assert_eq!(idea.confidence, 0.0);
    }
}
