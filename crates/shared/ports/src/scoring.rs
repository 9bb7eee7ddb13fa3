use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScoringError;

/// Feature vector presented to the scoring gate
///
/// Field order matches the offline trainer's columns:
/// `rsi14, adx14, fastMASlowDelta, bbWidth, avgSent, avgOB, action`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GateFeatures {
    pub rsi: f64,
    pub adx: f64,
    pub fast_slow_delta: f64,
    pub bb_width: f64,
    /// 0.0 when no sentiment feed is wired
    pub sentiment: f64,
    /// 0.0 when no order-book feed is wired
    pub order_book: f64,
    /// +1.0 long, -1.0 short
    pub action: f64,
}

impl GateFeatures {
    pub const LEN: usize = 7;

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.rsi,
            self.adx,
            self.fast_slow_delta,
            self.bb_width,
            self.sentiment,
            self.order_book,
            self.action,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.to_vec().iter().all(|v| v.is_finite())
    }
}

/// Gate output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateScore {
    /// Estimated probability the trade is profitable (0.0 - 1.0)
    pub probability: f64,
    /// Handle for reporting the realized outcome later
    pub record_id: Option<Uuid>,
}

/// Port for the learned trade filter
#[async_trait]
pub trait ScoringGate: Send + Sync {
    /// Score a candidate trade
    async fn score(&self, features: &GateFeatures) -> Result<GateScore, ScoringError>;

    /// Report the realized PnL of a trade previously scored under `record_id`
    async fn update_outcome(&self, record_id: Uuid, pnl: Decimal) -> Result<(), ScoringError>;

    /// Forget a scored record whose idea never became a trade
    async fn discard(&self, _record_id: Uuid) -> Result<(), ScoringError> {
        Ok(())
    }
}
