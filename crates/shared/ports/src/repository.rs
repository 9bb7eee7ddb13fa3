use aegis_core::{Position, PositionId, Symbol, Timestamp, TradeRecord};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RepositoryError;

/// Row of the rolling feature/outcome dataset consumed by the offline trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSample {
    pub symbol: Symbol,
    /// Gate features in trainer column order
    pub features: Vec<f64>,
    /// +1.0 long, -1.0 short
    pub action: f64,
    /// 1.0 profitable, 0.0 otherwise
    pub outcome: f64,
    pub pnl: Decimal,
    pub timestamp: Timestamp,
}

/// Stage of the trade lifecycle where an attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Submission,
    Settlement,
    Exit,
}

/// Structured record of a failed trade attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub symbol: Symbol,
    pub order_id: Option<Uuid>,
    pub stage: FailureStage,
    pub error: String,
    pub attempts: u32,
    pub timestamp: Timestamp,
}

/// Port for persistence of positions, trades, equity and datasets
#[async_trait]
pub trait TradeRepository: Send + Sync {
    async fn save_position(&self, position: &Position) -> Result<(), RepositoryError>;

    async fn delete_position(&self, id: PositionId) -> Result<(), RepositoryError>;

    /// Insert or replace a trade row keyed by its id
    async fn save_trade(&self, trade: &TradeRecord) -> Result<(), RepositoryError>;

    async fn delete_trade(&self, id: Uuid) -> Result<(), RepositoryError>;

    async fn save_equity(
        &self,
        symbol: &str,
        equity: Decimal,
        at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// Most recent closed trades for `symbol`, newest first
    async fn recent_closed_trades(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, RepositoryError>;

    async fn record_sample(&self, sample: &LearningSample) -> Result<(), RepositoryError>;

    async fn record_failure(&self, failure: &FailureRecord) -> Result<(), RepositoryError>;
}
