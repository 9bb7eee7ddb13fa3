//! In-memory trade repository
//!
//! Positions and trade rows live in concurrent maps keyed by id; append-only
//! series (equity, learning samples, failures) sit behind async mutexes.

use aegis_core::{Position, PositionId, Symbol, Timestamp, TradeRecord};
use aegis_ports::{FailureRecord, LearningSample, RepositoryError, TradeRepository};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub symbol: Symbol,
    pub equity: Decimal,
    pub at: Timestamp,
}

#[derive(Default)]
pub struct InMemoryRepository {
    positions: DashMap<PositionId, Position>,
    trades: DashMap<Uuid, TradeRecord>,
    equity: Mutex<Vec<EquityPoint>>,
    samples: Mutex<Vec<LearningSample>>,
    failures: Mutex<Vec<FailureRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.positions.iter().map(|e| e.value().clone()).collect()
    }

    pub fn position(&self, id: PositionId) -> Option<Position> {
        self.positions.get(&id).map(|e| e.value().clone())
    }

    pub fn trades(&self) -> Vec<TradeRecord> {
        self.trades.iter().map(|e| e.value().clone()).collect()
    }

    pub fn trade(&self, id: Uuid) -> Option<TradeRecord> {
        self.trades.get(&id).map(|e| e.value().clone())
    }

    /// Open trade row for a position, if any
    pub fn open_trade_for(&self, position: PositionId) -> Option<TradeRecord> {
        self.trades
            .iter()
            .find(|e| e.position_id == position && !e.is_closed())
            .map(|e| e.value().clone())
    }

    pub async fn equity_history(&self, symbol: &str) -> Vec<EquityPoint> {
        self.equity
            .lock()
            .await
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect()
    }

    pub async fn samples(&self) -> Vec<LearningSample> {
        self.samples.lock().await.clone()
    }

    pub async fn failures(&self) -> Vec<FailureRecord> {
        self.failures.lock().await.clone()
    }
}

#[async_trait]
impl TradeRepository for InMemoryRepository {
    async fn save_position(&self, position: &Position) -> Result<(), RepositoryError> {
        self.positions.insert(position.id, position.clone());
        Ok(())
    }

    async fn delete_position(&self, id: PositionId) -> Result<(), RepositoryError> {
        self.positions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("position {id}")))
    }

    async fn save_trade(&self, trade: &TradeRecord) -> Result<(), RepositoryError> {
        self.trades.insert(trade.id, trade.clone());
        Ok(())
    }

    async fn delete_trade(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.trades
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("trade {id}")))
    }

    async fn save_equity(
        &self,
        symbol: &str,
        equity: Decimal,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        self.equity.lock().await.push(EquityPoint {
            symbol: symbol.to_string(),
            equity,
            at,
        });
        Ok(())
    }

    async fn recent_closed_trades(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, RepositoryError> {
        let mut closed: Vec<TradeRecord> = self
            .trades
            .iter()
            .filter(|e| e.symbol == symbol && e.is_closed())
            .map(|e| e.value().clone())
            .collect();
        closed.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));
        closed.truncate(limit);
        Ok(closed)
    }

    async fn record_sample(&self, sample: &LearningSample) -> Result<(), RepositoryError> {
        self.samples.lock().await.push(sample.clone());
        Ok(())
    }

    async fn record_failure(&self, failure: &FailureRecord) -> Result<(), RepositoryError> {
        self.failures.lock().await.push(failure.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{ExitReason, PositionSide, StrategyKind};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn position(symbol: &str) -> Position {
        Position::new(
            symbol.to_string(),
            PositionSide::Long,
            dec!(1),
            dec!(100),
            dec!(98),
            dec!(104),
            StrategyKind::TrendFollow,
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_recent_closed_trades_newest_first() {
        let repo = InMemoryRepository::new();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        for (i, pnl) in [dec!(1), dec!(-2), dec!(3)].into_iter().enumerate() {
            let open = TradeRecord::opened(&position("BTC-USD"));
            let closed = open.close(dec!(101), pnl, ExitReason::TakeProfit, t0 + Duration::minutes(i as i64));
            repo.save_trade(&closed).await.unwrap();
        }
        repo.save_trade(&TradeRecord::opened(&position("BTC-USD"))).await.unwrap();
        repo.save_trade(&TradeRecord::opened(&position("ETH-USD")).close(
            dec!(1),
            dec!(9),
            ExitReason::StopLoss,
            t0,
        ))
        .await
        .unwrap();

        let recent = repo.recent_closed_trades("BTC-USD", 2).await.unwrap();
        let pnls: Vec<_> = recent.iter().map(|t| t.realized_pnl.unwrap()).collect();
        assert_eq!(pnls, vec![dec!(3), dec!(-2)]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let repo = InMemoryRepository::new();
        let pos = position("BTC-USD");
        repo.save_position(&pos).await.unwrap();
        assert!(repo.delete_position(pos.id).await.is_ok());
        assert!(matches!(
            repo.delete_position(pos.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_trade_lookup() {
        let repo = InMemoryRepository::new();
        let pos = position("BTC-USD");
        let trade = TradeRecord::opened(&pos);
        repo.save_trade(&trade).await.unwrap();
        assert_eq!(repo.open_trade_for(pos.id), Some(trade.clone()));

        let closed = trade.close(dec!(104), dec!(4), ExitReason::TakeProfit, Utc::now());
        repo.save_trade(&closed).await.unwrap();
        assert_eq!(repo.open_trade_for(pos.id), None);
    }
}
