//! Scripted doubles for the ports

#![allow(dead_code)]

use aegis_core::{Fill, Order, Position, PositionId, Timestamp, TradeRecord};
use aegis_ports::{
    BackendError, ExecutionBackend, FailureRecord, GateFeatures, GateScore, LearningSample,
    RepositoryError, ScoringError, ScoringGate, TradeRepository,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

/// Backend that plays back a script of outcomes, then fills
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Option<BackendError>>>,
    pub place_calls: AtomicU32,
    hang: bool,
}

impl ScriptedBackend {
    pub fn new(failures: Vec<BackendError>) -> Self {
        Self {
            script: Mutex::new(failures.into_iter().map(Some).collect()),
            place_calls: AtomicU32::new(0),
            hang: false,
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> u32 {
        self.place_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn place(&self, order: &Order) -> Result<Fill, BackendError> {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        let next = self.script.lock().unwrap().pop_front().flatten();
        match next {
            Some(err) => Err(err),
            None => Ok(Fill::for_order(
                order,
                order.reference_price,
                dec!(0.1),
                order.created_at,
            )),
        }
    }
}

/// Repository keeping rows in memory, with one method optionally failing
#[derive(Default)]
pub struct ScriptedRepo {
    pub positions: Mutex<HashMap<PositionId, Position>>,
    pub trades: Mutex<HashMap<Uuid, TradeRecord>>,
    pub equity: Mutex<Vec<(String, Decimal)>>,
    pub samples: Mutex<Vec<LearningSample>>,
    pub failures: Mutex<Vec<FailureRecord>>,
    fail_on: Mutex<Option<&'static str>>,
}

impl ScriptedRepo {
    pub fn failing_on(method: &'static str) -> Self {
        let repo = Self::default();
        *repo.fail_on.lock().unwrap() = Some(method);
        repo
    }

    pub fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    fn check(&self, method: &'static str) -> Result<(), RepositoryError> {
        if *self.fail_on.lock().unwrap() == Some(method) {
            return Err(RepositoryError::Write(format!("{method} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl TradeRepository for ScriptedRepo {
    async fn save_position(&self, position: &Position) -> Result<(), RepositoryError> {
        self.check("save_position")?;
        self.positions
            .lock()
            .unwrap()
            .insert(position.id, position.clone());
        Ok(())
    }

    async fn delete_position(&self, id: PositionId) -> Result<(), RepositoryError> {
        self.check("delete_position")?;
        self.positions.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn save_trade(&self, trade: &TradeRecord) -> Result<(), RepositoryError> {
        self.check("save_trade")?;
        self.trades.lock().unwrap().insert(trade.id, trade.clone());
        Ok(())
    }

    async fn delete_trade(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.trades.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn save_equity(
        &self,
        symbol: &str,
        equity: Decimal,
        _at: Timestamp,
    ) -> Result<(), RepositoryError> {
        self.check("save_equity")?;
        self.equity.lock().unwrap().push((symbol.to_string(), equity));
        Ok(())
    }

    async fn recent_closed_trades(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<TradeRecord>, RepositoryError> {
        let mut closed: Vec<_> = self
            .trades
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.symbol == symbol && t.is_closed())
            .cloned()
            .collect();
        closed.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));
        closed.truncate(limit);
        Ok(closed)
    }

    async fn record_sample(&self, sample: &LearningSample) -> Result<(), RepositoryError> {
        self.check("record_sample")?;
        self.samples.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn record_failure(&self, failure: &FailureRecord) -> Result<(), RepositoryError> {
        self.failures.lock().unwrap().push(failure.clone());
        Ok(())
    }
}

/// Gate that remembers outcome updates
#[derive(Default)]
pub struct RecordingGate {
    pub outcomes: Mutex<Vec<(Uuid, Decimal)>>,
}

#[async_trait]
impl ScoringGate for RecordingGate {
    async fn score(&self, _features: &GateFeatures) -> Result<GateScore, ScoringError> {
        Ok(GateScore {
            probability: 0.7,
            record_id: Some(Uuid::new_v4()),
        })
    }

    async fn update_outcome(&self, record_id: Uuid, pnl: Decimal) -> Result<(), ScoringError> {
        self.outcomes.lock().unwrap().push((record_id, pnl));
        Ok(())
    }
}
