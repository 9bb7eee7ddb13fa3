//! Post-fill settlement
//!
//! Booking an entry touches the risk state and two repository rows. Each
//! step that succeeds registers a [`Compensation`]; when a later step fails
//! the compensations run newest first, so a failed entry settlement leaves
//! neither an orphaned position in memory nor a stray row in storage.
//!
//! An exit fill cannot be undone: the venue is already flat. Exits settle
//! forward instead. The close stays applied in risk state and any repository
//! write that fails is parked in [`DeferredWrites`] for a later retry.

use crate::error::{Error, Result};
use aegis_core::{ExitReason, Fill, Position, PositionId, StrategyKind, Timestamp, TradeRecord};
use aegis_ports::{LearningSample, RepositoryError, ScoringGate, TradeRepository};
use aegis_risk_manager::{AssetRiskManager, RiskState};
use log::{error, info, warn};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Undo action for an applied entry step
#[derive(Debug, Clone)]
enum Compensation {
    RestoreRisk(Box<RiskState>),
    DeletePosition(PositionId),
    DeleteTrade(Uuid),
}

/// Applied steps of one entry settlement, undone in reverse on failure
struct UnitOfWork<'a> {
    symbol: String,
    risk: &'a mut AssetRiskManager,
    repo: &'a dyn TradeRepository,
    undo: Vec<Compensation>,
}

impl<'a> UnitOfWork<'a> {
    fn new(risk: &'a mut AssetRiskManager, repo: &'a dyn TradeRepository) -> Self {
        Self {
            symbol: risk.symbol().to_string(),
            risk,
            repo,
            undo: Vec::new(),
        }
    }

    fn register(&mut self, compensation: Compensation) {
        self.undo.push(compensation);
    }

    async fn rollback(mut self, cause: &Error) {
        warn!(
            "[SETTLE] {} rolling back {} step(s): {}",
            self.symbol,
            self.undo.len(),
            cause
        );
        while let Some(step) = self.undo.pop() {
            let outcome = match &step {
                Compensation::RestoreRisk(state) => {
                    self.risk.restore((**state).clone());
                    Ok(())
                }
                Compensation::DeletePosition(id) => self.repo.delete_position(*id).await,
                Compensation::DeleteTrade(id) => self.repo.delete_trade(*id).await,
            };
            if let Err(e) = outcome {
                error!(
                    "[SETTLE] {} compensation {:?} failed: {}",
                    self.symbol, step, e
                );
            }
        }
    }
}

/// Repository write left over from an exit settlement
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredWrite {
    SaveTrade(Box<TradeRecord>),
    DeletePosition(PositionId),
    SavePosition(Box<Position>),
    SaveEquity { equity: Decimal, at: Timestamp },
    RecordSample(Box<LearningSample>),
}

impl DeferredWrite {
    async fn apply(
        &self,
        symbol: &str,
        repo: &dyn TradeRepository,
    ) -> std::result::Result<(), RepositoryError> {
        match self {
            DeferredWrite::SaveTrade(trade) => repo.save_trade(trade).await,
            DeferredWrite::DeletePosition(id) => repo.delete_position(*id).await,
            DeferredWrite::SavePosition(pos) => repo.save_position(pos).await,
            DeferredWrite::SaveEquity { equity, at } => repo.save_equity(symbol, *equity, *at).await,
            DeferredWrite::RecordSample(sample) => repo.record_sample(sample).await,
        }
    }
}

impl fmt::Display for DeferredWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredWrite::SaveTrade(t) => write!(f, "save_trade({})", t.id),
            DeferredWrite::DeletePosition(id) => write!(f, "delete_position({id})"),
            DeferredWrite::SavePosition(p) => write!(f, "save_position({})", p.id),
            DeferredWrite::SaveEquity { equity, .. } => write!(f, "save_equity({equity})"),
            DeferredWrite::RecordSample(_) => write!(f, "record_sample"),
        }
    }
}

/// Per-symbol queue of writes that failed after an exit fill, retried in order
#[derive(Debug, Clone, Default)]
pub struct DeferredWrites {
    symbol: String,
    queue: VecDeque<DeferredWrite>,
}

impl DeferredWrites {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            queue: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeferredWrite> {
        self.queue.iter()
    }

    /// Attempt a write now; park it when the repository refuses
    async fn attempt(&mut self, repo: &dyn TradeRepository, write: DeferredWrite) {
        if let Err(e) = write.apply(&self.symbol, repo).await {
            warn!("[SETTLE] {} {} deferred: {}", self.symbol, write, e);
            self.queue.push_back(write);
        }
    }

    /// Retry parked writes oldest first, stopping at the first refusal so
    /// later writes never overtake earlier ones. Returns how many landed.
    pub async fn flush(&mut self, repo: &dyn TradeRepository) -> usize {
        let mut applied = 0;
        while let Some(write) = self.queue.front() {
            if let Err(e) = write.apply(&self.symbol, repo).await {
                warn!(
                    "[SETTLE] {} {} still failing, {} write(s) queued: {}",
                    self.symbol,
                    write,
                    self.queue.len(),
                    e
                );
                break;
            }
            self.queue.pop_front();
            applied += 1;
        }
        if applied > 0 {
            info!(
                "[SETTLE] {} replayed {} deferred write(s), {} left",
                self.symbol,
                applied,
                self.queue.len()
            );
        }
        applied
    }
}

/// What the entry needs besides the fill
#[derive(Debug, Clone)]
pub struct EntryPlan {
    pub stop: aegis_core::Price,
    pub target: aegis_core::Price,
    pub strategy: StrategyKind,
    pub gate_record_id: Option<Uuid>,
    pub features: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntrySettlement {
    pub position: Position,
    pub trade: TradeRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitSettlement {
    pub pnl: Decimal,
    pub trade: TradeRecord,
    /// Position left open after a partial close
    pub remaining: Option<Position>,
    /// Writes parked for retry by this settlement
    pub deferred: usize,
}

/// Book an entry fill: open in risk state, persist position, persist open trade, validate
pub async fn settle_entry(
    risk: &mut AssetRiskManager,
    repo: &dyn TradeRepository,
    fill: &Fill,
    plan: EntryPlan,
) -> Result<EntrySettlement> {
    let mut uow = UnitOfWork::new(risk, repo);
    match entry_steps(&mut uow, fill, plan).await {
        Ok(done) => {
            info!(
                "[SETTLE] {} entry booked: position {} trade {}",
                uow.symbol, done.position.id, done.trade.id
            );
            Ok(done)
        }
        Err(e) => {
            uow.rollback(&e).await;
            Err(e)
        }
    }
}

async fn entry_steps(
    uow: &mut UnitOfWork<'_>,
    fill: &Fill,
    plan: EntryPlan,
) -> Result<EntrySettlement> {
    let before = uow.risk.snapshot();
    uow.risk
        .open_position(fill, plan.stop, plan.target, plan.strategy)?;
    uow.register(Compensation::RestoreRisk(Box::new(before)));
    uow.risk.tag_position(plan.gate_record_id, plan.features);

    let position = uow
        .risk
        .position()
        .cloned()
        .ok_or_else(|| Error::Validation("position missing after open".to_string()))?;

    uow.repo.save_position(&position).await?;
    uow.register(Compensation::DeletePosition(position.id));

    let trade = TradeRecord::opened(&position);
    uow.repo.save_trade(&trade).await?;
    uow.register(Compensation::DeleteTrade(trade.id));

    if position.quantity != fill.quantity || position.entry_price != fill.price {
        return Err(Error::Validation(format!(
            "position {} @ {} does not match fill {} @ {}",
            position.quantity, position.entry_price, fill.quantity, fill.price
        )));
    }
    Ok(EntrySettlement { position, trade })
}

/// Book an exit fill against the open position and its open trade row
///
/// Steps: close in risk state, gate outcome update, persist closed trade,
/// delete (or rewrite) the persisted position, persist equity, learning
/// sample, validation. The close is never undone. A failing outcome update
/// is logged and skipped; a failing write is parked in `deferred`. An error
/// is returned only when the close itself is refused or the booked state
/// fails validation.
pub async fn settle_exit(
    risk: &mut AssetRiskManager,
    repo: &dyn TradeRepository,
    gate: &dyn ScoringGate,
    fill: &Fill,
    reason: ExitReason,
    open_trade: &TradeRecord,
    deferred: &mut DeferredWrites,
) -> Result<ExitSettlement> {
    let symbol = risk.symbol().to_string();
    let prior = risk
        .position()
        .cloned()
        .ok_or_else(|| Error::Risk(aegis_risk_manager::RiskError::NoPosition(symbol.clone())))?;
    let prior_equity = risk.equity();

    let pnl = risk.close_position(fill.quantity, fill.price, fill.fee)?;
    let equity = risk.equity();
    let remaining = risk.position().cloned();

    if let Some(record_id) = prior.gate_record_id
        && let Err(e) = gate.update_outcome(record_id, pnl).await
    {
        warn!(
            "[SETTLE] {} gate outcome update for {} failed: {}",
            symbol, record_id, e
        );
    }

    let closed = open_trade.close(fill.price, pnl, reason, fill.timestamp);
    let sample = LearningSample {
        symbol: symbol.clone(),
        features: prior.entry_features.clone().unwrap_or_default(),
        action: f64::from(prior.side.sign()),
        outcome: if pnl > Decimal::ZERO { 1.0 } else { 0.0 },
        pnl,
        timestamp: fill.timestamp,
    };
    let writes = [
        DeferredWrite::SaveTrade(Box::new(closed.clone())),
        match &remaining {
            None => DeferredWrite::DeletePosition(prior.id),
            Some(rest) => DeferredWrite::SavePosition(Box::new(rest.clone())),
        },
        DeferredWrite::SaveEquity {
            equity,
            at: fill.timestamp,
        },
        DeferredWrite::RecordSample(Box::new(sample)),
    ];
    let queued_before = deferred.len();
    for write in writes {
        // Nothing may overtake a write that is already parked
        if deferred.is_empty() {
            deferred.attempt(repo, write).await;
        } else {
            deferred.queue.push_back(write);
        }
    }
    let newly_deferred = deferred.len() - queued_before;

    if equity != prior_equity + pnl {
        return Err(Error::Validation(format!(
            "equity {} != {} + {}",
            equity, prior_equity, pnl
        )));
    }
    if remaining.is_none() && fill.quantity != prior.quantity {
        return Err(Error::Validation(format!(
            "position dropped after closing {} of {}",
            fill.quantity, prior.quantity
        )));
    }
    if newly_deferred > 0 {
        warn!(
            "[SETTLE] {} exit booked ({}) with {} deferred write(s): pnl {}",
            symbol, reason, newly_deferred, pnl
        );
    } else {
        info!("[SETTLE] {} exit booked ({}): pnl {}", symbol, reason, pnl);
    }
    Ok(ExitSettlement {
        pnl,
        trade: closed,
        remaining,
        deferred: newly_deferred,
    })
}
