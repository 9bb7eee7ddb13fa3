//! Asset Agent - the per-symbol decision loop
//!
//! One agent per symbol owns that symbol's candles, indicators, regime,
//! strategies, risk state and frequency limits. On every sealed candle it:
//!
//! 1. rolls the trading day, updates indicators, refreshes the regime
//! 2. manages an open position (trailing stop, exits, holding overlays)
//! 3. asks the portfolio whether new risk is allowed
//! 4. collects the first idea from the enabled strategies, in priority order
//! 5. refuses accumulation and reversal
//! 6. scores the idea with the gate
//! 7. plans stop and target
//! 8. sizes the trade and checks reward/risk against the adaptive requirement
//! 9. applies the dynamic size and the frequency limits
//! 10. executes and settles
//!
//! Each candle ends in a [`Decision`].

use crate::bootstrap::Services;
use crate::config::{AssetConfig, EngineConfig};
use crate::event_feed::Tick;
use aegis_core::{
    Candle, ExitReason, IndicatorSnapshot, InstrumentSpec, MarketRegime, Order, OrderIntent,
    PositionId, PositionSide, Price, Quantity, RegimeAnalysis, StrategyKind, Symbol, Timestamp,
    TradeIdea, TradeRecord,
};
use aegis_order_manager::{
    DeferredWrites, EntryPlan, Error as ExecError, FrequencyBlock, FrequencyLimiter, StopInputs,
    StopPlanner, settle_entry, settle_exit,
};
use aegis_ports::{
    FailureRecord, FailureStage, GateFeatures, GateScore, LearningSample, RepositoryError,
};
use aegis_risk_manager::{AdaptiveThresholds, AssetRiskManager, RiskError};
use aegis_strategy::{
    CandleAggregator, IndicatorCache, RegimeDetector, Strategy, StrategyContext, StrategyParams,
    build_strategies,
};
use chrono::{Duration, Timelike};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Why an idea (or a candle) did not lead to a trade
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    PortfolioBlocked,
    Accumulation,
    Reversal,
    GateBelowThreshold { probability: f64 },
    GateUnavailable(String),
    NoStopLevel,
    RewardRisk { offered: f64, required: f64 },
    Frequency(FrequencyBlock),
    AdmissionRevoked,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PortfolioBlocked => write!(f, "portfolio limits breached"),
            RejectReason::Accumulation => write!(f, "position already open on the same side"),
            RejectReason::Reversal => write!(f, "position open on the opposite side"),
            RejectReason::GateBelowThreshold { probability } => {
                write!(f, "gate probability {:.3} below threshold", probability)
            }
            RejectReason::GateUnavailable(e) => write!(f, "gate unavailable: {}", e),
            RejectReason::NoStopLevel => write!(f, "no stop level available"),
            RejectReason::RewardRisk { offered, required } => {
                write!(f, "reward/risk {:.2} below required {:.2}", offered, required)
            }
            RejectReason::Frequency(block) => write!(f, "{}", block),
            RejectReason::AdmissionRevoked => write!(f, "admission revoked during submission"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Entered {
        position_id: PositionId,
        strategy: StrategyKind,
        quantity: Quantity,
        price: Price,
    },
    Exited {
        reason: ExitReason,
        pnl: Decimal,
    },
    /// Position open, nothing to do
    Held,
    Rejected(RejectReason),
    /// Flat, no idea
    Idle,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Entered {
                strategy,
                quantity,
                price,
                ..
            } => write!(f, "entered {} {} @ {}", strategy, quantity, price),
            Decision::Exited { reason, pnl } => write!(f, "exited ({}) pnl {}", reason, pnl),
            Decision::Held => write!(f, "held"),
            Decision::Rejected(reason) => write!(f, "rejected: {}", reason),
            Decision::Idle => write!(f, "idle"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Execution failed: {0}")]
    Execution(#[from] ExecError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Risk error: {0}")]
    Risk(#[from] RiskError),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

/// Per-asset run summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentReport {
    pub symbol: Symbol,
    pub candles: u64,
    pub entries: u64,
    pub exits: u64,
    pub rejections: u64,
    /// Failed trade attempts (submission or settlement)
    pub failures: u64,
    /// Cycles that ended in an error
    pub errors: u64,
    pub realized_pnl: Decimal,
    pub final_equity: Decimal,
    pub open_position: bool,
}

/// Regimes in which a strategy's edge no longer holds
pub fn regime_opposes(strategy: StrategyKind, regime: MarketRegime) -> bool {
    use MarketRegime::*;
    match strategy {
        StrategyKind::TrendFollow => matches!(regime, Ranging | Quiet),
        StrategyKind::MomentumScalp => matches!(regime, Ranging | Quiet),
        StrategyKind::RangeBounce => matches!(regime, Trending | Volatile),
        StrategyKind::StopHuntReversal => matches!(regime, Trending),
    }
}

pub struct AssetAgent {
    symbol: Symbol,
    services: Services,

    candles: CandleAggregator,
    indicators: IndicatorCache,
    detector: RegimeDetector,
    regime: RegimeAnalysis,
    since_regime: u32,
    regime_refresh: u32,
    strategies: Vec<Box<dyn Strategy>>,
    params: StrategyParams,

    risk: AssetRiskManager,
    adaptive: AdaptiveThresholds,
    planner: StopPlanner,
    stop_lookback: usize,
    limiter: FrequencyLimiter,
    gate_threshold: f64,
    max_holding: Duration,
    regime_exit_confidence: f64,
    error_backoff: std::time::Duration,

    open_trade: Option<TradeRecord>,
    deferred: DeferredWrites,
    report: AgentReport,
}

impl AssetAgent {
    pub fn new(asset: &AssetConfig, config: &EngineConfig, services: Services) -> Self {
        let today = services.clock.now().date_naive();
        let spec = InstrumentSpec::new(asset.symbol.clone(), asset.asset_class, asset.min_lot);
        Self {
            symbol: asset.symbol.clone(),
            candles: CandleAggregator::new(config.candle_interval(), config.candle_window),
            indicators: IndicatorCache::new(config.indicators),
            detector: RegimeDetector::new(config.regime),
            regime: RegimeAnalysis::default(),
            since_regime: 0,
            regime_refresh: config.regime_refresh_candles.max(1),
            strategies: build_strategies(&config.strategies.enabled()),
            params: config.strategy_params,
            risk: AssetRiskManager::new(spec, config.risk, asset.starting_equity, today),
            adaptive: AdaptiveThresholds::new(config.adaptive),
            planner: StopPlanner::new(config.stops.clone()),
            stop_lookback: config.stop_lookback,
            limiter: FrequencyLimiter::new(config.frequency_limits()),
            gate_threshold: config.gate_threshold,
            max_holding: Duration::minutes(config.max_holding_minutes),
            regime_exit_confidence: config.regime_exit_confidence,
            error_backoff: std::time::Duration::from_millis(config.error_backoff_ms),
            open_trade: None,
            deferred: DeferredWrites::new(asset.symbol.clone()),
            report: AgentReport {
                symbol: asset.symbol.clone(),
                final_equity: asset.starting_equity,
                ..Default::default()
            },
            services,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn risk(&self) -> &AssetRiskManager {
        &self.risk
    }

    pub fn regime(&self) -> &RegimeAnalysis {
        &self.regime
    }

    pub fn indicators(&self) -> IndicatorSnapshot {
        self.indicators.snapshot()
    }

    pub fn frequency(&self) -> &FrequencyLimiter {
        &self.limiter
    }

    pub fn open_trade(&self) -> Option<&TradeRecord> {
        self.open_trade.as_ref()
    }

    /// Repository writes still owed by past exits
    pub fn deferred(&self) -> &DeferredWrites {
        &self.deferred
    }

    pub fn report(&self) -> AgentReport {
        AgentReport {
            final_equity: self.risk.equity(),
            open_position: self.risk.has_position(),
            ..self.report.clone()
        }
    }

    /// Process ticks until the channel closes
    pub async fn run(mut self, mut ticks: mpsc::Receiver<Tick>) -> AgentReport {
        info!("[AGENT] {} started", self.symbol);
        self.publish();
        while let Some(tick) = ticks.recv().await {
            match self.on_tick(&tick).await {
                Ok(Decision::Idle | Decision::Rejected(_)) => {}
                Ok(Decision::Held) => debug!("[AGENT] {} held", self.symbol),
                Ok(decision) => info!("[AGENT] {} {}", self.symbol, decision),
                Err(e) => {
                    self.report.errors += 1;
                    error!("[AGENT] {} cycle failed: {}", self.symbol, e);
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
        if !self.deferred.is_empty() {
            self.deferred.flush(self.services.repo.as_ref()).await;
        }
        if !self.deferred.is_empty() {
            error!(
                "[AGENT] {} stopped with {} unwritten settlement row(s)",
                self.symbol,
                self.deferred.len()
            );
        }
        info!("[AGENT] {} stopped", self.symbol);
        self.report()
    }

    pub async fn on_tick(&mut self, tick: &Tick) -> Result<Decision, AgentError> {
        if tick.symbol != self.symbol {
            return Err(self.anomaly(format!("tick for {} routed to {}", tick.symbol, self.symbol)));
        }
        if tick.price <= Decimal::ZERO {
            return Err(self.anomaly(format!("non-positive tick price {}", tick.price)));
        }
        match self.candles.on_tick(tick.price, tick.timestamp) {
            Some(candle) => self.on_candle(candle).await,
            None => Ok(Decision::Idle),
        }
    }

    /// Run the decision chain for a sealed candle
    pub async fn on_candle(&mut self, candle: Candle) -> Result<Decision, AgentError> {
        let now = self.services.clock.now();
        self.report.candles += 1;
        self.risk.reset_day(now.date_naive());
        if !self.deferred.is_empty() {
            self.deferred.flush(self.services.repo.as_ref()).await;
        }

        let snapshot = self.indicators.update(&candle);
        self.since_regime += 1;
        if self.report.candles == 1 || self.since_regime >= self.regime_refresh {
            self.regime = self.detector.analyze(&snapshot);
            self.since_regime = 0;
            debug!(
                "[AGENT] {} regime {} (confidence {:.2})",
                self.symbol, self.regime.regime, self.regime.confidence
            );
        }

        if self.risk.has_position() {
            let before = self.risk.snapshot();
            if let Some(stop) = self.risk.update_stops(candle.close, snapshot.atr)
                && let Some(pos) = self.risk.position().cloned()
            {
                debug!("[AGENT] {} trailing stop -> {}", self.symbol, stop);
                if let Err(e) = self.services.repo.save_position(&pos).await {
                    warn!(
                        "[AGENT] {} trailing stop {} not persisted, keeping the old stop: {}",
                        self.symbol, stop, e
                    );
                    self.risk.restore(before);
                    return Err(e.into());
                }
            }
            if let Some(reason) = self.exit_reason(candle.close, now) {
                return self.exit(reason, candle.close, now).await;
            }
        }
        self.publish();

        if !self.services.portfolio.can_trade().await {
            return Ok(self.reject(RejectReason::PortfolioBlocked));
        }

        match self.next_idea(&candle, &snapshot, now) {
            Some(idea) => self.consider(idea).await,
            None if self.risk.has_position() => Ok(Decision::Held),
            None => Ok(Decision::Idle),
        }
    }

    fn exit_reason(&self, price: Price, now: Timestamp) -> Option<ExitReason> {
        let check = self.risk.check_exit_conditions(price, now);
        if check.should_exit {
            return check.reason;
        }
        if check.reason == Some(ExitReason::MinHoldViolated) {
            debug!("[AGENT] {} inside minimum hold", self.symbol);
            return None;
        }
        let pos = self.risk.position()?;
        if now - pos.entry_time >= self.max_holding {
            return Some(ExitReason::MaxHoldTime);
        }
        if self.regime.confidence >= self.regime_exit_confidence
            && regime_opposes(pos.strategy, self.regime.regime)
        {
            return Some(ExitReason::RegimeShift);
        }
        None
    }

    /// Feed every strategy; the first idea in priority order wins
    fn next_idea(
        &mut self,
        candle: &Candle,
        snapshot: &IndicatorSnapshot,
        now: Timestamp,
    ) -> Option<TradeIdea> {
        let ctx = StrategyContext {
            symbol: &self.symbol,
            indicators: snapshot,
            regime: &self.regime,
            candles: self.candles.history(),
            params: &self.params,
            now,
        };
        let mut chosen = None;
        for strategy in self.strategies.iter_mut() {
            let idea = strategy.on_candle(candle, &ctx);
            if chosen.is_none()
                && let Some(idea) = idea
            {
                info!(
                    "[STRATEGY] {} {} {} @ {} ({:.2}) {}",
                    self.symbol,
                    strategy.name(),
                    idea.side,
                    idea.entry_price,
                    idea.confidence,
                    idea.reason
                );
                chosen = Some(idea);
            }
        }
        chosen
    }

    /// Run an idea through the gates and, if it survives, trade it
    pub async fn consider(&mut self, idea: TradeIdea) -> Result<Decision, AgentError> {
        let now = self.services.clock.now();
        let snapshot = self.indicators.snapshot();
        if idea.symbol != self.symbol || idea.entry_price <= Decimal::ZERO {
            return Err(self.anomaly(format!(
                "idea for {} @ {} reached {}",
                idea.symbol, idea.entry_price, self.symbol
            )));
        }

        if let Some(pos) = self.risk.position() {
            let reason = if pos.side == idea.side {
                RejectReason::Accumulation
            } else {
                RejectReason::Reversal
            };
            return Ok(self.reject(reason));
        }

        let features = GateFeatures {
            rsi: snapshot.rsi,
            adx: snapshot.adx,
            fast_slow_delta: snapshot.ma_delta(),
            bb_width: snapshot.bb_width,
            sentiment: 0.0,
            order_book: 0.0,
            action: f64::from(idea.side.sign()),
        };
        let score = match self.services.gate.score(&features).await {
            Ok(score) => score,
            Err(e) => {
                warn!("[AGENT] {} scoring failed: {}", self.symbol, e);
                return Ok(self.reject(RejectReason::GateUnavailable(e.to_string())));
            }
        };
        let decision = self.trade_scored(idea, features, score, &snapshot, now).await;
        if let Some(record_id) = score.record_id
            && !matches!(decision, Ok(Decision::Entered { .. }))
            && let Err(e) = self.services.gate.discard(record_id).await
        {
            debug!("[AGENT] {} gate record {} not discarded: {}", self.symbol, record_id, e);
        }
        decision
    }

    /// Everything after scoring: threshold, stops, sizing, limits, execution
    async fn trade_scored(
        &mut self,
        idea: TradeIdea,
        features: GateFeatures,
        score: GateScore,
        snapshot: &IndicatorSnapshot,
        now: Timestamp,
    ) -> Result<Decision, AgentError> {
        if !(score.probability >= self.gate_threshold) {
            return Ok(self.reject(RejectReason::GateBelowThreshold {
                probability: score.probability,
            }));
        }

        let levels = self.candles.support_resistance(self.stop_lookback);
        let Some(plan) = self.planner.plan(&StopInputs {
            side: idea.side,
            entry: idea.entry_price,
            atr: snapshot.atr,
            confidence: idea.confidence,
            levels,
        }) else {
            return Ok(self.reject(RejectReason::NoStopLevel));
        };

        let base = match self
            .risk
            .size_trade(plan.stop, idea.entry_price, idea.confidence, snapshot.atr)
        {
            Ok(base) => base,
            Err(e) => {
                warn!("[ANOMALY] {} sizing refused: {}", self.symbol, e);
                return Err(e.into());
            }
        };
        let win_prob = self.win_probability().await;
        let required = self.adaptive.required_rr(
            idea.strategy,
            win_prob,
            self.regime.volatility,
            self.regime.trend_strength,
            self.regime.regime,
            now.hour(),
        );
        let offered = plan.reward_risk(idea.entry_price);
        if offered < required {
            return Ok(self.reject(RejectReason::RewardRisk { offered, required }));
        }

        let sized = self.adaptive.dynamic_position_size(
            base.quantity,
            idea.strategy,
            self.regime.regime,
            self.regime.confidence,
            win_prob,
            offered,
            self.regime.volatility,
        );
        let lot = self.risk.spec().lot_size;
        let Some(floored) = self.risk.spec().floor_to_lot(sized) else {
            return Err(self.anomaly(format!("size {} overflows lot rounding", sized)));
        };
        let quantity = floored.max(lot);
        let reservation = match self.limiter.reserve(now) {
            Ok(r) => r,
            Err(block) => return Ok(self.reject(RejectReason::Frequency(block))),
        };

        let order = Order::new(
            self.symbol.clone(),
            idea.side.entry_side(),
            quantity,
            idea.entry_price,
            OrderIntent::Entry,
            idea.strategy,
            now,
        );
        info!(
            "[AGENT] {} submitting {} {} {} (stop {} target {} via {:?}, rr {:.2}/{:.2}, p {:.2})",
            self.symbol,
            idea.strategy,
            idea.side,
            quantity,
            plan.stop,
            plan.target,
            plan.method,
            offered,
            required,
            score.probability
        );

        let execution = match self.services.pipeline.submit(&order).await {
            Ok(execution) => execution,
            Err(e) => {
                let revoked = matches!(e, ExecError::AdmissionRevoked { .. });
                if e.is_rate_limited() || revoked {
                    self.limiter.revert(reservation);
                }
                self.record_failure(
                    FailureStage::Submission,
                    Some(order.id),
                    e.to_string(),
                    e.attempts(),
                    features.to_vec(),
                    idea.side,
                    now,
                )
                .await;
                if revoked {
                    return Ok(self.reject(RejectReason::AdmissionRevoked));
                }
                return Err(e.into());
            }
        };

        let entry = EntryPlan {
            stop: plan.stop,
            target: plan.target,
            strategy: idea.strategy,
            gate_record_id: score.record_id,
            features: Some(features.to_vec()),
        };
        let settled = settle_entry(
            &mut self.risk,
            self.services.repo.as_ref(),
            &execution.fill,
            entry,
        )
        .await;
        match settled {
            Ok(booked) => {
                self.report.entries += 1;
                self.open_trade = Some(booked.trade);
                self.publish();
                Ok(Decision::Entered {
                    position_id: booked.position.id,
                    strategy: idea.strategy,
                    quantity: booked.position.quantity,
                    price: booked.position.entry_price,
                })
            }
            Err(e) => {
                error!(
                    "[ANOMALY] {} entry filled at venue but settlement failed: {}",
                    self.symbol, e
                );
                self.risk.purge_invalid_position();
                self.record_failure(
                    FailureStage::Settlement,
                    Some(order.id),
                    e.to_string(),
                    execution.attempts,
                    features.to_vec(),
                    idea.side,
                    now,
                )
                .await;
                self.publish();
                Err(e.into())
            }
        }
    }

    async fn exit(
        &mut self,
        reason: ExitReason,
        price: Price,
        now: Timestamp,
    ) -> Result<Decision, AgentError> {
        let Some(pos) = self.risk.position().cloned() else {
            return Ok(Decision::Idle);
        };
        let order = Order::new(
            self.symbol.clone(),
            pos.side.exit_side(),
            pos.quantity,
            price,
            OrderIntent::Exit(reason),
            pos.strategy,
            now,
        );
        info!(
            "[AGENT] {} exiting {} {} @ {} ({})",
            self.symbol, pos.side, pos.quantity, price, reason
        );
        let features = pos.entry_features.clone().unwrap_or_default();

        let execution = match self.services.pipeline.submit(&order).await {
            Ok(execution) => execution,
            Err(e) => {
                self.record_failure(
                    FailureStage::Exit,
                    Some(order.id),
                    e.to_string(),
                    e.attempts(),
                    features,
                    pos.side,
                    now,
                )
                .await;
                return Err(e.into());
            }
        };

        let open_trade = self
            .open_trade
            .clone()
            .unwrap_or_else(|| TradeRecord::opened(&pos));
        let settled = settle_exit(
            &mut self.risk,
            self.services.repo.as_ref(),
            self.services.gate.as_ref(),
            &execution.fill,
            reason,
            &open_trade,
            &mut self.deferred,
        )
        .await;
        if !self.risk.has_position() {
            self.open_trade = None;
        }
        match settled {
            Ok(done) => {
                self.report.exits += 1;
                self.report.realized_pnl += done.pnl;
                if done.deferred > 0 {
                    self.report.failures += 1;
                    let pending: Vec<String> =
                        self.deferred.iter().map(ToString::to_string).collect();
                    self.persist_failure(FailureRecord {
                        symbol: self.symbol.clone(),
                        order_id: Some(order.id),
                        stage: FailureStage::Settlement,
                        error: format!("exit booked, writes deferred: {}", pending.join(", ")),
                        attempts: execution.attempts,
                        timestamp: now,
                    })
                    .await;
                }
                self.publish();
                Ok(Decision::Exited {
                    reason,
                    pnl: done.pnl,
                })
            }
            Err(e) => {
                error!(
                    "[ANOMALY] {} exit filled at venue but settlement failed: {}",
                    self.symbol, e
                );
                self.risk.purge_invalid_position();
                self.record_failure(
                    FailureStage::Settlement,
                    Some(order.id),
                    e.to_string(),
                    execution.attempts,
                    features,
                    pos.side,
                    now,
                )
                .await;
                self.publish();
                Err(e.into())
            }
        }
    }

    async fn win_probability(&mut self) -> f64 {
        let limit = self.adaptive.config().history_len;
        match self
            .services
            .repo
            .recent_closed_trades(&self.symbol, limit)
            .await
        {
            Ok(trades) => {
                let pnls: Vec<Decimal> = trades.iter().filter_map(|t| t.realized_pnl).collect();
                self.adaptive.win_probability(&pnls)
            }
            Err(e) => {
                warn!(
                    "[AGENT] {} trade history unavailable, using neutral prior: {}",
                    self.symbol, e
                );
                self.adaptive.config().neutral_win_prob
            }
        }
    }

    /// Negative learning sample plus a structured failure record
    #[allow(clippy::too_many_arguments)]
    async fn record_failure(
        &mut self,
        stage: FailureStage,
        order_id: Option<Uuid>,
        error: String,
        attempts: u32,
        features: Vec<f64>,
        side: PositionSide,
        now: Timestamp,
    ) {
        self.report.failures += 1;
        error!(
            "[AGENT] {} {:?} failure after {} attempt(s): {}",
            self.symbol, stage, attempts, error
        );
        let sample = LearningSample {
            symbol: self.symbol.clone(),
            features,
            action: f64::from(side.sign()),
            outcome: 0.0,
            pnl: Decimal::ZERO,
            timestamp: now,
        };
        if let Err(e) = self.services.repo.record_sample(&sample).await {
            warn!("[AGENT] {} failed to record learning sample: {}", self.symbol, e);
        }
        self.persist_failure(FailureRecord {
            symbol: self.symbol.clone(),
            order_id,
            stage,
            error,
            attempts,
            timestamp: now,
        })
        .await;
    }

    async fn persist_failure(&self, failure: FailureRecord) {
        if let Err(e) = self.services.repo.record_failure(&failure).await {
            error!("[AGENT] {} failed to persist failure record: {}", self.symbol, e);
        }
    }

    fn reject(&mut self, reason: RejectReason) -> Decision {
        self.report.rejections += 1;
        info!("[AGENT] {} rejected: {}", self.symbol, reason);
        Decision::Rejected(reason)
    }

    fn anomaly(&self, message: String) -> AgentError {
        warn!("[ANOMALY] {} {}", self.symbol, message);
        AgentError::Invariant(message)
    }

    fn publish(&self) {
        self.services.portfolio.publish(self.risk.exposure());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_regime_opposition() {
        assert!(regime_opposes(StrategyKind::TrendFollow, MarketRegime::Ranging));
        assert!(!regime_opposes(StrategyKind::TrendFollow, MarketRegime::Trending));
        assert!(regime_opposes(StrategyKind::RangeBounce, MarketRegime::Trending));
        assert!(!regime_opposes(StrategyKind::RangeBounce, MarketRegime::Quiet));
        assert!(!regime_opposes(StrategyKind::StopHuntReversal, MarketRegime::Volatile));
        assert!(!regime_opposes(StrategyKind::MomentumScalp, MarketRegime::Volatile));
    }

    #[test]
    fn test_decision_display() {
        let d = Decision::Rejected(RejectReason::RewardRisk {
            offered: 1.2,
            required: 1.85,
        });
        assert_eq!(d.to_string(), "rejected: reward/risk 1.20 below required 1.85");

        let d = Decision::Exited {
            reason: ExitReason::TakeProfit,
            pnl: dec!(6),
        };
        assert!(d.to_string().starts_with("exited"));
    }
}
