//! Portfolio Risk Aggregator
//!
//! Cross-asset admission control. Each asset task publishes its
//! [`AssetExposure`] into a concurrent map (one writer per key); the
//! consolidated snapshot, its history and the alert log sit behind a single
//! async mutex so recomputation is serialized.
//!
//! ```text
//!  asset task A ──publish──┐
//!  asset task B ──publish──┼──► DashMap<symbol, exposure>
//!  asset task C ──publish──┘            │
//!                                       ▼ recalc()
//!                           Mutex<PortfolioState>
//!                         (snapshot, history, alerts)
//!                                       │
//!                                       ▼
//!                                 can_trade()
//! ```

use aegis_core::{AssetClass, Symbol, Timestamp};
use aegis_ports::Clock;
use chrono::Duration;
use dashmap::DashMap;
use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::parameters::{AssetClassTable, PortfolioLimits};

/// Alerts retained in memory
const ALERT_LOG_CAP: usize = 100;

/// What one asset task reports about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetExposure {
    pub symbol: Symbol,
    pub asset_class: AssetClass,
    pub equity: Decimal,
    pub day_pnl: Decimal,
    /// Money at risk in the open position
    pub open_risk: Decimal,
    pub position_count: usize,
}

/// Portfolio risk level, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Healthy,
    Warning,
    Danger,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Healthy => write!(f, "HEALTHY"),
            RiskLevel::Warning => write!(f, "WARNING"),
            RiskLevel::Danger => write!(f, "DANGER"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Consolidated view across all assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub total_equity: Decimal,
    pub total_day_pnl: Decimal,
    /// Weighted open risk as a fraction of total equity
    pub open_risk_pct: f64,
    /// Day loss as a fraction of start-of-day equity (0 when up on the day)
    pub day_loss_pct: f64,
    pub position_count: usize,
    pub risk_level: RiskLevel,
    /// Limits at or beyond 100%
    pub breach_count: usize,
    /// Limits at or beyond the warning ratio
    pub warning_count: usize,
    pub timestamp: Timestamp,
}

impl PortfolioSnapshot {
    /// True when the consolidated numbers match, ignoring the timestamp
    fn same_figures(&self, other: &PortfolioSnapshot) -> bool {
        self.total_equity == other.total_equity
            && self.total_day_pnl == other.total_day_pnl
            && self.position_count == other.position_count
            && self.risk_level == other.risk_level
            && (self.open_risk_pct - other.open_risk_pct).abs() < 1e-12
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Equity fell faster than the rapid-loss threshold
    RapidLoss,
    /// More open positions than allowed
    Concentration,
}

/// Non-blocking portfolio alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    pub kind: AlertKind,
    pub description: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Default)]
struct PortfolioState {
    history: VecDeque<PortfolioSnapshot>,
    alerts: VecDeque<RiskAlert>,
    /// Alerts whose condition currently holds; re-raised only after clearing
    active: Vec<AlertKind>,
}

/// Shared admission gate for all asset tasks
pub struct PortfolioRiskAggregator {
    limits: PortfolioLimits,
    weights: AssetClassTable,
    clock: Arc<dyn Clock>,
    exposures: DashMap<Symbol, AssetExposure>,
    state: Mutex<PortfolioState>,
}

impl PortfolioRiskAggregator {
    pub fn new(limits: PortfolioLimits, weights: AssetClassTable, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            weights,
            clock,
            exposures: DashMap::new(),
            state: Mutex::new(PortfolioState::default()),
        }
    }

    pub fn limits(&self) -> &PortfolioLimits {
        &self.limits
    }

    /// Publish (replace) the exposure of one asset
    pub fn publish(&self, exposure: AssetExposure) {
        self.exposures.insert(exposure.symbol.clone(), exposure);
    }

    pub fn remove(&self, symbol: &str) -> Option<AssetExposure> {
        self.exposures.remove(symbol).map(|(_, e)| e)
    }

    pub fn exposure(&self, symbol: &str) -> Option<AssetExposure> {
        self.exposures.get(symbol).map(|e| e.clone())
    }

    fn classify(&self, ratio: f64) -> RiskLevel {
        if ratio >= 1.0 {
            RiskLevel::Critical
        } else if ratio >= self.limits.danger_ratio {
            RiskLevel::Danger
        } else if ratio >= self.limits.warning_ratio {
            RiskLevel::Warning
        } else {
            RiskLevel::Healthy
        }
    }

    /// Limit utilisation ratio of `used` against `limit`
    fn utilisation(used: f64, limit: f64) -> f64 {
        if limit > 0.0 && used.is_finite() {
            used / limit
        } else if used > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    /// Recompute the consolidated snapshot
    ///
    /// Reading the exposures and appending to the history happen under one
    /// lock, so the newest history entry never predates a finished recalc.
    pub async fn recalc(&self) -> PortfolioSnapshot {
        let mut state = self.state.lock().await;
        let mut total_equity = Decimal::ZERO;
        let mut total_day_pnl = Decimal::ZERO;
        let mut weighted_risk = Decimal::ZERO;
        let mut position_count = 0usize;

        for entry in self.exposures.iter() {
            let e = entry.value();
            let weight = Decimal::from_f64(self.weights.get(e.asset_class).exposure_weight)
                .unwrap_or(Decimal::ONE);
            total_equity += e.equity;
            total_day_pnl += e.day_pnl;
            weighted_risk += e.open_risk * weight;
            position_count += e.position_count;
        }

        let open_risk_pct = if total_equity > Decimal::ZERO {
            (weighted_risk / total_equity).to_f64().unwrap_or(0.0)
        } else if weighted_risk > Decimal::ZERO {
            f64::INFINITY
        } else {
            0.0
        };
        let start_of_day = total_equity - total_day_pnl;
        let day_loss_pct = if total_day_pnl < Decimal::ZERO {
            if start_of_day > Decimal::ZERO {
                (-total_day_pnl / start_of_day).to_f64().unwrap_or(0.0)
            } else {
                f64::INFINITY
            }
        } else {
            0.0
        };

        let loss_ratio = Self::utilisation(day_loss_pct, self.limits.max_daily_loss_pct);
        let risk_ratio = Self::utilisation(open_risk_pct, self.limits.max_open_risk_pct);
        let ratios = [loss_ratio, risk_ratio];
        let risk_level = self.classify(loss_ratio.max(risk_ratio));
        let breach_count = ratios.iter().filter(|r| **r >= 1.0).count();
        let warning_count = ratios
            .iter()
            .filter(|r| **r >= self.limits.warning_ratio)
            .count();

        let now = self.clock.now();
        let snapshot = PortfolioSnapshot {
            total_equity,
            total_day_pnl,
            open_risk_pct,
            day_loss_pct,
            position_count,
            risk_level,
            breach_count,
            warning_count,
            timestamp: now,
        };

        self.check_alerts(&mut state, &snapshot, now);

        let sample_due = match state.history.back() {
            None => true,
            Some(last) => {
                !last.same_figures(&snapshot)
                    || now - last.timestamp >= Duration::seconds(self.limits.sample_interval_secs)
            }
        };
        if sample_due {
            if let Some(last) = state.history.back()
                && last.risk_level != snapshot.risk_level
            {
                info!(
                    "[PORTFOLIO] Risk level {} -> {} (equity {}, day PnL {}, open risk {:.2}%)",
                    last.risk_level,
                    snapshot.risk_level,
                    total_equity,
                    total_day_pnl,
                    open_risk_pct * 100.0
                );
            }
            state.history.push_back(snapshot.clone());
            while state.history.len() > self.limits.history_len.max(1) {
                state.history.pop_front();
            }
        }

        snapshot
    }

    fn check_alerts(&self, state: &mut PortfolioState, snapshot: &PortfolioSnapshot, now: Timestamp) {
        let window_start = now - Duration::minutes(self.limits.rapid_loss_window_minutes);
        let rapid_drop = state
            .history
            .iter()
            .find(|s| s.timestamp >= window_start)
            .and_then(|oldest| {
                if oldest.total_equity <= Decimal::ZERO {
                    return None;
                }
                let drop = ((oldest.total_equity - snapshot.total_equity) / oldest.total_equity)
                    .to_f64()
                    .unwrap_or(0.0);
                (drop > self.limits.rapid_loss_pct).then_some(drop)
            });
        self.toggle_alert(
            state,
            AlertKind::RapidLoss,
            rapid_drop.map(|d| {
                format!(
                    "Equity down {:.2}% within {} minutes",
                    d * 100.0,
                    self.limits.rapid_loss_window_minutes
                )
            }),
            now,
        );

        let concentrated = snapshot.position_count > self.limits.max_concurrent_positions;
        self.toggle_alert(
            state,
            AlertKind::Concentration,
            concentrated.then(|| {
                format!(
                    "{} open positions exceed the limit of {}",
                    snapshot.position_count, self.limits.max_concurrent_positions
                )
            }),
            now,
        );
    }

    fn toggle_alert(
        &self,
        state: &mut PortfolioState,
        kind: AlertKind,
        condition: Option<String>,
        now: Timestamp,
    ) {
        let was_active = state.active.contains(&kind);
        match condition {
            Some(description) if !was_active => {
                warn!("[PORTFOLIO] Alert {:?}: {}", kind, description);
                state.active.push(kind);
                state.alerts.push_back(RiskAlert {
                    kind,
                    description,
                    timestamp: now,
                });
                while state.alerts.len() > ALERT_LOG_CAP {
                    state.alerts.pop_front();
                }
            }
            None if was_active => {
                info!("[PORTFOLIO] Alert {:?} cleared", kind);
                state.active.retain(|k| *k != kind);
            }
            _ => {}
        }
    }

    /// Admission gate for new entries
    ///
    /// Blocks only at Critical. Never closes positions.
    pub async fn can_trade(&self) -> bool {
        let snapshot = self.recalc().await;
        if snapshot.risk_level == RiskLevel::Critical {
            warn!(
                "[PORTFOLIO] Entries blocked: day loss {:.2}% (max {:.2}%), open risk {:.2}% (max {:.2}%)",
                snapshot.day_loss_pct * 100.0,
                self.limits.max_daily_loss_pct * 100.0,
                snapshot.open_risk_pct * 100.0,
                self.limits.max_open_risk_pct * 100.0
            );
            return false;
        }
        true
    }

    pub async fn latest(&self) -> Option<PortfolioSnapshot> {
        self.state.lock().await.history.back().cloned()
    }

    pub async fn history(&self) -> Vec<PortfolioSnapshot> {
        self.state.lock().await.history.iter().cloned().collect()
    }

    pub async fn alerts(&self) -> Vec<RiskAlert> {
        self.state.lock().await.alerts.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn exposure(symbol: &str, class: AssetClass, equity: Decimal, day_pnl: Decimal, risk: Decimal) -> AssetExposure {
        AssetExposure {
            symbol: symbol.to_string(),
            asset_class: class,
            equity,
            day_pnl,
            open_risk: risk,
            position_count: usize::from(!risk.is_zero()),
        }
    }

    fn aggregator() -> (PortfolioRiskAggregator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap(),
        ));
        let agg = PortfolioRiskAggregator::new(
            PortfolioLimits::default(),
            AssetClassTable::default(),
            clock.clone(),
        );
        (agg, clock)
    }

    #[tokio::test]
    async fn test_healthy_portfolio_admits() {
        let (agg, _) = aggregator();
        agg.publish(exposure("BTC-USD", AssetClass::Crypto, dec!(50000), dec!(100), dec!(500)));
        agg.publish(exposure("AAPL", AssetClass::Equity, dec!(50000), dec!(0), dec!(0)));

        assert!(agg.can_trade().await);
        let snap = agg.latest().await.unwrap();
        assert_eq!(snap.total_equity, dec!(100000));
        assert_eq!(snap.position_count, 1);
        // 500 * 1.2 crypto weight / 100k
        assert!((snap.open_risk_pct - 0.006).abs() < 1e-12);
        assert_eq!(snap.risk_level, RiskLevel::Healthy);
    }

    #[tokio::test]
    async fn test_day_loss_beyond_limit_is_critical() {
        let (agg, _) = aggregator();
        // Started the day at 100k, now down 3.5%
        agg.publish(exposure("ES", AssetClass::Future, dec!(96500), dec!(-3500), dec!(0)));

        assert!(!agg.can_trade().await);
        let snap = agg.latest().await.unwrap();
        assert_eq!(snap.risk_level, RiskLevel::Critical);
        assert_eq!(snap.breach_count, 1);
    }

    #[tokio::test]
    async fn test_levels_by_ratio() {
        let (agg, _) = aggregator();
        // 80% of the 3% daily limit
        agg.publish(exposure("ES", AssetClass::Future, dec!(97600), dec!(-2400), dec!(0)));
        assert_eq!(agg.recalc().await.risk_level, RiskLevel::Warning);

        // 95%
        agg.publish(exposure("ES", AssetClass::Future, dec!(97150), dec!(-2850), dec!(0)));
        let snap = agg.recalc().await;
        assert_eq!(snap.risk_level, RiskLevel::Danger);
        assert!(agg.can_trade().await);
    }

    #[tokio::test]
    async fn test_admission_is_idempotent() {
        let (agg, clock) = aggregator();
        agg.publish(exposure("BTC-USD", AssetClass::Crypto, dec!(100000), dec!(-500), dec!(1000)));

        let first = agg.can_trade().await;
        let snap1 = agg.latest().await.unwrap();
        let second = agg.can_trade().await;
        let snap2 = agg.latest().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(snap1, snap2);
        assert_eq!(agg.history().await.len(), 1);
        assert!(agg.alerts().await.is_empty());

        // Unchanged figures are still sampled once the interval passes
        clock.advance(Duration::seconds(61));
        agg.can_trade().await;
        assert_eq!(agg.history().await.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_recalcs_end_on_latest_figures() {
        let (agg, _) = aggregator();
        let agg = Arc::new(agg);
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let agg = agg.clone();
                tokio::spawn(async move {
                    for step in 0..20 {
                        agg.publish(exposure(
                            &format!("SYM-{i}"),
                            AssetClass::Crypto,
                            Decimal::from(1000 + step),
                            dec!(0),
                            dec!(0),
                        ));
                        agg.recalc().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // Every task's last publish precedes its last recalc
        let latest = agg.latest().await.unwrap();
        assert_eq!(latest.total_equity, Decimal::from(16 * 1019));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let limits = PortfolioLimits {
            history_len: 5,
            ..Default::default()
        };
        let agg = PortfolioRiskAggregator::new(limits, AssetClassTable::default(), clock.clone());
        for i in 0..20 {
            agg.publish(exposure("ETH-USD", AssetClass::Crypto, Decimal::from(100000 + i), dec!(0), dec!(0)));
            agg.recalc().await;
        }
        assert_eq!(agg.history().await.len(), 5);
    }

    #[tokio::test]
    async fn test_rapid_loss_and_concentration_alerts_do_not_block() {
        let (agg, clock) = aggregator();
        agg.publish(exposure("BTC-USD", AssetClass::Crypto, dec!(100000), dec!(0), dec!(0)));
        agg.recalc().await;

        clock.advance(Duration::minutes(5));
        // -2.5% in five minutes, but day loss still under the 3% limit
        agg.publish(exposure("BTC-USD", AssetClass::Crypto, dec!(97500), dec!(-2500), dec!(0)));
        assert!(agg.can_trade().await);

        let limits = *agg.limits();
        for i in 0..=limits.max_concurrent_positions {
            agg.publish(exposure(&format!("SYM{i}"), AssetClass::Equity, dec!(1000), dec!(0), dec!(1)));
        }
        assert!(agg.can_trade().await);

        let kinds: Vec<_> = agg.alerts().await.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::RapidLoss, AlertKind::Concentration]);

        // Still active: not raised again
        agg.recalc().await;
        assert_eq!(agg.alerts().await.len(), 2);
    }
}
