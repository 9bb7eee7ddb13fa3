//! Per-asset Position/Risk Manager
//!
//! Owns the equity, day PnL and (at most one) open position of a single
//! symbol. Sizing, trailing stops and exit evaluation all read from this
//! state; only fills and closes mutate it.

use aegis_core::{
    ExitReason, Fill, InstrumentSpec, Position, PositionSide, Price, Quantity, StrategyKind,
    Timestamp,
};
use chrono::{Duration, NaiveDate};
use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::parameters::{AssetClassParams, RiskConfig};
use crate::portfolio::AssetExposure;

/// Mutable per-asset risk state
///
/// Cloned wholesale for settlement compensation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub equity: Decimal,
    pub day_pnl: Decimal,
    pub position: Option<Position>,
    pub trading_day: NaiveDate,
}

/// Breakdown of the multipliers applied to the base risk fraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeMultipliers {
    pub asset: f64,
    pub volatility: f64,
    pub confidence: f64,
    pub heat: f64,
    pub equity_curve: f64,
    pub distance: f64,
}

impl SizeMultipliers {
    pub fn product(&self) -> f64 {
        self.asset * self.volatility * self.confidence * self.heat * self.equity_curve * self.distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeDecision {
    /// Lot-floored quantity, never below the minimum lot
    pub quantity: Quantity,
    /// Fraction of equity put at risk
    pub risk_fraction: f64,
    pub multipliers: SizeMultipliers,
}

/// Result of exit evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitCheck {
    pub should_exit: bool,
    pub reason: Option<ExitReason>,
}

impl ExitCheck {
    fn exit(reason: ExitReason) -> Self {
        Self {
            should_exit: true,
            reason: Some(reason),
        }
    }

    fn hold(reason: Option<ExitReason>) -> Self {
        Self {
            should_exit: false,
            reason,
        }
    }
}

fn decimal_from(x: f64) -> Option<Decimal> {
    if x.is_finite() { Decimal::from_f64(x) } else { None }
}

/// Risk manager for a single symbol
pub struct AssetRiskManager {
    spec: InstrumentSpec,
    config: RiskConfig,
    class: AssetClassParams,
    state: RiskState,
}

impl AssetRiskManager {
    pub fn new(spec: InstrumentSpec, config: RiskConfig, equity: Decimal, today: NaiveDate) -> Self {
        let class = *config.asset_classes.get(spec.asset_class);
        Self {
            spec,
            config,
            class,
            state: RiskState {
                equity,
                day_pnl: Decimal::ZERO,
                position: None,
                trading_day: today,
            },
        }
    }

    pub fn symbol(&self) -> &str {
        &self.spec.symbol
    }

    pub fn spec(&self) -> &InstrumentSpec {
        &self.spec
    }

    pub fn class_params(&self) -> &AssetClassParams {
        &self.class
    }

    pub fn equity(&self) -> Decimal {
        self.state.equity
    }

    pub fn day_pnl(&self) -> Decimal {
        self.state.day_pnl
    }

    pub fn position(&self) -> Option<&Position> {
        self.state.position.as_ref()
    }

    pub fn has_position(&self) -> bool {
        self.state.position.is_some()
    }

    pub fn min_hold(&self) -> Duration {
        Duration::minutes(self.class.min_hold_minutes.max(0))
    }

    /// Open risk of the current position as a fraction of equity
    pub fn open_risk_pct(&self) -> f64 {
        let Some(pos) = &self.state.position else {
            return 0.0;
        };
        if self.state.equity <= Decimal::ZERO {
            return 0.0;
        }
        (pos.initial_risk / self.state.equity).to_f64().unwrap_or(0.0)
    }

    /// Size a prospective trade
    ///
    /// `risk_fraction = base × asset × volatility × confidence × heat ×
    /// equity_curve × distance`, and the quantity is the money at risk
    /// divided by the stop distance, floored to the lot.
    pub fn size_trade(
        &self,
        stop: Price,
        entry: Price,
        confidence: f64,
        atr: f64,
    ) -> Result<SizeDecision> {
        if entry <= Decimal::ZERO || stop <= Decimal::ZERO {
            return Err(RiskError::InvalidInput(format!(
                "{}: non-positive price (entry {}, stop {})",
                self.spec.symbol, entry, stop
            )));
        }
        let distance = (entry - stop).abs();
        if distance.is_zero() {
            return Err(RiskError::InvalidInput(format!(
                "{}: zero stop distance at {}",
                self.spec.symbol, entry
            )));
        }
        if !confidence.is_finite() {
            return Err(RiskError::InvalidInput(format!(
                "{}: non-finite confidence",
                self.spec.symbol
            )));
        }
        if self.state.equity <= Decimal::ZERO {
            return Err(RiskError::InvalidInput(format!(
                "{}: non-positive equity {}",
                self.spec.symbol, self.state.equity
            )));
        }

        let entry_f = entry.to_f64().unwrap_or(0.0);
        let volatility = if atr.is_finite() && atr > 0.0 && entry_f > 0.0 {
            (self.config.target_volatility / (atr / entry_f)).clamp(0.6, 1.5)
        } else {
            1.0
        };
        let heat = if self.open_risk_pct() > self.config.heat_threshold {
            0.7
        } else {
            1.0
        };
        let drawdown_line = -self.state.equity * Decimal::new(2, 2);
        let equity_curve = if self.state.day_pnl < drawdown_line { 0.8 } else { 1.0 };
        let distance_pct = (distance / entry).to_f64().unwrap_or(0.0);
        let distance_mult = if distance_pct > 0.02 { 0.8 } else { 1.0 };

        let multipliers = SizeMultipliers {
            asset: self.class.risk_multiplier,
            volatility,
            confidence: confidence.clamp(0.5, 1.0),
            heat,
            equity_curve,
            distance: distance_mult,
        };
        let risk_fraction = self.config.base_risk_pct * multipliers.product();

        let overflow = || {
            RiskError::InvalidInput(format!(
                "{}: size overflows for equity {} over stop distance {}",
                self.spec.symbol, self.state.equity, distance
            ))
        };
        let risk_money = decimal_from(risk_fraction)
            .unwrap_or(Decimal::ZERO)
            .checked_mul(self.state.equity)
            .ok_or_else(overflow)?;
        let raw = risk_money.checked_div(distance).ok_or_else(overflow)?;
        let quantity = self
            .spec
            .floor_to_lot(raw)
            .ok_or_else(overflow)?
            .max(self.spec.lot_size);

        Ok(SizeDecision {
            quantity,
            risk_fraction,
            multipliers,
        })
    }

    /// Ratchet the trailing stop
    ///
    /// Returns the new stop when it moved. The stop only trails once the
    /// unrealized gain reaches the asset-class activation threshold, and only
    /// ever tightens.
    pub fn update_stops(&mut self, price: Price, atr: f64) -> Option<Price> {
        let activation = self.class.trailing_activation_pct;
        let multiple = self.class.trailing_atr_multiple;
        let pos = self.state.position.as_mut()?;

        let gain = pos.pnl_pct(price).to_f64().unwrap_or(0.0);
        if gain < activation {
            return None;
        }
        if !atr.is_finite() || atr <= 0.0 {
            return None;
        }
        let offset = decimal_from(atr * multiple)?;
        let candidate = match pos.side {
            PositionSide::Long => price - offset,
            PositionSide::Short => price + offset,
        }
        .round_dp(8);

        if pos.ratchet_stop(candidate) {
            info!(
                "[RISK] {} trailing stop -> {} (gain {:.2}%)",
                pos.symbol,
                candidate,
                gain * 100.0
            );
            Some(candidate)
        } else {
            None
        }
    }

    /// Evaluate exits in strict order: stop-loss, min hold, take-profit
    pub fn check_exit_conditions(&self, price: Price, now: Timestamp) -> ExitCheck {
        let Some(pos) = &self.state.position else {
            return ExitCheck::default();
        };
        if pos.stop_breached(price) {
            return ExitCheck::exit(ExitReason::StopLoss);
        }
        if now - pos.entry_time < self.min_hold() {
            return ExitCheck::hold(Some(ExitReason::MinHoldViolated));
        }
        if pos.target_reached(price) {
            return ExitCheck::exit(ExitReason::TakeProfit);
        }
        ExitCheck::hold(None)
    }

    /// True once the open position has been held for the minimum time
    pub fn min_hold_elapsed(&self, now: Timestamp) -> bool {
        self.state
            .position
            .as_ref()
            .is_some_and(|p| now - p.entry_time >= self.min_hold())
    }

    /// Open a position from an entry fill
    pub fn open_position(
        &mut self,
        fill: &Fill,
        stop: Price,
        target: Price,
        strategy: StrategyKind,
    ) -> Result<Position> {
        if self.state.position.is_some() {
            return Err(RiskError::PositionAlreadyOpen(self.spec.symbol.clone()));
        }
        if fill.quantity <= Decimal::ZERO || fill.price <= Decimal::ZERO {
            return Err(RiskError::InvalidInput(format!(
                "{}: fill qty {} @ {}",
                self.spec.symbol, fill.quantity, fill.price
            )));
        }
        let side = match fill.side {
            aegis_core::Side::Buy => PositionSide::Long,
            aegis_core::Side::Sell => PositionSide::Short,
        };
        let stop_ok = match side {
            PositionSide::Long => stop < fill.price,
            PositionSide::Short => stop > fill.price,
        };
        if !stop_ok || stop <= Decimal::ZERO {
            return Err(RiskError::InvalidInput(format!(
                "{}: stop {} on wrong side of {} fill at {}",
                self.spec.symbol, stop, side, fill.price
            )));
        }

        let position = Position::new(
            self.spec.symbol.clone(),
            side,
            fill.quantity,
            fill.price,
            stop,
            target,
            strategy,
            fill.timestamp,
        )
        .with_entry_fee(fill.fee);

        info!(
            "[RISK] {} opened {} {} @ {} stop {} target {}",
            self.spec.symbol, side, fill.quantity, fill.price, stop, target
        );
        self.state.position = Some(position.clone());
        Ok(position)
    }

    /// Attach scoring-gate metadata to the open position
    pub fn tag_position(&mut self, record_id: Option<uuid::Uuid>, features: Option<Vec<f64>>) {
        if let Some(pos) = self.state.position.as_mut() {
            pos.gate_record_id = record_id;
            pos.entry_features = features;
        }
    }

    /// Close `quantity` of the open position at `price`, paying `fee`
    ///
    /// Returns the realized PnL net of the entry fee share and exit fee.
    pub fn close_position(&mut self, quantity: Quantity, price: Price, fee: Decimal) -> Result<Decimal> {
        let symbol = self.spec.symbol.clone();
        let pos = self
            .state
            .position
            .as_mut()
            .ok_or_else(|| RiskError::NoPosition(symbol.clone()))?;

        if quantity <= Decimal::ZERO || quantity > pos.quantity || price <= Decimal::ZERO {
            return Err(RiskError::InvalidInput(format!(
                "{}: close {} of {} @ {}",
                symbol, quantity, pos.quantity, price
            )));
        }

        let share = quantity / pos.quantity;
        let entry_fee_share = pos.entry_fee * share;
        let pnl = pos.price_delta(price) * quantity - entry_fee_share - fee;

        self.state.equity += pnl;
        self.state.day_pnl += pnl;

        if quantity == pos.quantity {
            info!("[RISK] {} closed {} @ {} pnl {}", symbol, quantity, price, pnl);
            self.state.position = None;
        } else {
            pos.quantity -= quantity;
            pos.entry_fee -= entry_fee_share;
            pos.initial_risk -= pos.initial_risk * share;
            info!(
                "[RISK] {} partial close {} @ {} pnl {} ({} remaining)",
                symbol, quantity, price, pnl, pos.quantity
            );
        }
        Ok(pnl)
    }

    /// Replace equity (startup load or external reconciliation)
    pub fn load_equity(&mut self, equity: Decimal) {
        info!("[RISK] {} equity loaded: {}", self.spec.symbol, equity);
        self.state.equity = equity;
    }

    /// Roll the trading day. Returns true when the day changed.
    pub fn reset_day(&mut self, today: NaiveDate) -> bool {
        if today == self.state.trading_day {
            return false;
        }
        info!(
            "[RISK] {} daily reset: day PnL was {}",
            self.spec.symbol, self.state.day_pnl
        );
        self.state.day_pnl = Decimal::ZERO;
        self.state.trading_day = today;
        true
    }

    pub fn snapshot(&self) -> RiskState {
        self.state.clone()
    }

    pub fn restore(&mut self, state: RiskState) {
        self.state = state;
    }

    /// Drop a position whose state can no longer be trusted
    pub fn purge_invalid_position(&mut self) -> Option<Position> {
        let invalid = self.state.position.as_ref().is_some_and(|p| {
            p.quantity <= Decimal::ZERO
                || p.entry_price <= Decimal::ZERO
                || p.stop_price <= Decimal::ZERO
                || p.target_price <= Decimal::ZERO
        });
        if invalid {
            let dropped = self.state.position.take();
            warn!("[ANOMALY] {} purged invalid position {:?}", self.spec.symbol, dropped);
            return dropped;
        }
        None
    }

    /// Exposure published to the portfolio aggregator
    pub fn exposure(&self) -> AssetExposure {
        AssetExposure {
            symbol: self.spec.symbol.clone(),
            asset_class: self.spec.asset_class,
            equity: self.state.equity,
            day_pnl: self.state.day_pnl,
            open_risk: self
                .state
                .position
                .as_ref()
                .map_or(Decimal::ZERO, |p| p.initial_risk),
            position_count: usize::from(self.state.position.is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{AssetClass, Order, OrderIntent, Side};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 2, 1, 14, 0, 0).unwrap()
    }

    fn manager(class: AssetClass) -> AssetRiskManager {
        AssetRiskManager::new(
            InstrumentSpec::new("BTC-USD", class, dec!(0.001)),
            RiskConfig::default(),
            dec!(100000),
            t0().date_naive(),
        )
    }

    fn fill(side: Side, qty: Decimal, price: Decimal, fee: Decimal) -> Fill {
        let order = Order::new(
            "BTC-USD",
            side,
            qty,
            price,
            OrderIntent::Entry,
            StrategyKind::TrendFollow,
            t0(),
        );
        Fill::for_order(&order, price, fee, t0())
    }

    fn open_long(m: &mut AssetRiskManager) {
        m.open_position(
            &fill(Side::Buy, dec!(1), dec!(100), dec!(0)),
            dec!(98),
            dec!(106),
            StrategyKind::TrendFollow,
        )
        .unwrap();
    }

    #[test]
    fn test_size_trade_basic() {
        let m = manager(AssetClass::Equity);
        // 1% of 100k = 1000 at risk, distance 2 -> 500 units; atr/entry = 2% = target
        let d = m.size_trade(dec!(98), dec!(100), 1.0, 2.0).unwrap();
        assert!((d.risk_fraction - 0.01).abs() < 1e-12);
        assert_eq!(d.quantity, dec!(500));
    }

    #[test]
    fn test_size_trade_applies_multipliers() {
        let m = manager(AssetClass::Crypto);
        // distance 5% -> 0.8; confidence floored to 0.5; atr 0 -> volatility 1.0
        let d = m.size_trade(dec!(95), dec!(100), 0.1, 0.0).unwrap();
        assert_eq!(d.multipliers.confidence, 0.5);
        assert_eq!(d.multipliers.distance, 0.8);
        assert_eq!(d.multipliers.volatility, 1.0);
        assert!((d.risk_fraction - 0.01 * 0.8 * 0.5 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_size_trade_never_below_min_lot() {
        let mut m = manager(AssetClass::Crypto);
        m.load_equity(dec!(1));
        let d = m.size_trade(dec!(50000), dec!(60000), 1.0, 100.0).unwrap();
        assert_eq!(d.quantity, dec!(0.001));
    }

    #[test]
    fn test_size_trade_rejects_invalid_inputs() {
        let m = manager(AssetClass::Crypto);
        assert!(matches!(
            m.size_trade(dec!(100), dec!(100), 0.8, 1.0),
            Err(RiskError::InvalidInput(_))
        ));
        assert!(m.size_trade(dec!(-1), dec!(100), 0.8, 1.0).is_err());
        assert!(m.size_trade(dec!(98), dec!(100), f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_size_trade_overflow_is_invalid_input() {
        let mut m = manager(AssetClass::Crypto);
        m.load_equity(dec!(10000000000000000000000));
        let stop = dec!(0.99999999999999999999);
        assert!(matches!(
            m.size_trade(stop, dec!(1), 1.0, 0.0),
            Err(RiskError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_trailing_stop_activation_and_ratchet() {
        let mut m = manager(AssetClass::Crypto);
        open_long(&mut m);

        // +1% is below the 1.5% crypto activation
        assert_eq!(m.update_stops(dec!(101), 2.0), None);

        let moved = m.update_stops(dec!(106), 2.0).unwrap();
        assert!(moved > dec!(98) && moved <= dec!(104));
        assert_eq!(m.position().unwrap().stop_price, dec!(104));

        // Pullback must not loosen the stop
        assert_eq!(m.update_stops(dec!(105), 2.0), None);
        assert_eq!(m.position().unwrap().stop_price, dec!(104));
    }

    #[test]
    fn test_stop_breach_inside_min_hold_is_stop_loss() {
        let mut m = manager(AssetClass::Crypto);
        open_long(&mut m);
        let soon = t0() + Duration::minutes(1);

        let check = m.check_exit_conditions(dec!(97), soon);
        assert!(check.should_exit);
        assert_eq!(check.reason, Some(ExitReason::StopLoss));

        // Target reached but min hold not elapsed
        let check = m.check_exit_conditions(dec!(107), soon);
        assert!(!check.should_exit);
        assert_eq!(check.reason, Some(ExitReason::MinHoldViolated));

        let later = t0() + Duration::minutes(20);
        let check = m.check_exit_conditions(dec!(107), later);
        assert_eq!(check.reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn test_no_position_no_exit() {
        let m = manager(AssetClass::Crypto);
        assert_eq!(m.check_exit_conditions(dec!(1), t0()), ExitCheck::default());
    }

    #[test]
    fn test_close_position_realizes_pnl_and_fees() {
        let mut m = manager(AssetClass::Crypto);
        m.open_position(
            &fill(Side::Buy, dec!(2), dec!(100), dec!(1)),
            dec!(98),
            dec!(106),
            StrategyKind::TrendFollow,
        )
        .unwrap();
        assert!((m.open_risk_pct() - 4.0 / 100000.0).abs() < 1e-12);

        // Half: 5 * 1 - 0.5 entry fee - 0.25 exit fee
        let pnl = m.close_position(dec!(1), dec!(105), dec!(0.25)).unwrap();
        assert_eq!(pnl, dec!(4.25));
        let pos = m.position().unwrap();
        assert_eq!(pos.quantity, dec!(1));
        assert_eq!(pos.initial_risk, dec!(2));
        assert_eq!(pos.entry_fee, dec!(0.5));

        let pnl = m.close_position(dec!(1), dec!(97), dec!(0)).unwrap();
        assert_eq!(pnl, dec!(-3.5));
        assert!(!m.has_position());
        assert_eq!(m.equity(), dec!(100000.75));
        assert_eq!(m.day_pnl(), dec!(0.75));
        assert_eq!(m.open_risk_pct(), 0.0);
    }

    #[test]
    fn test_single_position_per_symbol() {
        let mut m = manager(AssetClass::Crypto);
        open_long(&mut m);
        let again = m.open_position(
            &fill(Side::Sell, dec!(1), dec!(100), dec!(0)),
            dec!(102),
            dec!(95),
            StrategyKind::RangeBounce,
        );
        assert!(matches!(again, Err(RiskError::PositionAlreadyOpen(_))));
    }

    #[test]
    fn test_open_rejects_stop_on_wrong_side() {
        let mut m = manager(AssetClass::Crypto);
        let res = m.open_position(
            &fill(Side::Sell, dec!(1), dec!(100), dec!(0)),
            dec!(98),
            dec!(95),
            StrategyKind::RangeBounce,
        );
        assert!(res.is_err());
        assert!(!m.has_position());
    }

    #[test]
    fn test_snapshot_restore_and_reset_day() {
        let mut m = manager(AssetClass::Equity);
        let before = m.snapshot();
        open_long(&mut m);
        m.close_position(dec!(1), dec!(90), dec!(0)).unwrap();
        assert_eq!(m.day_pnl(), dec!(-10));

        m.restore(before.clone());
        assert_eq!(m.snapshot(), before);

        m.close_position(dec!(1), dec!(1), dec!(0)).unwrap_err();
        open_long(&mut m);
        m.close_position(dec!(1), dec!(90), dec!(0)).unwrap();
        assert!(!m.reset_day(t0().date_naive()));
        assert!(m.reset_day(t0().date_naive().succ_opt().unwrap()));
        assert_eq!(m.day_pnl(), Decimal::ZERO);
        assert_eq!(m.equity(), dec!(99990));
    }

    #[test]
    fn test_exposure_reflects_position() {
        let mut m = manager(AssetClass::Future);
        assert_eq!(m.exposure().position_count, 0);
        open_long(&mut m);
        let e = m.exposure();
        assert_eq!(e.position_count, 1);
        assert_eq!(e.open_risk, dec!(2));
        assert_eq!(e.asset_class, AssetClass::Future);
    }
}
