//! Stop and target planning
//!
//! An ordered chain of [`StopMethod`]s; the first method that can produce a
//! level wins. ATR is primary; support/resistance and a fixed volatility
//! percentage only apply when ATR is unavailable.

use aegis_core::{PositionSide, Price};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMethod {
    Atr,
    SupportResistance,
    VolatilityPct,
}

/// Planned protective stop and profit target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopTarget {
    pub stop: Price,
    pub target: Price,
    pub method: StopMethod,
}

impl StopTarget {
    /// Reward-to-risk implied by the levels around `entry`
    pub fn reward_risk(&self, entry: Price) -> f64 {
        let risk = (entry - self.stop).abs();
        if risk.is_zero() {
            return 0.0;
        }
        ((self.target - entry).abs() / risk).to_f64().unwrap_or(0.0)
    }
}

/// What the planner needs to know about the trade
#[derive(Debug, Clone, Copy)]
pub struct StopInputs {
    pub side: PositionSide,
    pub entry: Price,
    pub atr: f64,
    /// Idea conviction; stretches the target
    pub confidence: f64,
    /// Recent (support, resistance)
    pub levels: Option<(Price, Price)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopPlannerConfig {
    pub methods: Vec<StopMethod>,
    /// Stop distance in ATRs
    pub atr_stop_multiple: f64,
    /// Target distance in ATRs at neutral confidence
    pub atr_target_multiple: f64,
    /// Buffer beyond the support/resistance level, as a fraction of price
    pub level_buffer_pct: f64,
    /// Stop distance for the percentage fallback
    pub volatility_stop_pct: f64,
    /// Target/stop distance ratio for the percentage fallback
    pub volatility_reward_multiple: f64,
}

impl Default for StopPlannerConfig {
    fn default() -> Self {
        Self {
            methods: vec![
                StopMethod::Atr,
                StopMethod::SupportResistance,
                StopMethod::VolatilityPct,
            ],
            atr_stop_multiple: 1.5,
            atr_target_multiple: 3.0,
            level_buffer_pct: 0.001,
            volatility_stop_pct: 0.02,
            volatility_reward_multiple: 2.0,
        }
    }
}

fn dec(x: f64) -> Option<Decimal> {
    if x.is_finite() {
        Decimal::from_f64(x).map(|d| d.round_dp(8))
    } else {
        None
    }
}

/// Scales a target distance by conviction: 0.75x at zero, 1.25x at full
fn stretch(confidence: f64) -> f64 {
    let c = if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.5
    };
    0.75 + 0.5 * c
}

#[derive(Debug, Clone, Default)]
pub struct StopPlanner {
    config: StopPlannerConfig,
}

impl StopPlanner {
    pub fn new(config: StopPlannerConfig) -> Self {
        Self { config }
    }

    /// First level produced by the configured chain
    pub fn plan(&self, inputs: &StopInputs) -> Option<StopTarget> {
        if inputs.entry <= Decimal::ZERO {
            return None;
        }
        let atr_available = inputs.atr.is_finite() && inputs.atr > 0.0;
        self.config.methods.iter().find_map(|method| match method {
            StopMethod::Atr => self.atr(inputs),
            // Fallbacks only when ATR is missing
            StopMethod::SupportResistance if !atr_available => self.levels(inputs),
            StopMethod::VolatilityPct if !atr_available => self.percentage(inputs),
            _ => None,
        })
    }

    fn place(side: PositionSide, entry: Price, stop_dist: Decimal, target_dist: Decimal, method: StopMethod) -> Option<StopTarget> {
        if stop_dist <= Decimal::ZERO || target_dist <= Decimal::ZERO {
            return None;
        }
        let (stop, target) = match side {
            PositionSide::Long => (entry - stop_dist, entry + target_dist),
            PositionSide::Short => (entry + stop_dist, entry - target_dist),
        };
        if stop <= Decimal::ZERO || target <= Decimal::ZERO {
            return None;
        }
        Some(StopTarget { stop, target, method })
    }

    fn atr(&self, i: &StopInputs) -> Option<StopTarget> {
        if !i.atr.is_finite() || i.atr <= 0.0 {
            return None;
        }
        let stop_dist = dec(i.atr * self.config.atr_stop_multiple)?;
        let target_dist = dec(i.atr * self.config.atr_target_multiple * stretch(i.confidence))?;
        Self::place(i.side, i.entry, stop_dist, target_dist, StopMethod::Atr)
    }

    fn levels(&self, i: &StopInputs) -> Option<StopTarget> {
        let (support, resistance) = i.levels?;
        let buffer = i.entry * dec(self.config.level_buffer_pct)?;
        let (stop, target) = match i.side {
            PositionSide::Long if support < i.entry && resistance > i.entry => {
                (support - buffer, resistance)
            }
            PositionSide::Short if resistance > i.entry && support < i.entry => {
                (resistance + buffer, support)
            }
            _ => return None,
        };
        if stop <= Decimal::ZERO {
            return None;
        }
        Some(StopTarget {
            stop,
            target,
            method: StopMethod::SupportResistance,
        })
    }

    fn percentage(&self, i: &StopInputs) -> Option<StopTarget> {
        let stop_dist = i.entry * dec(self.config.volatility_stop_pct)?;
        let target_dist =
            stop_dist * dec(self.config.volatility_reward_multiple * stretch(i.confidence))?;
        Self::place(i.side, i.entry, stop_dist, target_dist, StopMethod::VolatilityPct)
    }
}
