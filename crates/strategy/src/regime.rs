//! Market regime classification
//!
//! A pure function of five normalized inputs derived from an
//! [`IndicatorSnapshot`]:
//!
//! | input          | definition                  |
//! |----------------|-----------------------------|
//! | trend strength | `adx / 50`, clamped to 0..1 |
//! | volatility     | `atr / close`               |
//! | momentum       | `|rsi - 50| / 50`           |
//! | range          | Bollinger width             |
//! | direction      | `(fast - slow) / slow`      |
//!
//! Priority: Trending > Volatile > Quiet > Ranging.

use aegis_core::{IndicatorSnapshot, MarketRegime, RegimeAnalysis};
use serde::{Deserialize, Serialize};

/// Classification thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// Minimum trend strength for Trending
    pub trend_strength: f64,
    /// Minimum direction-agreeing momentum for Trending
    pub trend_momentum: f64,
    /// Volatility at or above which the market is Volatile
    pub volatile_volatility: f64,
    /// Band width at or above which the market is Volatile
    pub volatile_range: f64,
    pub quiet_trend_strength: f64,
    pub quiet_volatility: f64,
    pub quiet_range: f64,
    pub quiet_momentum: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            trend_strength: 0.5,
            trend_momentum: 0.2,
            volatile_volatility: 0.03,
            volatile_range: 0.08,
            quiet_trend_strength: 0.4,
            quiet_volatility: 0.01,
            quiet_range: 0.03,
            quiet_momentum: 0.15,
        }
    }
}

/// Classifies indicator snapshots into market regimes
#[derive(Debug, Clone, Default)]
pub struct RegimeDetector {
    thresholds: RegimeThresholds,
}

/// How far `value` is past `threshold`, as a fraction of the room above it
fn margin_above(value: f64, threshold: f64, ceiling: f64) -> f64 {
    let room = (ceiling - threshold).max(f64::EPSILON);
    ((value - threshold) / room).clamp(0.0, 1.0)
}

/// How far `value` is below `threshold`, as a fraction of the threshold
fn margin_below(value: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 0.0;
    }
    ((threshold - value) / threshold).clamp(0.0, 1.0)
}

fn finite_or(x: f64, fallback: f64) -> f64 {
    if x.is_finite() { x } else { fallback }
}

impl RegimeDetector {
    pub fn new(thresholds: RegimeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RegimeThresholds {
        &self.thresholds
    }

    pub fn analyze(&self, ind: &IndicatorSnapshot) -> RegimeAnalysis {
        let th = &self.thresholds;

        let trend_strength = (finite_or(ind.adx, 25.0) / 50.0).clamp(0.0, 1.0);
        let volatility = finite_or(ind.atr_pct(), 0.0).max(0.0);
        let rsi = finite_or(ind.rsi, 50.0);
        let momentum = ((rsi - 50.0).abs() / 50.0).clamp(0.0, 1.0);
        let range = finite_or(ind.bb_width, 0.0).max(0.0);
        let direction = finite_or(ind.ma_delta(), 0.0);

        // Momentum only counts toward a trend when RSI agrees with the MAs.
        let agrees = (direction > 0.0 && rsi > 50.0) || (direction < 0.0 && rsi < 50.0);
        let trend_momentum = if agrees { momentum } else { 0.0 };

        let (regime, confidence) = if trend_strength >= th.trend_strength
            && trend_momentum >= th.trend_momentum
        {
            let margin = margin_above(trend_strength, th.trend_strength, 1.0)
                .min(margin_above(trend_momentum, th.trend_momentum, 1.0));
            (MarketRegime::Trending, 0.5 + 0.5 * margin)
        } else if volatility >= th.volatile_volatility || range >= th.volatile_range {
            let margin = margin_above(volatility, th.volatile_volatility, 2.0 * th.volatile_volatility)
                .max(margin_above(range, th.volatile_range, 2.0 * th.volatile_range));
            (MarketRegime::Volatile, 0.5 + 0.5 * margin)
        } else if trend_strength < th.quiet_trend_strength
            && volatility < th.quiet_volatility
            && range < th.quiet_range
            && momentum < th.quiet_momentum
        {
            let margin = margin_below(volatility, th.quiet_volatility)
                .min(margin_below(range, th.quiet_range));
            (MarketRegime::Quiet, 0.5 + 0.5 * margin)
        } else {
            // Fallback: the closer to no trend, the surer.
            let margin = margin_below(trend_strength, th.trend_strength);
            (MarketRegime::Ranging, 0.3 + 0.4 * margin)
        };

        RegimeAnalysis {
            regime,
            confidence: confidence.clamp(0.0, 1.0),
            trend_strength,
            volatility,
            momentum,
        }
    }
}
