//! Adaptive Threshold Module
//!
//! Conditions the minimum acceptable reward/risk ratio and the position-size
//! multiplier on strategy, market regime, recent performance, volatility and
//! trading session.

use aegis_core::{MarketRegime, Quantity, StrategyKind};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Bounds and neutral values for the adaptive module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Closed trades considered for the win probability
    pub history_len: usize,
    /// Win probability assumed without history
    pub neutral_win_prob: f64,
    pub min_rr: f64,
    pub max_rr: f64,
    pub min_size_multiplier: f64,
    pub max_size_multiplier: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            history_len: 30,
            neutral_win_prob: 0.6,
            min_rr: 0.5,
            max_rr: 2.5,
            min_size_multiplier: 0.3,
            max_size_multiplier: 2.0,
        }
    }
}

/// Required RR by win-probability band: >=0.65, >=0.55, >=0.45, below
fn base_curve(strategy: StrategyKind) -> [f64; 4] {
    match strategy {
        StrategyKind::TrendFollow => [1.2, 1.5, 1.8, 2.2],
        StrategyKind::RangeBounce => [1.0, 1.2, 1.5, 1.8],
        StrategyKind::StopHuntReversal => [1.1, 1.4, 1.7, 2.0],
        StrategyKind::MomentumScalp => [0.9, 1.1, 1.4, 1.7],
    }
}

/// RR multiplier for a strategy operating in a regime
fn regime_rr_multiplier(strategy: StrategyKind, regime: MarketRegime) -> f64 {
    use MarketRegime::*;
    use StrategyKind::*;
    match (strategy, regime) {
        (TrendFollow, Trending) => 0.8,
        (TrendFollow, Ranging) => 1.3,
        (TrendFollow, Volatile) => 1.1,
        (TrendFollow, Quiet) => 1.2,
        (RangeBounce, Trending) => 1.3,
        (RangeBounce, Ranging) => 0.8,
        (RangeBounce, Volatile) => 1.2,
        (RangeBounce, Quiet) => 0.9,
        (StopHuntReversal, Trending) => 1.1,
        (StopHuntReversal, Ranging) => 0.9,
        (StopHuntReversal, Volatile) => 0.85,
        (StopHuntReversal, Quiet) => 1.2,
        (MomentumScalp, Trending) => 0.9,
        (MomentumScalp, Ranging) => 1.1,
        (MomentumScalp, Volatile) => 0.9,
        (MomentumScalp, Quiet) => 1.3,
    }
}

/// How much a strategy's edge is trusted in a regime (size multiplier)
fn regime_size_confidence(strategy: StrategyKind, regime: MarketRegime) -> f64 {
    use MarketRegime::*;
    use StrategyKind::*;
    match (strategy, regime) {
        (TrendFollow, Trending) => 1.3,
        (TrendFollow, Ranging) => 0.6,
        (TrendFollow, Volatile) => 0.8,
        (TrendFollow, Quiet) => 0.7,
        (RangeBounce, Trending) => 0.6,
        (RangeBounce, Ranging) => 1.3,
        (RangeBounce, Volatile) => 0.7,
        (RangeBounce, Quiet) => 1.0,
        (StopHuntReversal, Trending) => 0.8,
        (StopHuntReversal, Ranging) => 1.1,
        (StopHuntReversal, Volatile) => 1.2,
        (StopHuntReversal, Quiet) => 0.8,
        (MomentumScalp, Trending) => 1.1,
        (MomentumScalp, Ranging) => 0.8,
        (MomentumScalp, Volatile) => 1.2,
        (MomentumScalp, Quiet) => 0.6,
    }
}

/// Regime-, strategy- and performance-conditioned thresholds
#[derive(Debug, Clone, Default)]
pub struct AdaptiveThresholds {
    config: AdaptiveConfig,
}

impl AdaptiveThresholds {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// Minimum reward/risk an idea must offer to be taken
    pub fn required_rr(
        &self,
        strategy: StrategyKind,
        win_prob: f64,
        volatility: f64,
        trend_strength: f64,
        regime: MarketRegime,
        hour_utc: u32,
    ) -> f64 {
        let win_prob = if win_prob.is_finite() {
            win_prob
        } else {
            self.config.neutral_win_prob
        };
        let curve = base_curve(strategy);
        let base = if win_prob >= 0.65 {
            curve[0]
        } else if win_prob >= 0.55 {
            curve[1]
        } else if win_prob >= 0.45 {
            curve[2]
        } else {
            curve[3]
        };

        let mut rr = base * regime_rr_multiplier(strategy, regime);

        if volatility.is_finite() {
            if volatility > 0.03 {
                rr += 0.2;
            } else if volatility < 0.005 {
                rr -= 0.1;
            }
        }

        if trend_strength.is_finite() && trend_strength > 0.7 {
            if strategy.is_trend_aligned() {
                rr -= 0.1;
            } else {
                rr += 0.1;
            }
        }

        match hour_utc {
            // London/New York overlap: deepest liquidity
            13..=16 => rr -= 0.05,
            // Asian session lull
            0..=5 => rr += 0.1,
            _ => {}
        }

        rr.max(self.config.min_rr).min(self.config.max_rr)
    }

    /// Fraction of the last `history_len` closed trades that were profitable
    ///
    /// `recent_pnls` is ordered newest first. Neutral prior without history.
    pub fn win_probability(&self, recent_pnls: &[Decimal]) -> f64 {
        let window: Vec<_> = recent_pnls.iter().take(self.config.history_len).collect();
        if window.is_empty() {
            return self.config.neutral_win_prob;
        }
        let wins = window.iter().filter(|p| ***p > Decimal::ZERO).count();
        wins as f64 / window.len() as f64
    }

    /// Size multiplier for the given context, clamped to the configured band
    pub fn size_multiplier(
        &self,
        strategy: StrategyKind,
        regime: MarketRegime,
        regime_confidence: f64,
        win_prob: f64,
        rr: f64,
        volatility: f64,
    ) -> f64 {
        let regime_confidence = if regime_confidence.is_finite() {
            regime_confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut m = regime_size_confidence(strategy, regime) * (0.5 + 0.5 * regime_confidence);
        if win_prob.is_finite() && win_prob > 0.65 {
            m *= 1.2;
        }
        if rr.is_finite() && rr >= 2.0 {
            m *= 1.1;
        }
        if volatility.is_finite() && volatility > 0.03 {
            m *= 0.7;
        }
        m.max(self.config.min_size_multiplier)
            .min(self.config.max_size_multiplier)
    }

    /// Scale `base_qty` by the adaptive size multiplier
    ///
    /// The result is not lot-floored; the caller owns instrument rounding.
    #[allow(clippy::too_many_arguments)]
    pub fn dynamic_position_size(
        &self,
        base_qty: Quantity,
        strategy: StrategyKind,
        regime: MarketRegime,
        regime_confidence: f64,
        win_prob: f64,
        rr: f64,
        volatility: f64,
    ) -> Quantity {
        let m = self.size_multiplier(strategy, regime, regime_confidence, win_prob, rr, volatility);
        let m = Decimal::from_f64(m)
            .map(|d| d.round_dp(6))
            .unwrap_or(Decimal::ONE);
        base_qty.checked_mul(m).unwrap_or(base_qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_required_rr_base_and_regime() {
        let a = AdaptiveThresholds::default();
        // 1.5 * 0.8, no other adjustments at 10:00 UTC with moderate inputs
        let rr = a.required_rr(StrategyKind::TrendFollow, 0.6, 0.01, 0.5, MarketRegime::Trending, 10);
        assert!((rr - 1.2).abs() < 1e-9);

        let rr = a.required_rr(StrategyKind::RangeBounce, 0.3, 0.01, 0.5, MarketRegime::Trending, 10);
        assert!((rr - 1.8 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_required_rr_adjustments() {
        let a = AdaptiveThresholds::default();
        let base = a.required_rr(StrategyKind::StopHuntReversal, 0.7, 0.01, 0.5, MarketRegime::Ranging, 10);
        let volatile = a.required_rr(StrategyKind::StopHuntReversal, 0.7, 0.05, 0.5, MarketRegime::Ranging, 10);
        assert!((volatile - base - 0.2).abs() < 1e-9);

        // Strong trend: easier for trend strategies, harder for counter-trend
        let trend = a.required_rr(StrategyKind::TrendFollow, 0.6, 0.01, 0.9, MarketRegime::Trending, 10);
        assert!((trend - 1.1).abs() < 1e-9);
        let counter = a.required_rr(StrategyKind::RangeBounce, 0.6, 0.01, 0.9, MarketRegime::Ranging, 10);
        assert!((counter - (1.2 * 0.8 + 0.1)).abs() < 1e-9);

        let overlap = a.required_rr(StrategyKind::RangeBounce, 0.6, 0.01, 0.5, MarketRegime::Ranging, 14);
        let asia = a.required_rr(StrategyKind::RangeBounce, 0.6, 0.01, 0.5, MarketRegime::Ranging, 3);
        assert!((asia - overlap - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_required_rr_bounded_under_pathological_inputs() {
        let a = AdaptiveThresholds::default();
        for kind in StrategyKind::PRIORITY {
            for regime in [
                MarketRegime::Trending,
                MarketRegime::Ranging,
                MarketRegime::Volatile,
                MarketRegime::Quiet,
            ] {
                for wp in [f64::NAN, f64::NEG_INFINITY, -5.0, 0.0, 1.0, 9.0] {
                    for vol in [f64::NAN, f64::INFINITY, -1.0, 0.0, 10.0] {
                        for hour in [0, 14, 23, 99] {
                            let rr = a.required_rr(kind, wp, vol, f64::NAN, regime, hour);
                            assert!(rr.is_finite());
                            assert!((0.5..=2.5).contains(&rr), "{kind} {regime} -> {rr}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_inverted_bands_do_not_panic() {
        let a = AdaptiveThresholds::new(AdaptiveConfig {
            min_rr: 3.0,
            min_size_multiplier: 2.5,
            ..Default::default()
        });
        let rr = a.required_rr(StrategyKind::TrendFollow, 0.6, 0.01, 0.5, MarketRegime::Trending, 10);
        assert_eq!(rr, 2.5);
        let m = a.size_multiplier(StrategyKind::TrendFollow, MarketRegime::Trending, 0.5, 0.6, 2.0, 0.01);
        assert_eq!(m, 2.0);
    }

    #[test]
    fn test_win_probability() {
        let a = AdaptiveThresholds::default();
        assert_eq!(a.win_probability(&[]), 0.6);
        assert_eq!(a.win_probability(&[dec!(1), dec!(-1), dec!(2), dec!(0)]), 0.5);

        // Only the newest 30 count
        let mut pnls = vec![dec!(-1); 30];
        pnls.extend(vec![dec!(5); 30]);
        assert_eq!(a.win_probability(&pnls), 0.0);
    }

    #[test]
    fn test_dynamic_size_clamped() {
        let a = AdaptiveThresholds::default();
        let big = a.dynamic_position_size(
            dec!(10),
            StrategyKind::TrendFollow,
            MarketRegime::Trending,
            1.0,
            0.9,
            3.0,
            0.01,
        );
        // 1.3 * 1.0 * 1.2 * 1.1 = 1.716
        assert_eq!(big, dec!(17.16));

        let small = a.dynamic_position_size(
            dec!(10),
            StrategyKind::RangeBounce,
            MarketRegime::Trending,
            0.0,
            0.3,
            1.0,
            0.08,
        );
        // 0.6 * 0.5 * 0.7 = 0.21 -> floor 0.3
        assert_eq!(small, dec!(3));

        let m = a.size_multiplier(StrategyKind::TrendFollow, MarketRegime::Trending, f64::NAN, f64::NAN, f64::NAN, f64::NAN);
        assert!((0.3..=2.0).contains(&m));
    }
}
