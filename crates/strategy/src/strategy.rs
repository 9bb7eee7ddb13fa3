//! Strategy trait and context
//!
//! Strategies are synchronous and side-effect free: they look at the sealed
//! candle plus a read-only context and may propose a [`TradeIdea`]. Sizing,
//! stops and admission are handled downstream.

use aegis_core::{Candle, IndicatorSnapshot, RegimeAnalysis, StrategyKind, TradeIdea};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Tunables shared by the reference strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Candles scanned for the swept extreme in stop-hunt detection
    pub sweep_lookback: usize,
    /// Minimum wick rejection (fraction of candle range) for a stop hunt
    pub sweep_min_wick: f64,
    /// Minimum `(fast - slow) / slow` for trend entries
    pub trend_min_ma_delta: f64,
    /// Minimum ADX for trend entries
    pub trend_min_adx: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Candles defining the range for range bounces
    pub range_lookback: usize,
    /// Maximum distance from the range edge, as a fraction of the range
    pub range_edge_band: f64,
    /// Minimum candle body, in ATRs, for a momentum burst
    pub momentum_body_atr: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            sweep_lookback: 20,
            sweep_min_wick: 0.5,
            trend_min_ma_delta: 0.002,
            trend_min_adx: 25.0,
            rsi_oversold: 35.0,
            rsi_overbought: 65.0,
            range_lookback: 30,
            range_edge_band: 0.15,
            momentum_body_atr: 1.2,
        }
    }
}

/// Read-only view handed to strategies on every candle close
pub struct StrategyContext<'a> {
    pub symbol: &'a str,
    pub indicators: &'a IndicatorSnapshot,
    pub regime: &'a RegimeAnalysis,
    /// Sealed candles, oldest first; the last entry is the candle just closed
    pub candles: &'a VecDeque<Candle>,
    pub params: &'a StrategyParams,
    pub now: DateTime<Utc>,
}

impl StrategyContext<'_> {
    /// Sealed candles before the one just closed, newest last, at most `n`
    pub fn prior(&self, n: usize) -> impl Iterator<Item = &Candle> {
        let len = self.candles.len().saturating_sub(1);
        let skip = len.saturating_sub(n);
        self.candles.iter().take(len).skip(skip)
    }
}

/// Strategy trait - implement this for your trading strategy
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Strategy name for logging
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Called once per sealed candle
    fn on_candle(&mut self, candle: &Candle, ctx: &StrategyContext<'_>) -> Option<TradeIdea>;
}

/// Build the reference implementation for `kind`
pub fn strategy_for(kind: StrategyKind) -> Box<dyn Strategy> {
    use crate::mean_reversion::{RangeBounce, StopHuntReversal};
    use crate::trend::{MomentumScalp, TrendFollow};

    match kind {
        StrategyKind::StopHuntReversal => Box::new(StopHuntReversal),
        StrategyKind::TrendFollow => Box::new(TrendFollow),
        StrategyKind::RangeBounce => Box::new(RangeBounce),
        StrategyKind::MomentumScalp => Box::new(MomentumScalp),
    }
}

/// Reference strategies for the enabled kinds, in priority order
pub fn build_strategies(enabled: &[StrategyKind]) -> Vec<Box<dyn Strategy>> {
    StrategyKind::PRIORITY
        .iter()
        .filter(|k| enabled.contains(k))
        .map(|k| strategy_for(*k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_strategies_keeps_priority_order() {
        let built = build_strategies(&[StrategyKind::MomentumScalp, StrategyKind::StopHuntReversal]);
        let kinds: Vec<_> = built.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![StrategyKind::StopHuntReversal, StrategyKind::MomentumScalp]
        );
    }
}
