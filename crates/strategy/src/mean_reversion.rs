//! Reversal strategies
//!
//! - [`StopHuntReversal`]: a candle sweeps beyond the recent extreme, leaves a
//!   long rejection wick and closes back inside. Fade the sweep.
//! - [`RangeBounce`]: in a ranging or quiet market, buy near support with
//!   oversold RSI and sell near resistance with overbought RSI.

use aegis_core::{Candle, MarketRegime, PositionSide, StrategyKind, TradeIdea};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::strategy::{Strategy, StrategyContext};

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Fades liquidity sweeps beyond recent swing extremes
#[derive(Debug, Default, Clone, Copy)]
pub struct StopHuntReversal;

impl Strategy for StopHuntReversal {
    fn kind(&self) -> StrategyKind {
        StrategyKind::StopHuntReversal
    }

    fn on_candle(&mut self, candle: &Candle, ctx: &StrategyContext<'_>) -> Option<TradeIdea> {
        let p = ctx.params;
        let mut prior = ctx.prior(p.sweep_lookback).peekable();
        prior.peek()?;
        let (swing_low, swing_high) = prior.fold((Decimal::MAX, Decimal::MIN), |(lo, hi), c| {
            (lo.min(c.low), hi.max(c.high))
        });

        let range = candle.range();
        if range.is_zero() {
            return None;
        }
        let body_low = candle.open.min(candle.close);
        let body_high = candle.open.max(candle.close);
        let lower_wick = to_f64((body_low - candle.low) / range);
        let upper_wick = to_f64((candle.high - body_high) / range);
        let rsi = ctx.indicators.rsi;

        // Swept below the swing low and reclaimed it
        if candle.low < swing_low
            && candle.close > swing_low
            && lower_wick >= p.sweep_min_wick
            && rsi < 50.0
        {
            log::debug!(
                "[STRATEGY] {} stop hunt below {} (wick {:.2})",
                ctx.symbol,
                swing_low,
                lower_wick
            );
            return Some(
                TradeIdea::new(self.kind(), ctx.symbol, PositionSide::Long, candle.close, ctx.now)
                    .with_confidence(0.5 + 0.5 * lower_wick)
                    .with_reason(format!("sweep below {} reclaimed", swing_low)),
            );
        }

        // Swept above the swing high and rejected
        if candle.high > swing_high
            && candle.close < swing_high
            && upper_wick >= p.sweep_min_wick
            && rsi > 50.0
        {
            log::debug!(
                "[STRATEGY] {} stop hunt above {} (wick {:.2})",
                ctx.symbol,
                swing_high,
                upper_wick
            );
            return Some(
                TradeIdea::new(self.kind(), ctx.symbol, PositionSide::Short, candle.close, ctx.now)
                    .with_confidence(0.5 + 0.5 * upper_wick)
                    .with_reason(format!("sweep above {} rejected", swing_high)),
            );
        }

        None
    }
}

/// Trades the edges of an established range
#[derive(Debug, Default, Clone, Copy)]
pub struct RangeBounce;

impl Strategy for RangeBounce {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RangeBounce
    }

    fn on_candle(&mut self, candle: &Candle, ctx: &StrategyContext<'_>) -> Option<TradeIdea> {
        if !matches!(ctx.regime.regime, MarketRegime::Ranging | MarketRegime::Quiet) {
            return None;
        }
        let p = ctx.params;
        if ctx.candles.len() < 5 {
            return None;
        }
        let (support, resistance) = crate::candles::support_resistance(ctx.candles, p.range_lookback)?;
        let width = resistance - support;
        if width <= Decimal::ZERO {
            return None;
        }

        let position = to_f64((candle.close - support) / width);
        let rsi = ctx.indicators.rsi;

        if position <= p.range_edge_band && rsi <= p.rsi_oversold {
            let conviction = 1.0 - position / p.range_edge_band.max(f64::EPSILON);
            return Some(
                TradeIdea::new(self.kind(), ctx.symbol, PositionSide::Long, candle.close, ctx.now)
                    .with_confidence(0.5 + 0.4 * conviction.clamp(0.0, 1.0))
                    .with_reason(format!("near support {} rsi {:.1}", support, rsi)),
            );
        }

        if position >= 1.0 - p.range_edge_band && rsi >= p.rsi_overbought {
            let conviction = (position - (1.0 - p.range_edge_band)) / p.range_edge_band.max(f64::EPSILON);
            return Some(
                TradeIdea::new(self.kind(), ctx.symbol, PositionSide::Short, candle.close, ctx.now)
                    .with_confidence(0.5 + 0.4 * conviction.clamp(0.0, 1.0))
                    .with_reason(format!("near resistance {} rsi {:.1}", resistance, rsi)),
            );
        }

        None
    }
}
