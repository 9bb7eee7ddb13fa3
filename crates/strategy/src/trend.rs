//! Continuation strategies

use aegis_core::{Candle, MarketRegime, PositionSide, StrategyKind, TradeIdea};
use rust_decimal::prelude::ToPrimitive;

use crate::strategy::{Strategy, StrategyContext};

/// Joins established trends when MAs, ADX and RSI line up
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendFollow;

impl Strategy for TrendFollow {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TrendFollow
    }

    fn on_candle(&mut self, candle: &Candle, ctx: &StrategyContext<'_>) -> Option<TradeIdea> {
        if ctx.regime.regime != MarketRegime::Trending {
            return None;
        }
        let p = ctx.params;
        let ind = ctx.indicators;
        if ind.adx < p.trend_min_adx {
            return None;
        }
        let delta = ind.ma_delta();
        let confidence = 0.4 + 0.6 * ctx.regime.confidence * ctx.regime.trend_strength;

        // Avoid chasing stretched moves: RSI must not be at the extreme.
        let side = if delta >= p.trend_min_ma_delta && ind.rsi > 50.0 && ind.rsi < 80.0 {
            PositionSide::Long
        } else if delta <= -p.trend_min_ma_delta && ind.rsi < 50.0 && ind.rsi > 20.0 {
            PositionSide::Short
        } else {
            return None;
        };

        Some(
            TradeIdea::new(self.kind(), ctx.symbol, side, candle.close, ctx.now)
                .with_confidence(confidence)
                .with_reason(format!("ma delta {:.4} adx {:.1}", delta, ind.adx)),
        )
    }
}

/// Rides large-bodied breakout candles
#[derive(Debug, Default, Clone, Copy)]
pub struct MomentumScalp;

impl Strategy for MomentumScalp {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MomentumScalp
    }

    fn on_candle(&mut self, candle: &Candle, ctx: &StrategyContext<'_>) -> Option<TradeIdea> {
        if ctx.regime.regime == MarketRegime::Quiet {
            return None;
        }
        let atr = ctx.indicators.atr;
        if atr <= 0.0 {
            return None;
        }
        let prev = ctx.prior(1).next()?;
        let body = (candle.close - candle.open).to_f64().unwrap_or(0.0);
        let body_atr = body.abs() / atr;
        if body_atr < ctx.params.momentum_body_atr {
            return None;
        }

        let rsi = ctx.indicators.rsi;
        let side = if body > 0.0 && candle.close > prev.high && rsi >= 55.0 && rsi <= 80.0 {
            PositionSide::Long
        } else if body < 0.0 && candle.close < prev.low && rsi <= 45.0 && rsi >= 20.0 {
            PositionSide::Short
        } else {
            return None;
        };

        Some(
            TradeIdea::new(self.kind(), ctx.symbol, side, candle.close, ctx.now)
                .with_confidence((0.4 + 0.2 * body_atr).min(0.9))
                .with_reason(format!("breakout body {:.2} ATR", body_atr)),
        )
    }
}
