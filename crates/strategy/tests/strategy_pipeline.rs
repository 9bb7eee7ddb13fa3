//! Integration test: ticks through candles, indicators, regime and strategies

use aegis_core::{
    Candle, IndicatorSnapshot, MarketRegime, PositionSide, RegimeAnalysis, StrategyKind,
};
use aegis_strategy::{
    CandleAggregator, IndicatorCache, IndicatorPeriods, MomentumScalp, RangeBounce,
    RegimeDetector, StopHuntReversal, Strategy, StrategyContext, StrategyParams, TrendFollow,
    build_strategies,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
}

fn candle(i: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
    Candle {
        open_time: start() + Duration::minutes(i),
        open,
        high,
        low,
        close,
    }
}

fn regime(regime: MarketRegime) -> RegimeAnalysis {
    RegimeAnalysis {
        regime,
        confidence: 0.8,
        trend_strength: 0.7,
        volatility: 0.01,
        momentum: 0.3,
    }
}

/// Flat range between 99 and 101
fn ranging_history(n: i64) -> VecDeque<Candle> {
    (0..n)
        .map(|i| {
            let (o, c) = if i % 2 == 0 {
                (dec!(99.6), dec!(100.4))
            } else {
                (dec!(100.4), dec!(99.6))
            };
            candle(i, o, dec!(101), dec!(99), c)
        })
        .collect()
}

#[test]
fn test_trend_follow_fires_long_in_stepped_uptrend() {
    let _ = env_logger::try_init();

    let mut agg = CandleAggregator::new(Duration::minutes(1), 500);
    let mut cache = IndicatorCache::new(IndicatorPeriods::default());
    let detector = RegimeDetector::default();
    let params = StrategyParams::default();
    let mut strategy = TrendFollow;

    let mut price = dec!(100);
    let mut ideas = Vec::new();
    let mut regimes = Vec::new();

    for i in 0..90 {
        let open = price;
        let close = if i % 2 == 0 { open + dec!(1) } else { open - dec!(0.5) };
        let t0 = start() + Duration::minutes(i);
        agg.on_tick(open, t0);
        if let Some(sealed) = agg.on_tick(close, t0 + Duration::seconds(59)) {
            panic!("same-minute tick sealed a candle: {:?}", sealed);
        }
        price = close;

        // The first tick of the next minute seals this one.
        if let Some(sealed) = agg.on_tick(close, t0 + Duration::minutes(1)) {
            let ind = cache.update(&sealed);
            let reg = detector.analyze(&ind);
            regimes.push(reg.regime);
            let ctx = StrategyContext {
                symbol: "BTC-USD",
                indicators: &ind,
                regime: &reg,
                candles: agg.history(),
                params: &params,
                now: sealed.open_time,
            };
            if let Some(idea) = strategy.on_candle(&sealed, &ctx) {
                ideas.push(idea);
            }
        }
    }

    assert!(regimes.iter().rev().take(20).all(|r| *r == MarketRegime::Trending));
    assert!(!ideas.is_empty(), "trend follow never fired");
    assert!(ideas.iter().all(|i| i.side == PositionSide::Long));
    assert!(ideas.iter().all(|i| i.strategy == StrategyKind::TrendFollow));
}

#[test]
fn test_stop_hunt_long_on_reclaimed_sweep() {
    let mut candles = ranging_history(25);
    // Sweep to 97, close back at 100.5 near the high: long lower wick
    let sweep = candle(25, dec!(100.2), dec!(100.6), dec!(97), dec!(100.5));
    candles.push_back(sweep);

    let ind = IndicatorSnapshot {
        rsi: 42.0,
        ..Default::default()
    };
    let reg = regime(MarketRegime::Ranging);
    let params = StrategyParams::default();
    let ctx = StrategyContext {
        symbol: "ETH-USD",
        indicators: &ind,
        regime: &reg,
        candles: &candles,
        params: &params,
        now: sweep.open_time,
    };

    let idea = StopHuntReversal.on_candle(&sweep, &ctx).expect("sweep should trigger");
    assert_eq!(idea.side, PositionSide::Long);
    assert_eq!(idea.entry_price, dec!(100.5));
    assert!(idea.confidence > 0.5);
}

#[test]
fn test_stop_hunt_ignores_sweep_without_reclaim() {
    let mut candles = ranging_history(25);
    let breakdown = candle(25, dec!(99.5), dec!(99.6), dec!(96), dec!(96.2));
    candles.push_back(breakdown);

    let ind = IndicatorSnapshot {
        rsi: 30.0,
        ..Default::default()
    };
    let reg = regime(MarketRegime::Volatile);
    let params = StrategyParams::default();
    let ctx = StrategyContext {
        symbol: "ETH-USD",
        indicators: &ind,
        regime: &reg,
        candles: &candles,
        params: &params,
        now: breakdown.open_time,
    };

    assert!(StopHuntReversal.on_candle(&breakdown, &ctx).is_none());
}

#[test]
fn test_range_bounce_sells_resistance_only_when_ranging() {
    let mut candles = ranging_history(30);
    let top = candle(30, dec!(100.4), dec!(101), dec!(100.3), dec!(100.9));
    candles.push_back(top);

    let ind = IndicatorSnapshot {
        rsi: 70.0,
        ..Default::default()
    };
    let params = StrategyParams::default();

    let ranging = regime(MarketRegime::Ranging);
    let ctx = StrategyContext {
        symbol: "AAPL",
        indicators: &ind,
        regime: &ranging,
        candles: &candles,
        params: &params,
        now: top.open_time,
    };
    let idea = RangeBounce.on_candle(&top, &ctx).expect("edge of range");
    assert_eq!(idea.side, PositionSide::Short);

    let trending = regime(MarketRegime::Trending);
    let ctx = StrategyContext {
        regime: &trending,
        ..ctx
    };
    assert!(RangeBounce.on_candle(&top, &ctx).is_none());
}

#[test]
fn test_momentum_scalp_needs_large_body_breakout() {
    let mut candles = ranging_history(10);
    let burst = candle(10, dec!(100), dec!(103.2), dec!(99.9), dec!(103));
    candles.push_back(burst);

    let ind = IndicatorSnapshot {
        rsi: 62.0,
        atr: 2.0,
        close: 103.0,
        ..Default::default()
    };
    let reg = regime(MarketRegime::Volatile);
    let params = StrategyParams::default();
    let ctx = StrategyContext {
        symbol: "ES",
        indicators: &ind,
        regime: &reg,
        candles: &candles,
        params: &params,
        now: burst.open_time,
    };
    let idea = MomentumScalp.on_candle(&burst, &ctx).expect("burst");
    assert_eq!(idea.side, PositionSide::Long);

    let small = candle(10, dec!(100), dec!(101.2), dec!(99.9), dec!(101.1));
    assert!(MomentumScalp.on_candle(&small, &ctx).is_none());
}

#[test]
fn test_enabled_strategies_consulted_in_priority_order() {
    let strategies = build_strategies(&StrategyKind::PRIORITY);
    let names: Vec<_> = strategies.iter().map(|s| s.name().to_string()).collect();
    assert_eq!(
        names,
        vec![
            "stop_hunt_reversal",
            "trend_follow",
            "range_bounce",
            "momentum_scalp"
        ]
    );
}
