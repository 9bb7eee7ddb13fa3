use aegis_core::{Candle, IndicatorSnapshot};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::{Adx, Atr, BollingerWidth, Rsi, Sma};

/// Lookback periods for the cached indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorPeriods {
    pub rsi: usize,
    pub atr: usize,
    pub adx: usize,
    pub fast_ma: usize,
    pub slow_ma: usize,
    pub bollinger: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            rsi: 14,
            atr: 14,
            adx: 14,
            fast_ma: 9,
            slow_ma: 21,
            bollinger: 20,
        }
    }
}

/// Per-symbol indicator state, updated once per sealed candle
#[derive(Debug, Clone)]
pub struct IndicatorCache {
    rsi: Rsi,
    atr: Atr,
    adx: Adx,
    fast: Sma,
    slow: Sma,
    bollinger: BollingerWidth,
    snapshot: IndicatorSnapshot,
}

impl IndicatorCache {
    pub fn new(periods: IndicatorPeriods) -> Self {
        Self {
            rsi: Rsi::new(periods.rsi),
            atr: Atr::new(periods.atr),
            adx: Adx::new(periods.adx),
            fast: Sma::new(periods.fast_ma),
            slow: Sma::new(periods.slow_ma),
            bollinger: BollingerWidth::new(periods.bollinger),
            snapshot: IndicatorSnapshot::default(),
        }
    }

    /// Absorb a sealed candle and return the refreshed snapshot
    pub fn update(&mut self, candle: &Candle) -> IndicatorSnapshot {
        let (Some(high), Some(low), Some(close)) = (
            candle.high.to_f64(),
            candle.low.to_f64(),
            candle.close.to_f64(),
        ) else {
            log::warn!("[INDICATORS] Unrepresentable candle at {} ignored", candle.open_time);
            return self.snapshot;
        };
        if !(high.is_finite() && low.is_finite() && close.is_finite()) {
            return self.snapshot;
        }

        self.rsi.update(close);
        self.atr.update(high, low, close);
        self.adx.update(high, low, close);
        self.fast.update(close);
        self.slow.update(close);
        self.bollinger.update(close);

        self.snapshot = IndicatorSnapshot {
            rsi: self.rsi.value(),
            fast_ma: self.fast.value(),
            slow_ma: self.slow.value(),
            bb_width: self.bollinger.value(),
            atr: self.atr.value(),
            adx: self.adx.value(),
            close,
            samples: self.snapshot.samples + 1,
        };
        self.snapshot
    }

    /// Copy of the latest snapshot
    pub fn snapshot(&self) -> IndicatorSnapshot {
        self.snapshot
    }
}

impl Default for IndicatorCache {
    fn default() -> Self {
        Self::new(IndicatorPeriods::default())
    }
}
