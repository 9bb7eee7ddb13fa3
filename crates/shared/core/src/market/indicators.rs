use serde::{Deserialize, Serialize};

/// Point-in-time copy of a symbol's indicators
///
/// Values are `f64`; defaults stand in while an indicator is warming up
/// (RSI 50, ADX 25, everything else 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub fast_ma: f64,
    pub slow_ma: f64,
    /// Bollinger band width as a fraction of the middle band
    pub bb_width: f64,
    pub atr: f64,
    pub adx: f64,
    /// Last close fed to the cache
    pub close: f64,
    /// Number of candles consumed
    pub samples: usize,
}

impl Default for IndicatorSnapshot {
    fn default() -> Self {
        Self {
            rsi: 50.0,
            fast_ma: 0.0,
            slow_ma: 0.0,
            bb_width: 0.0,
            atr: 0.0,
            adx: 25.0,
            close: 0.0,
            samples: 0,
        }
    }
}

impl IndicatorSnapshot {
    /// `(fast - slow) / slow`, 0 when the slow average is not available
    pub fn ma_delta(&self) -> f64 {
        if self.slow_ma > 0.0 {
            (self.fast_ma - self.slow_ma) / self.slow_ma
        } else {
            0.0
        }
    }

    /// ATR as a fraction of the close, 0 when unknown
    pub fn atr_pct(&self) -> f64 {
        if self.close > 0.0 {
            self.atr / self.close
        } else {
            0.0
        }
    }
}
