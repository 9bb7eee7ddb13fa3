//! Incremental technical indicators
//!
//! Every indicator consumes one sealed candle at a time in O(1) and exposes
//! `value()`. Non-finite inputs leave the state unchanged.

mod adx;
mod atr;
mod bollinger;
mod cache;
mod rsi;
mod sma;

pub use adx::Adx;
pub use atr::Atr;
pub use bollinger::BollingerWidth;
pub use cache::{IndicatorCache, IndicatorPeriods};
pub use rsi::Rsi;
pub use sma::Sma;

/// Wilder moving average (alpha = 1/period)
///
/// Seeded with the simple mean of the first `period` samples, then
/// `avg = (avg * (period - 1) + x) / period`.
#[derive(Debug, Clone)]
pub(crate) struct WilderAverage {
    period: usize,
    count: usize,
    seed_sum: f64,
    value: f64,
}

impl WilderAverage {
    pub(crate) fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            count: 0,
            seed_sum: 0.0,
            value: 0.0,
        }
    }

    pub(crate) fn update(&mut self, x: f64) {
        if self.count < self.period {
            self.count += 1;
            self.seed_sum += x;
            self.value = self.seed_sum / self.count as f64;
        } else {
            let p = self.period as f64;
            self.value = (self.value * (p - 1.0) + x) / p;
        }
    }

    /// True once `period` samples have been absorbed
    pub(crate) fn is_warm(&self) -> bool {
        self.count >= self.period
    }

    pub(crate) fn has_data(&self) -> bool {
        self.count > 0
    }

    pub(crate) fn value(&self) -> f64 {
        self.value
    }
}

pub(crate) fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    match prev_close {
        Some(pc) => (high - low).max((high - pc).abs()).max((low - pc).abs()),
        None => high - low,
    }
}
