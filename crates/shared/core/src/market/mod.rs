//! Market-derived values: candles, indicator snapshots and regimes

mod candle;
mod indicators;
mod regime;

pub use candle::Candle;
pub use indicators::IndicatorSnapshot;
pub use regime::{MarketRegime, RegimeAnalysis};
