//! Aegis Strategy Layer
//!
//! Everything between the raw tick stream and a trade idea:
//! - Candle aggregation with a bounded per-symbol window
//! - Incremental indicators (RSI, ATR, ADX, SMA, Bollinger width)
//! - Market regime classification
//! - Strategy trait and the reference strategies
//!
//! ## Architecture
//!
//! ```text
//! ticks ──► CandleAggregator ──► sealed Candle
//!                                     │
//!                                     ▼
//!                              IndicatorCache ──► IndicatorSnapshot
//!                                                      │
//!                                     ┌────────────────┤
//!                                     ▼                ▼
//!                              RegimeDetector     StrategyContext
//!                                     │                │
//!                                     └──► Strategy ◄──┘
//!                                             │
//!                                             ▼
//!                                      Option<TradeIdea>
//! ```

pub mod candles;
pub mod indicators;
pub mod mean_reversion;
pub mod regime;
pub mod strategy;
pub mod trend;

// Re-export main types
pub use candles::{CandleAggregator, DEFAULT_WINDOW_CAP};
pub use indicators::{IndicatorCache, IndicatorPeriods};
pub use mean_reversion::{RangeBounce, StopHuntReversal};
pub use regime::{RegimeDetector, RegimeThresholds};
pub use strategy::{Strategy, StrategyContext, StrategyParams, build_strategies, strategy_for};
pub use trend::{MomentumScalp, TrendFollow};
