use serde::{Deserialize, Serialize};

/// Coarse classification of current market conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    Trending,
    Ranging,
    Volatile,
    Quiet,
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketRegime::Trending => write!(f, "TRENDING"),
            MarketRegime::Ranging => write!(f, "RANGING"),
            MarketRegime::Volatile => write!(f, "VOLATILE"),
            MarketRegime::Quiet => write!(f, "QUIET"),
        }
    }
}

/// Regime classification plus the normalized metrics behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeAnalysis {
    pub regime: MarketRegime,
    /// 0.0 - 1.0
    pub confidence: f64,
    /// ADX / 50, clamped to 0..1
    pub trend_strength: f64,
    /// ATR / close
    pub volatility: f64,
    /// |RSI - 50| / 50
    pub momentum: f64,
}

impl Default for RegimeAnalysis {
    /// Low-confidence ranging, used before the first classification
    fn default() -> Self {
        Self {
            regime: MarketRegime::Ranging,
            confidence: 0.0,
            trend_strength: 0.0,
            volatility: 0.0,
            momentum: 0.0,
        }
    }
}
