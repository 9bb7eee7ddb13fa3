use serde::{Deserialize, Serialize};

/// Closed set of strategy families the decision loop knows about
///
/// The declaration order is the priority order in which strategies are
/// consulted on each candle close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Fade a liquidity sweep beyond a recent extreme
    StopHuntReversal,
    /// Ride an established directional move
    TrendFollow,
    /// Buy support / sell resistance inside a range
    RangeBounce,
    /// Short-horizon momentum bursts
    MomentumScalp,
}

impl StrategyKind {
    /// All kinds in priority order
    pub const PRIORITY: [StrategyKind; 4] = [
        StrategyKind::StopHuntReversal,
        StrategyKind::TrendFollow,
        StrategyKind::RangeBounce,
        StrategyKind::MomentumScalp,
    ];

    /// Strategies that profit from continuation rather than reversal
    pub fn is_trend_aligned(&self) -> bool {
        matches!(self, StrategyKind::TrendFollow | StrategyKind::MomentumScalp)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::StopHuntReversal => "stop_hunt_reversal",
            StrategyKind::TrendFollow => "trend_follow",
            StrategyKind::RangeBounce => "range_bounce",
            StrategyKind::MomentumScalp => "momentum_scalp",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
