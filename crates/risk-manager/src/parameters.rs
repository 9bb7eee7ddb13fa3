//! Risk Parameters
//!
//! Typed configuration for per-asset sizing, trailing stops and the
//! portfolio-wide limits. Every struct deserializes with defaults for
//! missing fields.

use aegis_core::AssetClass;
use serde::{Deserialize, Serialize};

/// Parameters that differ by asset class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetClassParams {
    /// Scales the base risk fraction
    pub risk_multiplier: f64,
    /// Minimum holding time before discretionary exits
    pub min_hold_minutes: i64,
    /// Unrealized gain (fraction of entry) before the stop starts trailing
    pub trailing_activation_pct: f64,
    /// Trailing distance in ATRs
    pub trailing_atr_multiple: f64,
    /// Weight applied to open risk in the portfolio aggregate
    pub exposure_weight: f64,
}

impl AssetClassParams {
    pub fn crypto() -> Self {
        Self {
            risk_multiplier: 0.8,
            min_hold_minutes: 15,
            trailing_activation_pct: 0.015,
            trailing_atr_multiple: 1.0,
            exposure_weight: 1.2,
        }
    }

    pub fn equity() -> Self {
        Self {
            risk_multiplier: 1.0,
            min_hold_minutes: 30,
            trailing_activation_pct: 0.010,
            trailing_atr_multiple: 1.0,
            exposure_weight: 1.0,
        }
    }

    pub fn future() -> Self {
        Self {
            risk_multiplier: 0.9,
            min_hold_minutes: 10,
            trailing_activation_pct: 0.008,
            trailing_atr_multiple: 1.0,
            exposure_weight: 1.1,
        }
    }
}

/// One parameter set per asset class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetClassTable {
    pub crypto: AssetClassParams,
    pub equity: AssetClassParams,
    pub future: AssetClassParams,
}

impl Default for AssetClassTable {
    fn default() -> Self {
        Self {
            crypto: AssetClassParams::crypto(),
            equity: AssetClassParams::equity(),
            future: AssetClassParams::future(),
        }
    }
}

impl AssetClassTable {
    pub fn get(&self, class: AssetClass) -> &AssetClassParams {
        match class {
            AssetClass::Crypto => &self.crypto,
            AssetClass::Equity => &self.equity,
            AssetClass::Future => &self.future,
        }
    }
}

/// Sizing configuration for the per-asset risk manager
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction of equity risked per trade before multipliers
    pub base_risk_pct: f64,
    /// Open risk fraction above which new size is cut
    pub heat_threshold: f64,
    /// Volatility (ATR / price) the sizing normalizes toward
    pub target_volatility: f64,
    pub asset_classes: AssetClassTable,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_risk_pct: 0.01,
            heat_threshold: 0.05,
            target_volatility: 0.02,
            asset_classes: AssetClassTable::default(),
        }
    }
}

/// Portfolio-wide limits enforced by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioLimits {
    /// Maximum day loss as a fraction of start-of-day equity
    pub max_daily_loss_pct: f64,
    /// Maximum weighted open risk as a fraction of equity
    pub max_open_risk_pct: f64,
    /// Fraction of a limit that raises the level to Warning
    pub warning_ratio: f64,
    /// Fraction of a limit that raises the level to Danger
    pub danger_ratio: f64,
    /// Equity drop that raises a rapid-loss alert
    pub rapid_loss_pct: f64,
    pub rapid_loss_window_minutes: i64,
    /// Open positions above which a concentration alert is raised
    pub max_concurrent_positions: usize,
    /// Snapshots retained in memory
    pub history_len: usize,
    /// Unchanged snapshots are still sampled this often
    pub sample_interval_secs: i64,
}

impl Default for PortfolioLimits {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: 0.03,
            max_open_risk_pct: 0.10,
            warning_ratio: 0.75,
            danger_ratio: 0.90,
            rapid_loss_pct: 0.02,
            rapid_loss_window_minutes: 15,
            max_concurrent_positions: 8,
            history_len: 120,
            sample_interval_secs: 60,
        }
    }
}
