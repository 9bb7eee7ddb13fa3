//! Engine configuration
//!
//! One typed tree, loaded from JSON. Every section has defaults so a config
//! file only needs to name what it changes; `validate()` runs after loading.

use aegis_core::{AssetClass, StrategyKind, Symbol};
use aegis_gateway::{LogisticModel, PaperVenueConfig};
use aegis_order_manager::{ExecutionConfig, FrequencyConfig, FrequencyLimits, StopPlannerConfig};
use aegis_risk_manager::{AdaptiveConfig, PortfolioLimits, RiskConfig};
use aegis_strategy::{IndicatorPeriods, RegimeThresholds, StrategyParams};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Adapter setup failed: {0}")]
    Gateway(#[from] aegis_gateway::GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Live,
    Backtest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub symbol: Symbol,
    pub asset_class: AssetClass,
    pub min_lot: Decimal,
    pub starting_equity: Decimal,
}

impl AssetConfig {
    pub fn new(symbol: impl Into<Symbol>, asset_class: AssetClass, min_lot: Decimal, equity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            asset_class,
            min_lot,
            starting_equity: equity,
        }
    }
}

/// Which strategies may produce ideas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyToggles {
    pub stop_hunt_reversal: bool,
    pub trend_follow: bool,
    pub range_bounce: bool,
    pub momentum_scalp: bool,
}

impl Default for StrategyToggles {
    fn default() -> Self {
        Self {
            stop_hunt_reversal: true,
            trend_follow: true,
            range_bounce: true,
            momentum_scalp: true,
        }
    }
}

impl StrategyToggles {
    /// Enabled strategies in priority order
    pub fn enabled(&self) -> Vec<StrategyKind> {
        StrategyKind::PRIORITY
            .into_iter()
            .filter(|k| match k {
                StrategyKind::StopHuntReversal => self.stop_hunt_reversal,
                StrategyKind::TrendFollow => self.trend_follow,
                StrategyKind::RangeBounce => self.range_bounce,
                StrategyKind::MomentumScalp => self.momentum_scalp,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: RunMode,
    pub assets: Vec<AssetConfig>,

    // Risk
    pub risk: RiskConfig,
    pub portfolio: PortfolioLimits,
    pub adaptive: AdaptiveConfig,

    // Signal
    pub candle_interval_secs: i64,
    pub candle_window: usize,
    pub indicators: IndicatorPeriods,
    pub regime: RegimeThresholds,
    /// Candle closes between regime refreshes
    pub regime_refresh_candles: u32,
    pub strategies: StrategyToggles,
    pub strategy_params: StrategyParams,
    /// Minimum scoring-gate probability to take an idea
    pub gate_threshold: f64,
    /// Logistic model for the scoring gate; constant gate when absent
    pub gate_model: Option<LogisticModel>,

    // Orders
    pub stops: StopPlannerConfig,
    /// Candles scanned for support/resistance stops
    pub stop_lookback: usize,
    pub frequency: FrequencyConfig,
    pub execution: ExecutionConfig,
    pub paper_venue: PaperVenueConfig,

    // Position management
    pub max_holding_minutes: i64,
    /// Regime confidence needed to exit on a regime shift
    pub regime_exit_confidence: f64,

    // Runtime
    pub error_backoff_ms: u64,
    pub tick_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Live,
            assets: vec![
                AssetConfig::new("BTC-USD", AssetClass::Crypto, dec!(0.0001), dec!(10000)),
                AssetConfig::new("ETH-USD", AssetClass::Crypto, dec!(0.001), dec!(10000)),
            ],
            risk: RiskConfig::default(),
            portfolio: PortfolioLimits::default(),
            adaptive: AdaptiveConfig::default(),
            candle_interval_secs: 60,
            candle_window: aegis_strategy::DEFAULT_WINDOW_CAP,
            indicators: IndicatorPeriods::default(),
            regime: RegimeThresholds::default(),
            regime_refresh_candles: 5,
            strategies: StrategyToggles::default(),
            strategy_params: StrategyParams::default(),
            gate_threshold: 0.55,
            gate_model: None,
            stops: StopPlannerConfig::default(),
            stop_lookback: 20,
            frequency: FrequencyConfig::default(),
            execution: ExecutionConfig::default(),
            paper_venue: PaperVenueConfig::default(),
            max_holding_minutes: 240,
            regime_exit_confidence: 0.7,
            error_backoff_ms: 1_000,
            tick_channel_capacity: 1_024,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.assets.is_empty() {
            return invalid("no assets configured".to_string());
        }
        let mut seen = HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.symbol.as_str()) {
                return invalid(format!("duplicate asset {}", asset.symbol));
            }
            if asset.min_lot <= Decimal::ZERO {
                return invalid(format!("{}: min_lot must be positive", asset.symbol));
            }
            if asset.starting_equity <= Decimal::ZERO {
                return invalid(format!("{}: starting_equity must be positive", asset.symbol));
            }
        }
        if !(self.risk.base_risk_pct > 0.0 && self.risk.base_risk_pct <= 0.1) {
            return invalid(format!("base_risk_pct {} outside (0, 0.1]", self.risk.base_risk_pct));
        }
        if self.portfolio.max_daily_loss_pct <= 0.0 || self.portfolio.max_open_risk_pct <= 0.0 {
            return invalid("portfolio limits must be positive".to_string());
        }
        let adaptive = &self.adaptive;
        if !(adaptive.min_rr.is_finite() && adaptive.max_rr.is_finite())
            || adaptive.min_rr > adaptive.max_rr
        {
            return invalid(format!(
                "adaptive rr band [{}, {}] is inverted or not finite",
                adaptive.min_rr, adaptive.max_rr
            ));
        }
        if !(adaptive.min_size_multiplier.is_finite() && adaptive.max_size_multiplier.is_finite())
            || adaptive.min_size_multiplier > adaptive.max_size_multiplier
            || adaptive.min_size_multiplier < 0.0
        {
            return invalid(format!(
                "adaptive size multiplier band [{}, {}] is inverted or not finite",
                adaptive.min_size_multiplier, adaptive.max_size_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.gate_threshold) {
            return invalid(format!("gate_threshold {} outside [0, 1]", self.gate_threshold));
        }
        if !(0.0..=1.0).contains(&self.regime_exit_confidence) {
            return invalid(format!(
                "regime_exit_confidence {} outside [0, 1]",
                self.regime_exit_confidence
            ));
        }
        if self.candle_interval_secs <= 0 {
            return invalid("candle_interval_secs must be positive".to_string());
        }
        if self.regime_refresh_candles == 0 {
            return invalid("regime_refresh_candles must be at least 1".to_string());
        }
        if self.execution.max_attempts == 0 {
            return invalid("execution.max_attempts must be at least 1".to_string());
        }
        if self.tick_channel_capacity == 0 {
            return invalid("tick_channel_capacity must be positive".to_string());
        }
        if self.strategies.enabled().is_empty() {
            return invalid("no strategies enabled".to_string());
        }
        if let Some(model) = &self.gate_model {
            model.validate()?;
        }
        Ok(())
    }

    pub fn candle_interval(&self) -> Duration {
        Duration::seconds(self.candle_interval_secs)
    }

    /// Frequency limits for the configured run mode
    pub fn frequency_limits(&self) -> FrequencyLimits {
        self.frequency.limits(self.mode == RunMode::Backtest)
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetConfig> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{
                "mode": "backtest",
                "assets": [
                    {"symbol": "AAPL", "asset_class": "equity", "min_lot": "1", "starting_equity": "25000"}
                ],
                "gate_threshold": 0.6,
                "strategies": {"momentum_scalp": false},
                "frequency": {"backtest": {"cooldown_minutes": 1, "max_trades_per_hour": 30}}
            }"#,
        )
        .unwrap();

        assert_eq!(config.mode, RunMode::Backtest);
        assert_eq!(config.assets[0].asset_class, AssetClass::Equity);
        assert_eq!(config.assets[0].starting_equity, dec!(25000));
        assert_eq!(config.gate_threshold, 0.6);
        assert_eq!(config.frequency_limits().max_trades_per_hour, 30);
        assert_eq!(
            config.strategies.enabled(),
            vec![
                StrategyKind::StopHuntReversal,
                StrategyKind::TrendFollow,
                StrategyKind::RangeBounce
            ]
        );
        // Untouched sections
        assert_eq!(config.execution.max_attempts, 3);
        assert_eq!(config.risk.asset_classes.equity.min_hold_minutes, 30);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = EngineConfig::default();
        config.assets.push(config.assets[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig {
            gate_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            strategies: StrategyToggles {
                stop_hunt_reversal: false,
                trend_follow: false,
                range_bounce: false,
                momentum_scalp: false,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(matches!(
            EngineConfig::from_json(r#"{"adaptive": {"min_rr": 3.0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"adaptive": {"min_size_multiplier": 2.5}}"#),
            Err(ConfigError::Invalid(_))
        ));

        assert!(matches!(
            EngineConfig::from_json("{\"assets\": 3}"),
            Err(ConfigError::Parse(_))
        ));
    }
}
