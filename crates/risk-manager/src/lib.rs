//! Aegis Risk Manager
//!
//! Risk control for the decision loop, at two scopes:
//!
//! - **Per asset** ([`AssetRiskManager`]): equity, day PnL and the single open
//!   position of one symbol; position sizing, trailing stops, exit rules
//! - **Adaptive** ([`AdaptiveThresholds`]): required reward/risk and size
//!   multipliers conditioned on strategy, regime, recent win rate and session
//! - **Portfolio** ([`PortfolioRiskAggregator`]): consolidated equity and
//!   weighted exposure across assets; the admission gate for new entries
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Asset task (per symbol)                │
//! │                                                              │
//! │  Fill ──────► AssetRiskManager ──► position / stops / exits  │
//! │                     │                                        │
//! │  Idea ──► AdaptiveThresholds ──► required RR, size multiplier│
//! │                     │                                        │
//! └─────────────────────┼────────────────────────────────────────┘
//!                       │ AssetExposure
//!                       ▼
//!            PortfolioRiskAggregator ──► can_trade()
//! ```
//!
//! A portfolio breach blocks new entries; it never force-closes positions.

pub mod adaptive;
pub mod error;
pub mod manager;
pub mod parameters;
pub mod portfolio;

// Re-export main types
pub use adaptive::{AdaptiveConfig, AdaptiveThresholds};
pub use error::{Result, RiskError};
pub use manager::{AssetRiskManager, ExitCheck, RiskState, SizeDecision, SizeMultipliers};
pub use parameters::{AssetClassParams, AssetClassTable, PortfolioLimits, RiskConfig};
pub use portfolio::{
    AlertKind, AssetExposure, PortfolioRiskAggregator, PortfolioSnapshot, RiskAlert, RiskLevel,
};
