//! Aegis Runner - per-asset decision agents and the multi-asset engine
//!
//! - **Config**: one typed tree for every tunable
//! - **Bootstrap**: wires adapters into shared services
//! - **Agent**: the per-symbol decision loop
//! - **Engine**: one task per symbol, tick routing, shutdown reports
//! - **Event Feed**: synthetic tick source for paper runs
//!
//! ## Architecture
//!
//! ```text
//!                      ┌─────────────────┐
//!                      │   Tick Feed     │
//!                      └────────┬────────┘
//!                               │ ticks (routed by symbol)
//!              ┌────────────────┼────────────────┐
//!              ▼                ▼                ▼
//!      ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//!      │ Asset Agent  │ │ Asset Agent  │ │ Asset Agent  │
//!      │  (BTC-USD)   │ │  (ETH-USD)   │ │     ...      │
//!      └──────┬───────┘ └──────┬───────┘ └──────┬───────┘
//!             │ exposure       │                │
//!             └────────────────┼────────────────┘
//!                              ▼
//!                 ┌─────────────────────────┐
//!                 │ Portfolio Risk          │◄── admission
//!                 └─────────────────────────┘     │
//!                                                 │
//!      ideas ──► gate ──► stops ──► sizing ──► Execution Pipeline ──► backend
//!                                                 │
//!                                                 ▼
//!                                        Settlement ──► repository
//! ```

pub mod agent;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod event_feed;

pub use agent::{AgentError, AgentReport, AssetAgent, Decision, RejectReason, regime_opposes};
pub use bootstrap::{PaperStack, Services, build_agents};
pub use config::{AssetConfig, ConfigError, EngineConfig, RunMode, StrategyToggles};
pub use engine::{EngineReport, TradingEngine};
pub use event_feed::{Tick, TickFeed, TickFeedConfig};

/// Initialise `env_logger` with `info` as the default filter
///
/// `RUST_LOG` still wins. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
