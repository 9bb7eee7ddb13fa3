//! Trading Engine - one task per asset
//!
//! Spawns an [`AssetAgent`] per configured symbol, routes ticks to them
//! over bounded channels and collects their reports on shutdown. Agents
//! share only the services in [`Services`]; the portfolio aggregator is the
//! single place where their risk meets.

use crate::agent::{AgentReport, AssetAgent};
use crate::bootstrap::Services;
use crate::config::{ConfigError, EngineConfig};
use crate::event_feed::{Tick, TickFeed};
use aegis_clock::ManualClock;
use aegis_core::Symbol;
use aegis_risk_manager::{PortfolioRiskAggregator, PortfolioSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Final state of a run
#[derive(Debug, Clone)]
pub struct EngineReport {
    pub assets: Vec<AgentReport>,
    pub portfolio: PortfolioSnapshot,
}

impl EngineReport {
    pub fn asset(&self, symbol: &str) -> Option<&AgentReport> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }
}

pub struct TradingEngine {
    senders: HashMap<Symbol, mpsc::Sender<Tick>>,
    handles: Vec<(Symbol, JoinHandle<AgentReport>)>,
    portfolio: Arc<PortfolioRiskAggregator>,
}

impl TradingEngine {
    /// Spawn one agent task per configured asset
    pub fn start(config: &EngineConfig, services: Services) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut senders = HashMap::new();
        let mut handles = Vec::new();

        for asset in &config.assets {
            let agent = AssetAgent::new(asset, config, services.clone());
            let (tx, rx) = mpsc::channel(config.tick_channel_capacity);
            handles.push((asset.symbol.clone(), tokio::spawn(agent.run(rx))));
            senders.insert(asset.symbol.clone(), tx);
        }
        log::info!("[AGENT] engine started with {} asset(s)", handles.len());

        Ok(Self {
            senders,
            handles,
            portfolio: services.portfolio,
        })
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.handles.iter().map(|(s, _)| s.as_str()).collect()
    }

    pub fn portfolio(&self) -> &Arc<PortfolioRiskAggregator> {
        &self.portfolio
    }

    /// Deliver a tick to its agent. False when the symbol is unknown or
    /// the agent has stopped.
    pub async fn route(&self, tick: Tick) -> bool {
        let Some(tx) = self.senders.get(&tick.symbol) else {
            log::warn!("[ANOMALY] tick for unconfigured symbol {}", tick.symbol);
            return false;
        };
        tx.send(tick).await.is_ok()
    }

    /// Route `steps` rounds of ticks from the feed; returns ticks delivered
    pub async fn run_feed(&self, feed: &mut TickFeed, steps: usize) -> usize {
        let mut delivered = 0;
        for _ in 0..steps {
            for tick in feed.next_ticks() {
                if self.route(tick).await {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Like [`run_feed`](Self::run_feed), moving `clock` to each round's
    /// feed time first so agents see simulated time
    pub async fn replay(&self, feed: &mut TickFeed, steps: usize, clock: &ManualClock) -> usize {
        let mut delivered = 0;
        for _ in 0..steps {
            let ticks = feed.next_ticks();
            clock.set(feed.now());
            for tick in ticks {
                if self.route(tick).await {
                    delivered += 1;
                }
            }
            tokio::task::yield_now().await;
        }
        delivered
    }

    /// Close every channel, wait for the agents to drain and report
    pub async fn shutdown(self) -> EngineReport {
        drop(self.senders);
        let mut assets = Vec::with_capacity(self.handles.len());
        for (symbol, handle) in self.handles {
            match handle.await {
                Ok(report) => assets.push(report),
                Err(e) => log::error!("[AGENT] {} task failed: {}", symbol, e),
            }
        }
        let portfolio = self.portfolio.recalc().await;
        log::info!(
            "[PORTFOLIO] final equity {} day pnl {} ({} open position(s))",
            portfolio.total_equity,
            portfolio.total_day_pnl,
            portfolio.position_count
        );
        EngineReport { assets, portfolio }
    }
}
