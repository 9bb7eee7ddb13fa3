//! Bootstrap - wiring of adapters and shared services
//!
//! Builds what every asset agent shares:
//! - the clock
//! - the portfolio risk aggregator (also the pipeline's admission gate)
//! - the scoring gate
//! - the trade repository
//! - the execution pipeline in front of the execution backend

use crate::agent::AssetAgent;
use crate::config::{ConfigError, EngineConfig};
use aegis_gateway::{ConstantScoringGate, InMemoryRepository, LogisticScoringGate, PaperVenue};
use aegis_order_manager::ExecutionPipeline;
use aegis_ports::{Clock, ExecutionBackend, ScoringGate, TradeRepository};
use aegis_risk_manager::PortfolioRiskAggregator;
use std::sync::Arc;

/// Services shared by all asset agents
#[derive(Clone)]
pub struct Services {
    pub clock: Arc<dyn Clock>,
    pub portfolio: Arc<PortfolioRiskAggregator>,
    pub gate: Arc<dyn ScoringGate>,
    pub repo: Arc<dyn TradeRepository>,
    pub pipeline: Arc<ExecutionPipeline>,
}

impl Services {
    /// Wire custom adapters behind the engine's portfolio and pipeline
    pub fn new(
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
        backend: Arc<dyn ExecutionBackend>,
        gate: Arc<dyn ScoringGate>,
        repo: Arc<dyn TradeRepository>,
    ) -> Self {
        let portfolio = Arc::new(PortfolioRiskAggregator::new(
            config.portfolio,
            config.risk.asset_classes,
            clock.clone(),
        ));
        let pipeline = Arc::new(
            ExecutionPipeline::new(backend, config.execution)
                .with_admission(portfolio.clone()),
        );
        log::info!(
            "[AGENT] services wired: backend {}, {} asset(s), mode {:?}",
            pipeline.backend_name(),
            config.assets.len(),
            config.mode
        );
        Self {
            clock,
            portfolio,
            gate,
            repo,
            pipeline,
        }
    }

    /// Paper venue, in-memory repository and the configured scoring gate
    pub fn paper(config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<PaperStack, ConfigError> {
        config.validate()?;
        let venue = Arc::new(PaperVenue::new(config.paper_venue, clock.clone())?);
        let repo = Arc::new(InMemoryRepository::new());
        let gate: Arc<dyn ScoringGate> = match &config.gate_model {
            Some(model) => Arc::new(LogisticScoringGate::new(model.clone())?),
            None => Arc::new(ConstantScoringGate::default()),
        };
        let services = Self::new(config, clock, venue.clone(), gate, repo.clone());
        Ok(PaperStack {
            services,
            venue,
            repo,
        })
    }
}

/// Paper-trading services plus handles on the concrete adapters
pub struct PaperStack {
    pub services: Services,
    pub venue: Arc<PaperVenue>,
    pub repo: Arc<InMemoryRepository>,
}

/// One agent per configured asset, in configuration order
pub fn build_agents(config: &EngineConfig, services: &Services) -> Vec<AssetAgent> {
    config
        .assets
        .iter()
        .map(|asset| AssetAgent::new(asset, config, services.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()))
    }

    #[test]
    fn test_paper_stack_builds_agents() {
        let config = EngineConfig::default();
        let stack = Services::paper(&config, clock()).unwrap();
        let agents = build_agents(&config, &stack.services);

        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].symbol(), "BTC-USD");
        assert_eq!(agents[1].symbol(), "ETH-USD");
        assert_eq!(stack.services.pipeline.backend_name(), "paper");
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = EngineConfig {
            assets: vec![],
            ..Default::default()
        };
        assert!(matches!(
            Services::paper(&config, clock()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
