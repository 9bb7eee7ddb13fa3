//! Scoring gates
//!
//! [`LogisticScoringGate`] evaluates a logistic regression over the seven
//! trainer columns and tracks each issued record until its outcome arrives
//! or the idea is discarded. The tracked set is capped; past the cap the
//! oldest record is evicted. [`ConstantScoringGate`] always answers the same
//! probability and is what runs before a model has been trained.

use crate::error::GatewayError;
use aegis_ports::{GateFeatures, GateScore, ScoringError, ScoringGate};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Records awaiting an outcome before the oldest is evicted
pub const DEFAULT_PENDING_CAP: usize = 1024;

/// Weights in trainer column order plus intercept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl Default for LogisticModel {
    fn default() -> Self {
        // rsi14, adx14, fast_slow_delta, bb_width, sentiment, order_book, action
        Self {
            weights: vec![-0.01, 0.02, 5.0, -2.0, 0.5, 0.5, 0.0],
            bias: 0.4,
        }
    }
}

impl LogisticModel {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.weights.len() != GateFeatures::LEN {
            return Err(GatewayError::InvalidModel(format!(
                "expected {} weights, got {}",
                GateFeatures::LEN,
                self.weights.len()
            )));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(GatewayError::InvalidModel("non-finite coefficient".to_string()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, GatewayError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn probability(&self, features: &GateFeatures) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(features.to_vec())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-z).exp())
    }
}

pub struct LogisticScoringGate {
    model: LogisticModel,
    /// Record id to issue sequence
    pending: DashMap<Uuid, u64>,
    pending_cap: usize,
    issued: AtomicU64,
}

impl LogisticScoringGate {
    pub fn new(model: LogisticModel) -> Result<Self, GatewayError> {
        model.validate()?;
        info!("LogisticScoringGate loaded (bias {})", model.bias);
        Ok(Self {
            model,
            pending: DashMap::new(),
            pending_cap: DEFAULT_PENDING_CAP,
            issued: AtomicU64::new(0),
        })
    }

    pub fn with_pending_cap(mut self, cap: usize) -> Self {
        self.pending_cap = cap.max(1);
        self
    }

    /// Scored records still waiting for an outcome
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .pending
            .iter()
            .min_by_key(|entry| *entry.value())
            .map(|entry| *entry.key());
        if let Some(id) = oldest {
            self.pending.remove(&id);
            warn!("gate record {} evicted without an outcome", id);
        }
    }
}

#[async_trait]
impl ScoringGate for LogisticScoringGate {
    async fn score(&self, features: &GateFeatures) -> Result<GateScore, ScoringError> {
        if !features.is_finite() {
            return Err(ScoringError::InvalidFeatures(format!("{:?}", features)));
        }
        let probability = self.model.probability(features);
        let record_id = Uuid::new_v4();
        while self.pending.len() >= self.pending_cap {
            self.evict_oldest();
        }
        let seq = self.issued.fetch_add(1, Ordering::Relaxed);
        self.pending.insert(record_id, seq);
        debug!("gate scored {:.3} (record {})", probability, record_id);
        Ok(GateScore {
            probability,
            record_id: Some(record_id),
        })
    }

    async fn update_outcome(&self, record_id: Uuid, pnl: Decimal) -> Result<(), ScoringError> {
        match self.pending.remove(&record_id) {
            Some(_) => {
                debug!("gate outcome for {}: pnl {}", record_id, pnl);
                Ok(())
            }
            None => Err(ScoringError::UnknownRecord(record_id.to_string())),
        }
    }

    async fn discard(&self, record_id: Uuid) -> Result<(), ScoringError> {
        self.pending
            .remove(&record_id)
            .map(|_| debug!("gate record {} discarded", record_id))
            .ok_or_else(|| ScoringError::UnknownRecord(record_id.to_string()))
    }
}

/// Gate that scores every idea the same
#[derive(Debug, Clone, Copy)]
pub struct ConstantScoringGate {
    probability: f64,
}

impl Default for ConstantScoringGate {
    fn default() -> Self {
        Self { probability: 0.7 }
    }
}

impl ConstantScoringGate {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl ScoringGate for ConstantScoringGate {
    async fn score(&self, _features: &GateFeatures) -> Result<GateScore, ScoringError> {
        Ok(GateScore {
            probability: self.probability,
            record_id: None,
        })
    }

    async fn update_outcome(&self, _record_id: Uuid, _pnl: Decimal) -> Result<(), ScoringError> {
        Ok(())
    }
}
