//! Execution Pipeline
//!
//! Submits an order to the backend with bounded retries:
//! - optional connectivity check before each attempt
//! - every `place` call runs under a timeout (a timeout is transient)
//! - exponential backoff `base * 2^(n-1)` capped, plus uniform jitter
//! - entries re-check portfolio admission between attempts
//! - venue rejections are final
//!
//! Returned fills are validated against the order before anyone books them.

use crate::error::{Error, Result};
use aegis_core::{Fill, Order};
use aegis_ports::{BackendError, ExecutionBackend};
use aegis_risk_manager::PortfolioRiskAggregator;
use async_trait::async_trait;
use log::{debug, info, warn};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Retry and timeout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Upper bound of the uniform jitter added to each backoff
    pub jitter_ms: u64,
    pub timeout_ms: u64,
    pub verify_connectivity: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 200,
            max_backoff_ms: 5_000,
            jitter_ms: 100,
            timeout_ms: 5_000,
            verify_connectivity: true,
        }
    }
}

impl ExecutionConfig {
    /// Delay before retrying after failed attempt `attempt` (1-based), without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(20);
        let ms = self
            .base_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Admission check consulted between entry attempts
#[async_trait]
pub trait AdmissionGate: Send + Sync {
    async fn can_trade(&self) -> bool;
}

#[async_trait]
impl AdmissionGate for PortfolioRiskAggregator {
    async fn can_trade(&self) -> bool {
        PortfolioRiskAggregator::can_trade(self).await
    }
}

/// Submission counters
#[derive(Debug, Default)]
pub struct ExecutionStats {
    submissions: AtomicU64,
    attempts: AtomicU64,
    retries: AtomicU64,
    fills: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionStatsSnapshot {
    pub submissions: u64,
    pub attempts: u64,
    pub retries: u64,
    pub fills: u64,
    pub failures: u64,
}

impl ExecutionStats {
    pub fn snapshot(&self) -> ExecutionStatsSnapshot {
        ExecutionStatsSnapshot {
            submissions: self.submissions.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            fills: self.fills.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// A validated fill plus how many attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub fill: Fill,
    pub attempts: u32,
}

pub struct ExecutionPipeline {
    backend: Arc<dyn ExecutionBackend>,
    admission: Option<Arc<dyn AdmissionGate>>,
    config: ExecutionConfig,
    stats: ExecutionStats,
}

impl ExecutionPipeline {
    pub fn new(backend: Arc<dyn ExecutionBackend>, config: ExecutionConfig) -> Self {
        Self {
            backend,
            admission: None,
            config,
            stats: ExecutionStats::default(),
        }
    }

    pub fn with_admission(mut self, admission: Arc<dyn AdmissionGate>) -> Self {
        self.admission = Some(admission);
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn stats(&self) -> ExecutionStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn fail<T>(&self, err: Error) -> Result<T> {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        Err(err)
    }

    /// Submit `order`, retrying transient failures
    pub async fn submit(&self, order: &Order) -> Result<Execution> {
        self.stats.submissions.fetch_add(1, Ordering::Relaxed);
        let max_attempts = self.config.max_attempts.max(1);
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut last = BackendError::Connection("no attempt made".to_string());

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let jitter = if self.config.jitter_ms > 0 {
                    rand::thread_rng().gen_range(0..=self.config.jitter_ms)
                } else {
                    0
                };
                let delay = self.config.backoff(attempt - 1) + Duration::from_millis(jitter);
                debug!(
                    "[EXEC] {} retry {}/{} in {:?}",
                    order.symbol, attempt, max_attempts, delay
                );
                tokio::time::sleep(delay).await;
                self.stats.retries.fetch_add(1, Ordering::Relaxed);

                if order.intent.is_entry()
                    && let Some(gate) = &self.admission
                    && !gate.can_trade().await
                {
                    warn!(
                        "[EXEC] {} admission revoked before attempt {}, aborting entry",
                        order.symbol, attempt
                    );
                    return self.fail(Error::AdmissionRevoked {
                        attempts: attempt - 1,
                    });
                }
            }
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);

            if self.config.verify_connectivity {
                let ping = match tokio::time::timeout(timeout, self.backend.ping()).await {
                    Ok(result) => result,
                    Err(_) => Err(BackendError::Timeout(self.config.timeout_ms)),
                };
                if let Err(e) = ping {
                    warn!(
                        "[EXEC] {} connectivity check failed on attempt {}: {}",
                        order.symbol, attempt, e
                    );
                    last = e;
                    continue;
                }
            }

            let placed = match tokio::time::timeout(timeout, self.backend.place(order)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout(self.config.timeout_ms)),
            };
            match placed {
                Ok(fill) => {
                    if let Err(e) = validate_fill(order, &fill) {
                        warn!("[ANOMALY] {} {}", order.symbol, e);
                        return self.fail(e);
                    }
                    self.stats.fills.fetch_add(1, Ordering::Relaxed);
                    info!(
                        "[EXEC] {} {:?} {} filled @ {} on {} (attempt {})",
                        order.symbol,
                        order.side,
                        fill.quantity,
                        fill.price,
                        self.backend.name(),
                        attempt
                    );
                    return Ok(Execution {
                        fill,
                        attempts: attempt,
                    });
                }
                Err(e) if !e.is_transient() => {
                    warn!("[EXEC] {} rejected by {}: {}", order.symbol, self.backend.name(), e);
                    return self.fail(Error::Rejected(e));
                }
                Err(e) => {
                    warn!(
                        "[EXEC] {} attempt {}/{} failed: {}",
                        order.symbol, attempt, max_attempts, e
                    );
                    last = e;
                }
            }
        }

        warn!(
            "[EXEC] {} giving up after {} attempts: {}",
            order.symbol, max_attempts, last
        );
        self.fail(Error::MaxRetriesExceeded {
            attempts: max_attempts,
            last,
        })
    }
}

/// A fill must be positive and belong to the order it answers
pub fn validate_fill(order: &Order, fill: &Fill) -> Result<()> {
    if fill.quantity <= Decimal::ZERO || fill.price <= Decimal::ZERO {
        return Err(Error::InvalidFill(format!(
            "non-positive fill {} @ {}",
            fill.quantity, fill.price
        )));
    }
    if fill.symbol != order.symbol || fill.side != order.side {
        return Err(Error::InvalidFill(format!(
            "fill {} {:?} does not match order {} {:?}",
            fill.symbol, fill.side, order.symbol, order.side
        )));
    }
    if fill.order_id != order.id {
        return Err(Error::InvalidFill(format!(
            "fill for order {} returned for {}",
            fill.order_id, order.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{OrderIntent, Side, StrategyKind};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::new(
            "BTC-USD".to_string(),
            Side::Buy,
            dec!(1),
            dec!(100),
            OrderIntent::Entry,
            StrategyKind::TrendFollow,
            Utc::now(),
        )
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let cfg = ExecutionConfig::default();
        assert_eq!(cfg.backoff(1), Duration::from_millis(200));
        assert_eq!(cfg.backoff(2), Duration::from_millis(400));
        assert_eq!(cfg.backoff(3), Duration::from_millis(800));
        assert_eq!(cfg.backoff(10), Duration::from_millis(5_000));
        assert_eq!(cfg.backoff(u32::MAX), Duration::from_millis(5_000));
    }

    #[test]
    fn test_validate_fill() {
        let o = order();
        let good = Fill::for_order(&o, dec!(100.1), dec!(0.1), Utc::now());
        assert!(validate_fill(&o, &good).is_ok());

        let mut wrong_side = good.clone();
        wrong_side.side = Side::Sell;
        assert!(matches!(validate_fill(&o, &wrong_side), Err(Error::InvalidFill(_))));

        let mut empty = good.clone();
        empty.quantity = Decimal::ZERO;
        assert!(validate_fill(&o, &empty).is_err());

        let mut other = good;
        other.symbol = "ETH-USD".to_string();
        assert!(validate_fill(&o, &other).is_err());
    }
}
