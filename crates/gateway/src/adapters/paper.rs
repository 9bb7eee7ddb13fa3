//! Paper venue - fills every market order at the reference price plus slippage
//!
//! Connectivity can be toggled to exercise the retry path without a real
//! exchange.

use crate::error::GatewayError;
use aegis_core::{Fill, Order, Side};
use aegis_ports::{BackendError, Clock, ExecutionBackend};
use async_trait::async_trait;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperVenueConfig {
    /// Adverse price move applied to every fill, in basis points
    pub slippage_bps: Decimal,
    /// Fee charged on fill notional, in basis points
    pub fee_bps: Decimal,
}

impl Default for PaperVenueConfig {
    fn default() -> Self {
        Self {
            slippage_bps: dec!(2),
            fee_bps: dec!(10),
        }
    }
}

impl PaperVenueConfig {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.slippage_bps < Decimal::ZERO || self.fee_bps < Decimal::ZERO {
            return Err(GatewayError::InvalidConfig(format!(
                "negative slippage ({}) or fee ({})",
                self.slippage_bps, self.fee_bps
            )));
        }
        Ok(())
    }
}

pub struct PaperVenue {
    config: PaperVenueConfig,
    clock: Arc<dyn Clock>,
    connected: AtomicBool,
    fills: AtomicU64,
}

impl PaperVenue {
    pub fn new(config: PaperVenueConfig, clock: Arc<dyn Clock>) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            connected: AtomicBool::new(true),
            fills: AtomicU64::new(0),
        })
    }

    /// Simulate losing or regaining the connection
    pub fn set_connected(&self, connected: bool) {
        info!("PaperVenue connectivity -> {}", connected);
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn fill_count(&self) -> u64 {
        self.fills.load(Ordering::Relaxed)
    }

    fn fill_price(&self, order: &Order) -> Decimal {
        let slip = order.reference_price * self.config.slippage_bps / dec!(10000);
        match order.side {
            Side::Buy => order.reference_price + slip,
            Side::Sell => order.reference_price - slip,
        }
    }
}

#[async_trait]
impl ExecutionBackend for PaperVenue {
    fn name(&self) -> &str {
        "paper"
    }

    async fn place(&self, order: &Order) -> Result<Fill, BackendError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(BackendError::Connection("paper venue offline".to_string()));
        }
        if order.quantity <= Decimal::ZERO || order.reference_price <= Decimal::ZERO {
            warn!(
                "PaperVenue rejecting {} {:?} {} @ {}",
                order.symbol, order.side, order.quantity, order.reference_price
            );
            return Err(BackendError::Rejected(format!(
                "invalid order {} @ {}",
                order.quantity, order.reference_price
            )));
        }

        let price = self.fill_price(order);
        let fee = (price * order.quantity * self.config.fee_bps / dec!(10000)).round_dp(8);
        let fill = Fill::for_order(order, price, fee, self.clock.now());
        self.fills.fetch_add(1, Ordering::Relaxed);
        debug!(
            "PaperVenue filled {} {:?} {} @ {} fee {}",
            order.symbol, order.side, fill.quantity, fill.price, fill.fee
        );
        Ok(fill)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Connection("paper venue offline".to_string()))
        }
    }
}
