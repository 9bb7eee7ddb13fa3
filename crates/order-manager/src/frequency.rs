//! Trade frequency limits: cooldown between entries and an hourly cap
//!
//! Entries reserve a slot up front; a reservation is handed back when the
//! submission fails for rate-limit reasons.

use aegis_core::Timestamp;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyLimits {
    pub cooldown_minutes: i64,
    pub max_trades_per_hour: usize,
}

impl Default for FrequencyLimits {
    fn default() -> Self {
        Self {
            cooldown_minutes: 15,
            max_trades_per_hour: 4,
        }
    }
}

/// Limits per run mode. Backtests compress time, so they trade more often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    pub live: FrequencyLimits,
    pub backtest: FrequencyLimits,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            live: FrequencyLimits::default(),
            backtest: FrequencyLimits {
                cooldown_minutes: 5,
                max_trades_per_hour: 12,
            },
        }
    }
}

impl FrequencyConfig {
    pub fn limits(&self, backtest: bool) -> FrequencyLimits {
        if backtest { self.backtest } else { self.live }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyBlock {
    Cooldown { remaining_secs: i64 },
    HourlyCap { trades: usize },
}

impl std::fmt::Display for FrequencyBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrequencyBlock::Cooldown { remaining_secs } => {
                write!(f, "cooldown ({}s remaining)", remaining_secs)
            }
            FrequencyBlock::HourlyCap { trades } => write!(f, "hourly cap ({} trades)", trades),
        }
    }
}

/// Slot taken by [`FrequencyLimiter::reserve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    at: Timestamp,
    previous_last: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct FrequencyLimiter {
    limits: FrequencyLimits,
    last_trade: Option<Timestamp>,
    recent: VecDeque<Timestamp>,
}

impl FrequencyLimiter {
    pub fn new(limits: FrequencyLimits) -> Self {
        Self {
            limits,
            last_trade: None,
            recent: VecDeque::new(),
        }
    }

    pub fn limits(&self) -> FrequencyLimits {
        self.limits
    }

    fn prune(&mut self, now: Timestamp) {
        let horizon = now - Duration::hours(1);
        while self.recent.front().is_some_and(|t| *t <= horizon) {
            self.recent.pop_front();
        }
    }

    /// Whether an entry is allowed at `now`
    pub fn check(&mut self, now: Timestamp) -> Result<(), FrequencyBlock> {
        self.prune(now);
        if let Some(last) = self.last_trade {
            let ready = last + Duration::minutes(self.limits.cooldown_minutes);
            if now < ready {
                return Err(FrequencyBlock::Cooldown {
                    remaining_secs: (ready - now).num_seconds(),
                });
            }
        }
        if self.recent.len() >= self.limits.max_trades_per_hour {
            return Err(FrequencyBlock::HourlyCap {
                trades: self.recent.len(),
            });
        }
        Ok(())
    }

    /// Check and take a slot
    pub fn reserve(&mut self, now: Timestamp) -> Result<Reservation, FrequencyBlock> {
        self.check(now)?;
        let reservation = Reservation {
            at: now,
            previous_last: self.last_trade,
        };
        self.last_trade = Some(now);
        self.recent.push_back(now);
        Ok(reservation)
    }

    /// Give a slot back
    pub fn revert(&mut self, reservation: Reservation) {
        if let Some(idx) = self.recent.iter().rposition(|t| *t == reservation.at) {
            self.recent.remove(idx);
        }
        if self.last_trade == Some(reservation.at) {
            self.last_trade = reservation.previous_last;
        }
    }

    pub fn trades_last_hour(&self) -> usize {
        self.recent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_cooldown() {
        let mut limiter = FrequencyLimiter::new(FrequencyLimits::default());
        limiter.reserve(t0()).unwrap();
        assert_eq!(
            limiter.check(t0() + Duration::minutes(10)),
            Err(FrequencyBlock::Cooldown { remaining_secs: 300 })
        );
        assert!(limiter.check(t0() + Duration::minutes(15)).is_ok());
    }

    #[test]
    fn test_hourly_cap_rolls_off() {
        let mut limiter = FrequencyLimiter::new(FrequencyLimits {
            cooldown_minutes: 0,
            max_trades_per_hour: 2,
        });
        limiter.reserve(t0()).unwrap();
        limiter.reserve(t0() + Duration::minutes(20)).unwrap();
        assert_eq!(
            limiter.check(t0() + Duration::minutes(40)),
            Err(FrequencyBlock::HourlyCap { trades: 2 })
        );
        // First trade leaves the window
        assert!(limiter.check(t0() + Duration::minutes(61)).is_ok());
    }

    #[test]
    fn test_revert_restores_previous_state() {
        let mut limiter = FrequencyLimiter::new(FrequencyLimits::default());
        limiter.reserve(t0()).unwrap();
        let later = t0() + Duration::minutes(30);
        let r = limiter.reserve(later).unwrap();
        assert_eq!(limiter.trades_last_hour(), 2);

        limiter.revert(r);
        assert_eq!(limiter.trades_last_hour(), 1);
        // Cooldown measured from the first trade again
        assert!(limiter.check(t0() + Duration::minutes(31)).is_ok());
    }

    #[test]
    fn test_mode_limits() {
        let cfg = FrequencyConfig::default();
        assert_eq!(cfg.limits(false).cooldown_minutes, 15);
        assert_eq!(cfg.limits(true).max_trades_per_hour, 12);
    }
}
