//! Tick to candle aggregation
//!
//! Ticks are bucketed by flooring their timestamp to the candle interval.
//! A tick in a newer bucket seals the current candle and opens the next one.
//! Ticks that arrive late (older than the current bucket) are folded into the
//! current candle rather than rewriting sealed history.

use aegis_core::{Candle, Price, Timestamp};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Default number of sealed candles retained per symbol
pub const DEFAULT_WINDOW_CAP: usize = 500;

/// Converts a tick stream into fixed-interval OHLC candles
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    interval_ms: i64,
    cap: usize,
    current: Option<Candle>,
    history: VecDeque<Candle>,
}

impl CandleAggregator {
    pub fn new(interval: Duration, cap: usize) -> Self {
        Self {
            interval_ms: interval.num_milliseconds().max(1),
            cap: cap.max(1),
            current: None,
            history: VecDeque::with_capacity(cap.clamp(1, DEFAULT_WINDOW_CAP)),
        }
    }

    /// Start of the interval containing `ts`
    fn bucket(&self, ts: Timestamp) -> Timestamp {
        let ms = ts.timestamp_millis();
        let floored = ms - ms.rem_euclid(self.interval_ms);
        DateTime::<Utc>::from_timestamp_millis(floored).unwrap_or(ts)
    }

    /// Feed one tick. Returns the candle sealed by this tick, if any.
    pub fn on_tick(&mut self, price: Price, ts: Timestamp) -> Option<Candle> {
        let bucket = self.bucket(ts);

        match self.current.as_mut() {
            None => {
                self.current = Some(Candle::from_tick(bucket, price));
                None
            }
            Some(candle) if bucket > candle.open_time => {
                let sealed = *candle;
                *candle = Candle::from_tick(bucket, price);
                self.push_sealed(sealed);
                Some(sealed)
            }
            Some(candle) => {
                // Same bucket, or a late tick: fold into the open candle.
                candle.extend(price);
                None
            }
        }
    }

    fn push_sealed(&mut self, candle: Candle) {
        self.history.push_back(candle);
        while self.history.len() > self.cap {
            self.history.pop_front();
        }
    }

    /// The candle still being built
    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    /// Sealed candles, oldest first
    pub fn history(&self) -> &VecDeque<Candle> {
        &self.history
    }

    /// Lowest low and highest high over the last `lookback` sealed candles
    pub fn support_resistance(&self, lookback: usize) -> Option<(Price, Price)> {
        support_resistance(&self.history, lookback)
    }
}

/// Lowest low and highest high over the last `lookback` candles of `candles`
pub fn support_resistance(candles: &VecDeque<Candle>, lookback: usize) -> Option<(Price, Price)> {
    if lookback == 0 || candles.is_empty() {
        return None;
    }
    let skip = candles.len().saturating_sub(lookback);
    let mut iter = candles.iter().skip(skip);
    let first = iter.next()?;
    let (low, high) = iter.fold((first.low, first.high), |(lo, hi), c| {
        (lo.min(c.low), hi.max(c.high))
    });
    Some((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn t(min: u32, sec: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 2, 10, min, sec).unwrap()
    }

    #[test]
    fn test_same_bucket_extends_candle() {
        let mut agg = CandleAggregator::new(Duration::minutes(1), 10);
        assert!(agg.on_tick(dec!(100), t(0, 5)).is_none());
        assert!(agg.on_tick(dec!(102), t(0, 20)).is_none());
        assert!(agg.on_tick(dec!(99), t(0, 40)).is_none());

        let c = agg.current().unwrap();
        assert_eq!(c.open_time, t(0, 0));
        assert_eq!((c.open, c.high, c.low, c.close), (dec!(100), dec!(102), dec!(99), dec!(99)));
        assert!(agg.history().is_empty());
    }

    #[test]
    fn test_new_bucket_seals_previous() {
        let mut agg = CandleAggregator::new(Duration::minutes(1), 10);
        agg.on_tick(dec!(100), t(0, 5));
        agg.on_tick(dec!(101), t(0, 50));

        let sealed = agg.on_tick(dec!(105), t(1, 2)).unwrap();
        assert_eq!(sealed.open_time, t(0, 0));
        assert_eq!(sealed.close, dec!(101));

        let open = agg.current().unwrap();
        assert_eq!(open.open_time, t(1, 0));
        assert_eq!((open.open, open.high, open.low), (dec!(105), dec!(105), dec!(105)));
        assert_eq!(agg.history().len(), 1);
    }

    #[test]
    fn test_late_tick_folds_into_current() {
        let mut agg = CandleAggregator::new(Duration::minutes(1), 10);
        agg.on_tick(dec!(100), t(0, 5));
        agg.on_tick(dec!(101), t(1, 5));
        assert!(agg.on_tick(dec!(90), t(0, 30)).is_none());

        assert_eq!(agg.current().unwrap().low, dec!(90));
        assert_eq!(agg.history()[0].low, dec!(100));
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut agg = CandleAggregator::new(Duration::minutes(1), 3);
        for m in 0..6 {
            agg.on_tick(Price::from(100 + m), t(m, 0));
        }
        assert_eq!(agg.history().len(), 3);
        assert_eq!(agg.history().front().unwrap().open_time, t(2, 0));
    }

    #[test]
    fn test_support_resistance_uses_lookback() {
        let mut agg = CandleAggregator::new(Duration::minutes(1), 10);
        let prices = [dec!(95), dec!(110), dec!(100), dec!(102), dec!(98), dec!(101)];
        for (m, p) in prices.iter().enumerate() {
            agg.on_tick(*p, t(m as u32, 0));
        }
        // sealed: 95, 110, 100, 102, 98
        assert_eq!(agg.support_resistance(3), Some((dec!(98), dec!(102))));
        assert_eq!(agg.support_resistance(50), Some((dec!(95), dec!(110))));
        assert_eq!(agg.support_resistance(0), None);
    }
}
