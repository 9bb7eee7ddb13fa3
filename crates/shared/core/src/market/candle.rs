use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::values::Price;

/// Fixed-interval OHLC bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Start of the interval the candle covers
    pub open_time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

impl Candle {
    /// Open a candle from a single tick
    pub fn from_tick(open_time: DateTime<Utc>, price: Price) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Fold another tick into the candle
    pub fn extend(&mut self, price: Price) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
    }

    pub fn range(&self) -> Price {
        self.high - self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_extend_tracks_extremes() {
        let mut c = Candle::from_tick(Utc::now(), dec!(100));
        c.extend(dec!(103));
        c.extend(dec!(97));
        c.extend(dec!(101));
        assert_eq!(c.open, dec!(100));
        assert_eq!(c.high, dec!(103));
        assert_eq!(c.low, dec!(97));
        assert_eq!(c.close, dec!(101));
        assert_eq!(c.range(), dec!(6));
    }
}
