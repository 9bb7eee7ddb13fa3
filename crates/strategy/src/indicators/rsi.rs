use super::WilderAverage;

/// Relative Strength Index with Wilder smoothing. Reads 50 until warm.
#[derive(Debug, Clone)]
pub struct Rsi {
    prev_close: Option<f64>,
    gains: WilderAverage,
    losses: WilderAverage,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            gains: WilderAverage::new(period),
            losses: WilderAverage::new(period),
        }
    }

    pub fn update(&mut self, close: f64) {
        if !close.is_finite() {
            return;
        }
        if let Some(prev) = self.prev_close {
            let change = close - prev;
            self.gains.update(change.max(0.0));
            self.losses.update((-change).max(0.0));
        }
        self.prev_close = Some(close);
    }

    pub fn is_warm(&self) -> bool {
        self.gains.is_warm()
    }

    pub fn value(&self) -> f64 {
        if !self.is_warm() {
            return 50.0;
        }
        let avg_gain = self.gains.value();
        let avg_loss = self.losses.value();
        if avg_loss == 0.0 {
            return if avg_gain == 0.0 { 50.0 } else { 100.0 };
        }
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_until_warm() {
        let mut rsi = Rsi::new(14);
        for i in 0..14 {
            rsi.update(100.0 + i as f64);
            assert_eq!(rsi.value(), 50.0);
        }
        rsi.update(114.0);
        assert_eq!(rsi.value(), 100.0);
    }

    #[test]
    fn test_falling_series_is_oversold() {
        let mut rsi = Rsi::new(5);
        for i in 0..20 {
            let wiggle = if i % 4 == 0 { 0.5 } else { 0.0 };
            rsi.update(200.0 - i as f64 * 2.0 + wiggle);
        }
        assert!(rsi.value() < 30.0, "rsi = {}", rsi.value());
    }

    #[test]
    fn test_ignores_non_finite() {
        let mut rsi = Rsi::new(2);
        rsi.update(10.0);
        rsi.update(11.0);
        rsi.update(10.5);
        let before = rsi.value();
        rsi.update(f64::NAN);
        rsi.update(f64::INFINITY);
        assert_eq!(rsi.value(), before);
    }
}
