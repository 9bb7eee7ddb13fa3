use std::collections::VecDeque;

/// Bollinger band width as a fraction of the middle band
///
/// `(upper - lower) / middle = 4 * sigma / sma` with two-sigma bands and the
/// population standard deviation, maintained from a running sum and sum of
/// squares. Reads 0 until the window is full.
#[derive(Debug, Clone)]
pub struct BollingerWidth {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl BollingerWidth {
    pub fn new(period: usize) -> Self {
        let period = period.max(2);
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn update(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }
        self.window.push_back(x);
        self.sum += x;
        self.sum_sq += x * x;
        if self.window.len() > self.period
            && let Some(old) = self.window.pop_front()
        {
            self.sum -= old;
            self.sum_sq -= old * old;
        }
    }

    pub fn value(&self) -> f64 {
        if self.window.len() < self.period {
            return 0.0;
        }
        let n = self.period as f64;
        let mean = self.sum / n;
        if mean == 0.0 {
            return 0.0;
        }
        // Rounding in the running sums can push variance slightly negative.
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        4.0 * variance.sqrt() / mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_until_full_and_for_flat_prices() {
        let mut bb = BollingerWidth::new(4);
        for _ in 0..3 {
            bb.update(100.0);
            assert_eq!(bb.value(), 0.0);
        }
        bb.update(100.0);
        assert_eq!(bb.value(), 0.0);
    }

    #[test]
    fn test_width_matches_population_sigma() {
        let mut bb = BollingerWidth::new(4);
        for x in [98.0, 102.0, 98.0, 102.0] {
            bb.update(x);
        }
        // sigma = 2, mean = 100
        assert!((bb.value() - 0.08).abs() < 1e-9);
    }
}
