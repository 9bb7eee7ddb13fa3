use super::{WilderAverage, true_range};

/// Average True Range with Wilder smoothing. Reads 0 before the first candle.
#[derive(Debug, Clone)]
pub struct Atr {
    prev_close: Option<f64>,
    avg: WilderAverage,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            avg: WilderAverage::new(period),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) {
        if !(high.is_finite() && low.is_finite() && close.is_finite()) {
            return;
        }
        self.avg.update(true_range(high, low, self.prev_close));
        self.prev_close = Some(close);
    }

    pub fn value(&self) -> f64 {
        if self.avg.has_data() {
            self.avg.value()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_range_converges() {
        let mut atr = Atr::new(14);
        assert_eq!(atr.value(), 0.0);
        for _ in 0..40 {
            atr.update(102.0, 98.0, 100.0);
        }
        assert!((atr.value() - 4.0).abs() < 1e-9);
    }
}
