use std::collections::VecDeque;

/// Simple moving average over a ring buffer with a running sum
///
/// Averages whatever it has until the window fills; reads 0 when empty.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }
        self.window.push_back(x);
        self.sum += x;
        if self.window.len() > self.period
            && let Some(old) = self.window.pop_front()
        {
            self.sum -= old;
        }
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.period
    }

    pub fn value(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.sum / self.window.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolls_window() {
        let mut sma = Sma::new(3);
        assert_eq!(sma.value(), 0.0);
        sma.update(1.0);
        assert_eq!(sma.value(), 1.0);
        sma.update(2.0);
        sma.update(3.0);
        assert!(sma.is_full());
        assert_eq!(sma.value(), 2.0);
        sma.update(7.0);
        assert_eq!(sma.value(), 4.0);
    }
}
