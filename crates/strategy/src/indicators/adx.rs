use super::{WilderAverage, true_range};

/// Average Directional Index (Wilder)
///
/// +DM/-DM/TR are Wilder-smoothed over `period`, DX is derived from the
/// directional indices, and ADX is the Wilder average of DX. Reads 25 until
/// `period` DX values have been absorbed.
#[derive(Debug, Clone)]
pub struct Adx {
    prev: Option<(f64, f64, f64)>,
    plus_dm: WilderAverage,
    minus_dm: WilderAverage,
    tr: WilderAverage,
    dx: WilderAverage,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self {
            prev: None,
            plus_dm: WilderAverage::new(period),
            minus_dm: WilderAverage::new(period),
            tr: WilderAverage::new(period),
            dx: WilderAverage::new(period),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) {
        if !(high.is_finite() && low.is_finite() && close.is_finite()) {
            return;
        }
        let Some((prev_high, prev_low, prev_close)) = self.prev else {
            self.prev = Some((high, low, close));
            return;
        };

        let up = high - prev_high;
        let down = prev_low - low;
        let plus = if up > down && up > 0.0 { up } else { 0.0 };
        let minus = if down > up && down > 0.0 { down } else { 0.0 };

        self.plus_dm.update(plus);
        self.minus_dm.update(minus);
        self.tr.update(true_range(high, low, Some(prev_close)));
        self.prev = Some((high, low, close));

        if !self.tr.is_warm() {
            return;
        }
        let tr = self.tr.value();
        if tr <= 0.0 {
            self.dx.update(0.0);
            return;
        }
        let plus_di = 100.0 * self.plus_dm.value() / tr;
        let minus_di = 100.0 * self.minus_dm.value() / tr;
        let sum = plus_di + minus_di;
        let dx = if sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / sum
        };
        self.dx.update(dx);
    }

    pub fn is_warm(&self) -> bool {
        self.dx.is_warm()
    }

    pub fn value(&self) -> f64 {
        if self.is_warm() { self.dx.value() } else { 25.0 }
    }
}
