use serde::{Deserialize, Serialize};

/// Observed bounds of the currently loaded variable.
///
/// Starts at `{ min: +inf, max: -inf }`, which reads as "no data yet".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRange {
    min: f64,
    max: f64,
}

impl Default for StatRange {
    fn default() -> Self {
        Self::new()
    }
}

impl StatRange {
    pub const fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Range spanning exactly `[min, max]`.
    pub fn from_bounds(min: f64, max: f64) -> Self {
        let mut r = Self::new();
        r.observe(min);
        r.observe(max);
        r
    }

    /// Widen the bounds to include `value`. Only finite values count; NaN and
    /// the infinities leave the range untouched.
    pub fn observe(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// `true` when a single distinct value has been observed.
    pub fn is_degenerate(&self) -> bool {
        !self.is_empty() && self.min == self.max
    }

    /// Bounds as a pair, or `None` while empty.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        (!self.is_empty()).then_some((self.min, self.max))
    }

    /// Linear fraction of `value` within the range (unclamped).
    ///
    /// `None` for an empty or degenerate range, or a NaN value.
    pub fn position(&self, value: f64) -> Option<f64> {
        if self.is_empty() || self.is_degenerate() || value.is_nan() {
            return None;
        }
        Some((value - self.min) / (self.max - self.min))
    }
}

impl Extend<f64> for StatRange {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.observe(v);
        }
    }
}

impl FromIterator<f64> for StatRange {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut r = Self::new();
        r.extend(iter);
        r
    }
}
