use std::fmt;

/// Running summary of a stream of per-sample losses.
#[derive(Clone, Default, PartialEq)]
pub struct LossStats {
    sum: f64,
    count: u32,
    max: Option<f64>,
    min: Option<f64>,
}

impl fmt::Debug for LossStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), std::fmt::Error> {
        f.debug_struct("LossStats")
            .field("count", &self.count)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("mean", &self.mean())
            .finish()
    }
}

impl LossStats {

    pub fn new() -> Self {
        LossStats::default()
    }

    #[inline]
    pub fn report(&mut self, loss: f64) {
        self.sum += loss;
        self.count += 1;
        self.min = Some(self.min.map_or(loss, |min| min.min(loss)));
        self.max = Some(self.max.map_or(loss, |max| max.max(loss)));
    }

    /// NaN before anything was reported.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    #[inline]
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    #[inline]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = LossStats::default();
    }
}
