use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use crate::config::ConfigError;
use crate::utils::stable_seed_bytes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightInitMethod {
    /// Uniform over `[-0.5, 0.5) * (4.8 / fan_in) * size`.
    Linear,
    /// Standard normal scaled by the initialisation size.
    Gaussian,
}

impl FromStr for WeightInitMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(WeightInitMethod::Linear),
            // older configuration files carry the misspelling
            "gaussian" | "guassian" => Ok(WeightInitMethod::Gaussian),
            _ => Err(ConfigError::NotSupported(format!("weight initialisation method '{}'", s.trim()))),
        }
    }
}

impl fmt::Display for WeightInitMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WeightInitMethod::Linear => f.write_str("Linear"),
            WeightInitMethod::Gaussian => f.write_str("Gaussian"),
        }
    }
}

#[derive(Clone)]
pub struct WeightInitializer {
    method: WeightInitMethod,
    size: f64,
    rng: XorShiftRng,
}

impl fmt::Debug for WeightInitializer {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("WeightInitializer")
            .field("method", &self.method)
            .field("size", &self.size)
            .finish()
    }
}

impl WeightInitializer {

    pub fn new(method: WeightInitMethod, size: f64, seed: u64) -> Self {
        WeightInitializer {
            method,
            size,
            rng: XorShiftRng::from_seed(stable_seed_bytes(seed)),
        }
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub fn get_weight(&mut self, fan_in: usize) -> f64 {
        debug_assert!(fan_in > 0);
        match self.method {
            WeightInitMethod::Linear => (self.next_uniform() - 0.5) * (4.8 / fan_in as f64) * self.size,
            WeightInitMethod::Gaussian => self.next_normal() * self.size,
        }
    }

    pub fn randomise(&mut self, weights: &mut [f64], fan_in: usize) {
        for weight in weights.iter_mut() {
            *weight = self.get_weight(fan_in);
        }
    }

    /// Box-Muller transform; mean zero, variance one.
    fn next_normal(&mut self) -> f64 {
        // shift into (0, 1] so the logarithm stays finite
        let uniform1 = 1.0 - self.next_uniform();
        let uniform2 = self.next_uniform();
        f64::sqrt(-2.0 * f64::ln(uniform1)) * f64::cos(2.0 * PI * uniform2)
    }

}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_seed_is_deterministic() {
        let mut a = WeightInitializer::new(WeightInitMethod::Gaussian, 1.0, 42);
        let mut b = WeightInitializer::new(WeightInitMethod::Gaussian, 1.0, 42);
        for _ in 0..100 {
            assert_eq!(a.get_weight(5).to_bits(), b.get_weight(5).to_bits());
        }
        let mut c = WeightInitializer::new(WeightInitMethod::Gaussian, 1.0, 43);
        let first_a = WeightInitializer::new(WeightInitMethod::Gaussian, 1.0, 42).get_weight(5);
        assert_ne!(first_a, c.get_weight(5));
    }

    #[test]
    fn test_linear_range() {
        let mut init = WeightInitializer::new(WeightInitMethod::Linear, 2.0, 7);
        let fan_in = 12;
        let bound = 0.5 * (4.8 / fan_in as f64) * 2.0;
        for _ in 0..1000 {
            let w = init.get_weight(fan_in);
            assert!(w >= -bound && w < bound, "{} out of range", w);
        }
    }

    #[test]
    fn test_gaussian_moments() {
        let mut init = WeightInitializer::new(WeightInitMethod::Gaussian, 1.0, 3);
        let n = 20000;
        let samples: Vec<f64> = (0..n).map(|_| init.get_weight(1)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n as f64;
        assert!(samples.iter().all(|s| s.is_finite()));
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((variance - 1.0).abs() < 0.1, "variance {}", variance);
    }

    #[test]
    fn test_parse_method() {
        assert_eq!("Linear".parse::<WeightInitMethod>().unwrap(), WeightInitMethod::Linear);
        assert_eq!(" gaussian ".parse::<WeightInitMethod>().unwrap(), WeightInitMethod::Gaussian);
        assert_eq!("Guassian".parse::<WeightInitMethod>().unwrap(), WeightInitMethod::Gaussian);
        match "Orthogonal".parse::<WeightInitMethod>() {
            Err(ConfigError::NotSupported(_)) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

}
