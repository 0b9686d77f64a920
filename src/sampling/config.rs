//! Filter configuration
//!
//! [`FilterConfig`] gathers the three construction parameters plus an optional
//! seed, validates them, and builds filters. With the `serde` feature it can be
//! loaded from any serde format; missing fields take the defaults below.

use rand::RngCore;

use super::filter::AdaptiveSamplingFilter;
use super::rng::Xorshift64;
use crate::traits::ConfigError;

/// Default number of tracked buckets
pub const DEFAULT_REAL_SIZE: usize = 1_000_000;
/// Default size of the full logical hash space
pub const DEFAULT_TOTAL_SIZE: usize = 1_500_000;
/// Default target sampling probability
pub const DEFAULT_TARGET_PROBABILITY: f64 = 0.01;

/// Construction parameters for an [`AdaptiveSamplingFilter`]
///
/// # Example
///
/// ```
/// use flowsample::sampling::FilterConfig;
///
/// let filter = FilterConfig::new(1000, 1500, 0.1).with_seed(7).build().unwrap();
/// assert_eq!(filter.zero_count(), 1000);
///
/// assert!(FilterConfig::new(0, 10, 0.5).validate().is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    /// Buckets tracked by the bitmap
    pub real_size: usize,
    /// Size of the logical hash space, real part included
    pub total_size: usize,
    /// Target fraction of admitted distinct items to sample, in (0, 1]
    pub target_probability: f64,
    /// Seed for the default generator
    pub seed: Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            real_size: DEFAULT_REAL_SIZE,
            total_size: DEFAULT_TOTAL_SIZE,
            target_probability: DEFAULT_TARGET_PROBABILITY,
            seed: None,
        }
    }
}

impl FilterConfig {
    pub fn new(real_size: usize, total_size: usize, target_probability: f64) -> Self {
        Self {
            real_size,
            total_size,
            target_probability,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the parameters without allocating a filter
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self.real_size, self.total_size, self.target_probability)
    }

    /// Fraction of the logical space backed by the bitmap
    pub fn eligible_fraction(&self) -> f64 {
        self.real_size as f64 / self.total_size as f64
    }

    /// Build a filter using the default generator
    pub fn build(&self) -> Result<AdaptiveSamplingFilter<Xorshift64>, ConfigError> {
        match self.seed {
            Some(seed) => AdaptiveSamplingFilter::with_seed(
                self.real_size,
                self.total_size,
                self.target_probability,
                seed,
            ),
            None => {
                AdaptiveSamplingFilter::new(self.real_size, self.total_size, self.target_probability)
            }
        }
    }

    /// Build a filter drawing from `rng`; the configured seed is ignored
    pub fn build_with_rng<R: RngCore>(
        &self,
        rng: R,
    ) -> Result<AdaptiveSamplingFilter<R>, ConfigError> {
        AdaptiveSamplingFilter::with_rng(
            self.real_size,
            self.total_size,
            self.target_probability,
            rng,
        )
    }
}

pub(crate) fn validate(
    real_size: usize,
    total_size: usize,
    target_probability: f64,
) -> Result<(), ConfigError> {
    if real_size == 0 {
        return Err(ConfigError::ZeroRealSize);
    }
    if total_size < real_size {
        return Err(ConfigError::TotalSmallerThanReal {
            real_size,
            total_size,
        });
    }
    // Negated so NaN is rejected
    if !(target_probability > 0.0 && target_probability <= 1.0) {
        return Err(ConfigError::ProbabilityOutOfRange {
            probability: target_probability,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.real_size, 1_000_000);
        assert_eq!(config.total_size, 1_500_000);
        assert_eq!(config.target_probability, 0.01);
        assert!(config.validate().is_ok());
        assert!((config.eligible_fraction() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_validation() {
        assert_eq!(validate(0, 10, 0.5), Err(ConfigError::ZeroRealSize));
        assert_eq!(
            validate(10, 9, 0.5),
            Err(ConfigError::TotalSmallerThanReal {
                real_size: 10,
                total_size: 9
            })
        );
        assert!(validate(10, 10, 0.0).is_err());
        assert!(validate(10, 10, -0.1).is_err());
        assert!(validate(10, 10, 1.0001).is_err());
        assert!(validate(10, 10, f64::NAN).is_err());
        assert!(validate(10, 10, 1.0).is_ok());
        assert!(validate(1, 1, f64::MIN_POSITIVE).is_ok());
    }

    #[test]
    fn test_build_seeded() {
        let a = FilterConfig::new(100, 200, 0.5).with_seed(3).build().unwrap();
        assert_eq!(a.config().seed, Some(3));
        assert_eq!(a.total_size(), 200);
    }

    #[test]
    fn test_build_rejects_invalid() {
        let err = FilterConfig::new(100, 50, 0.5).build().unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let config: FilterConfig =
            serde_json::from_str(r#"{"real_size": 10, "target_probability": 0.5}"#).unwrap();
        assert_eq!(config.real_size, 10);
        assert_eq!(config.total_size, DEFAULT_TOTAL_SIZE);
        assert_eq!(config.seed, None);
    }
}
