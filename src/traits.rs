//! Core traits and error types
//!
//! Filters implement the base [`Sketch`] trait; [`SamplingSketch`] adds the
//! per-item sampling verdict.

use core::fmt::Debug;

use crate::sampling::Decision;

/// Error raised when a filter is constructed with invalid parameters
///
/// Every variant is an invalid-configuration failure; no filter is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The real part must hold at least one bucket
    ZeroRealSize,
    /// The logical space cannot be smaller than the real part
    TotalSmallerThanReal {
        real_size: usize,
        total_size: usize,
    },
    /// Target probability must lie in (0, 1]
    ProbabilityOutOfRange { probability: f64 },
}

impl ConfigError {
    /// Whether this error belongs to the invalid-configuration kind
    pub fn is_invalid_config(&self) -> bool {
        matches!(
            self,
            ConfigError::ZeroRealSize
                | ConfigError::TotalSmallerThanReal { .. }
                | ConfigError::ProbabilityOutOfRange { .. }
        )
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroRealSize => write!(f, "invalid config: real size must be positive"),
            ConfigError::TotalSmallerThanReal {
                real_size,
                total_size,
            } => write!(
                f,
                "invalid config: total size {} is smaller than real size {}",
                total_size, real_size
            ),
            ConfigError::ProbabilityOutOfRange { probability } => write!(
                f,
                "invalid config: target probability {} not in (0, 1]",
                probability
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Core trait for all streaming sketches
pub trait Sketch: Clone + Debug {
    /// The type of item this sketch processes
    type Item: ?Sized;

    /// Feed an item to the sketch
    fn update(&mut self, item: &Self::Item);

    /// Reset sketch to empty state
    fn clear(&mut self);

    /// Memory usage in bytes
    fn size_bytes(&self) -> usize;

    /// Number of items processed
    fn count(&self) -> u64;

    /// Check if sketch is empty
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Sketches that decide per item whether to keep it
pub trait SamplingSketch: Sketch {
    /// Process an item and return the sampling verdict
    fn process(&mut self, item: &Self::Item) -> Decision;

    /// Long-run fraction of admitted distinct items that should be sampled
    fn target_probability(&self) -> f64;

    /// Fraction of tracked state already in use (0.0 to 1.0)
    fn fill_ratio(&self) -> f64;
}
