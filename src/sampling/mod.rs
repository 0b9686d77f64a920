//! Adaptive duplicate-suppressing sampling
//!
//! This module provides [`AdaptiveSamplingFilter`], which decides per item
//! whether to keep it. Repeats of an item within one filter lifetime are never
//! sampled again, and the sampling rate of newly seen items adapts so the
//! overall fraction of distinct items sampled tracks a target probability.
//!
//! # Example
//!
//! ```
//! use flowsample::sampling::{AdaptiveSamplingFilter, FlowKey};
//!
//! let mut filter = AdaptiveSamplingFilter::with_seed(10_000, 15_000, 0.05, 1).unwrap();
//!
//! let mut sampled = 0;
//! for i in 0..50_000 {
//!     let src = format!("10.0.{}.{}", i / 256 % 256, i % 256);
//!     if filter.process(&FlowKey::new(&src, "192.168.0.1")).is_sampled() {
//!         sampled += 1;
//!     }
//! }
//! assert!(sampled > 0);
//! ```

mod bitmap;
mod config;
mod filter;
mod key;
mod outcome;
mod rng;

pub use config::{
    FilterConfig, DEFAULT_REAL_SIZE, DEFAULT_TARGET_PROBABILITY, DEFAULT_TOTAL_SIZE,
};
pub use filter::AdaptiveSamplingFilter;
pub use key::{bucket_of, FlowKey, ItemKey, FIELD_DELIMITER};
pub use outcome::{Decision, FilterStats, Outcome};
pub use rng::{Xorshift64, DEFAULT_SEED};
