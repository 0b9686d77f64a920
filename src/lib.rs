//! # Flowsample
//!
//! Adaptive, duplicate-suppressing sampling of item streams.
//!
//! [`AdaptiveSamplingFilter`] decides per item (for example a flow record
//! identified by its source/destination pair) whether to keep it:
//!
//! - repeats of an item within one filter lifetime are never sampled again,
//! - only items hashing into the tracked part of the hash space are eligible,
//! - the rate for newly seen items rises as the bitmap fills, so the expected
//!   number of sampled distinct items stays proportional to the target
//!   probability however many distinct items have already gone by.
//!
//! ## Quick Start
//!
//! ```rust
//! use flowsample::prelude::*;
//!
//! let mut filter = AdaptiveSamplingFilter::with_seed(1_000, 1_500, 0.1, 7).unwrap();
//!
//! for (src, dst) in [("a", "b"), ("c", "d"), ("a", "b")] {
//!     let decision = filter.process(&FlowKey::new(src, dst));
//!     println!("{}\t{}\t{}", src, dst, decision);
//! }
//!
//! // The repeated flow was rejected as a duplicate
//! assert!(filter.stats().duplicates + filter.stats().virtual_hits >= 1);
//! ```
//!
//! ## Hashing
//!
//! Items are hashed with XXH3-64 over their canonical byte encoding and reduced
//! modulo the logical space size, so bucket assignment is stable across runs
//! and platforms. See [`sampling::ItemKey`] for plugging in other identifiers.
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `concurrent` (default): [`sync::SharedSamplingFilter`] for multi-threaded callers
//! - `driver` (default): line-oriented record driver
//! - `serde`: Serialization of configs, verdicts and stats
//! - `cli`: the `flowsample` binary
//! - `full`: Everything above

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Core traits always available
pub mod traits;

pub mod sampling;

#[cfg(feature = "concurrent")]
#[cfg_attr(docsrs, doc(cfg(feature = "concurrent")))]
pub mod sync;

#[cfg(feature = "driver")]
#[cfg_attr(docsrs, doc(cfg(feature = "driver")))]
pub mod driver;

pub mod prelude {
    pub use crate::traits::*;

    pub use crate::sampling::{
        AdaptiveSamplingFilter, Decision, FilterConfig, FilterStats, FlowKey, ItemKey, Outcome,
    };

    #[cfg(feature = "concurrent")]
    pub use crate::sync::SharedSamplingFilter;
}

pub use sampling::{AdaptiveSamplingFilter, Decision, FilterConfig, FlowKey};
pub use traits::ConfigError;
