//! Thread-safe sampling filter
//!
//! [`SharedSamplingFilter`] guards an [`AdaptiveSamplingFilter`] with a
//! `parking_lot::Mutex`. Every method takes `&self`, so the filter can be put
//! behind an `Arc` and driven from many threads.
//!
//! Hashing, the virtual and duplicate checks, the bitmap update and the
//! sampling draw all run under one lock acquisition. Two callers can never
//! both see the same bucket unset, so each bucket is admitted at most once per
//! lifetime no matter how calls interleave. `reset` takes the same lock.
//!
//! # Example
//!
//! ```
//! use flowsample::sampling::AdaptiveSamplingFilter;
//! use flowsample::sync::SharedSamplingFilter;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let filter = AdaptiveSamplingFilter::with_seed(1000, 1000, 0.2, 9).unwrap();
//! let shared = Arc::new(SharedSamplingFilter::new(filter));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let shared = Arc::clone(&shared);
//!         thread::spawn(move || {
//!             for i in 0..500 {
//!                 shared.process(&format!("{}-{}", t, i));
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(shared.stats().processed, 2000);
//! ```

use parking_lot::Mutex;
use rand::RngCore;

use crate::sampling::{AdaptiveSamplingFilter, Decision, FilterStats, ItemKey, Outcome, Xorshift64};

/// Mutex-guarded [`AdaptiveSamplingFilter`]
#[derive(Debug)]
pub struct SharedSamplingFilter<R = Xorshift64> {
    inner: Mutex<AdaptiveSamplingFilter<R>>,
}

impl<R: RngCore> SharedSamplingFilter<R> {
    pub fn new(filter: AdaptiveSamplingFilter<R>) -> Self {
        Self {
            inner: Mutex::new(filter),
        }
    }

    /// Process one item atomically with respect to other callers
    pub fn process<K: ItemKey + ?Sized>(&self, item: &K) -> Decision {
        self.inner.lock().process(item)
    }

    /// Process one item and return the detailed verdict
    pub fn process_outcome<K: ItemKey + ?Sized>(&self, item: &K) -> Outcome {
        self.inner.lock().process_outcome(item)
    }

    /// Process a batch under a single lock acquisition
    pub fn process_batch<K: ItemKey>(&self, items: &[K]) -> Vec<Decision> {
        let mut filter = self.inner.lock();
        items.iter().map(|item| filter.process(item)).collect()
    }

    /// Start a new sampling period; waits for in-flight calls
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    pub fn stats(&self) -> FilterStats {
        self.inner.lock().stats()
    }

    pub fn zero_count(&self) -> usize {
        self.inner.lock().zero_count()
    }

    /// Run `f` with exclusive access to the filter
    pub fn with_filter<T>(&self, f: impl FnOnce(&mut AdaptiveSamplingFilter<R>) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn into_inner(self) -> AdaptiveSamplingFilter<R> {
        self.inner.into_inner()
    }
}

impl<R: RngCore> From<AdaptiveSamplingFilter<R>> for SharedSamplingFilter<R> {
    fn from(filter: AdaptiveSamplingFilter<R>) -> Self {
        Self::new(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_send_sync() {
        assert_send_sync::<SharedSamplingFilter>();
    }

    #[test]
    fn test_each_bucket_admitted_once() {
        let filter = AdaptiveSamplingFilter::with_seed(256, 512, 0.5, 11).unwrap();
        let shared = Arc::new(SharedSamplingFilter::new(filter));

        // Every thread feeds the same items, so most calls race on the same buckets
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let mut first_hits = Vec::new();
                    for i in 0..2000 {
                        let outcome = shared.process_outcome(&format!("item_{}", i));
                        if let Outcome::FirstHit { bucket, .. } = outcome {
                            first_hits.push(bucket);
                        }
                    }
                    first_hits
                })
            })
            .collect();

        let mut buckets: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total_hits = buckets.len();
        buckets.sort_unstable();
        buckets.dedup();

        assert_eq!(total_hits, buckets.len(), "a bucket was admitted twice");

        let stats = shared.stats();
        assert_eq!(stats.processed, 16_000);
        assert_eq!(stats.first_hits as usize, total_hits);
        assert_eq!(256 - shared.zero_count(), total_hits);
    }

    #[test]
    fn test_reset_and_into_inner() {
        let filter = AdaptiveSamplingFilter::new(32, 32, 1.0).unwrap();
        let shared = SharedSamplingFilter::from(filter);

        let decisions = shared.process_batch(&["a", "b", "c"]);
        assert_eq!(decisions.len(), 3);
        assert!(shared.zero_count() < 32);

        shared.reset();
        assert_eq!(shared.zero_count(), 32);
        assert_eq!(shared.with_filter(|f| f.stats().processed), 0);

        let inner = shared.into_inner();
        assert_eq!(inner.zero_count(), 32);
    }
}
