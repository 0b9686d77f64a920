//! Adaptive duplicate-suppressing sampling filter
//!
//! The logical hash space `[0, total_size)` is split into a tracked *real*
//! part `[0, real_size)`, backed by a bitmap, and an untracked *virtual* part.
//! Only items whose bucket lies in the real part can ever be sampled, and only
//! on the first hit of that bucket in the current lifetime.
//!
//! Each first hit is sampled with probability
//!
//! ```text
//! p' = real_size * p / zero_count
//! ```
//!
//! where `zero_count` is the number of buckets still unset after the hit. As the
//! bitmap fills, `p'` rises to compensate for the shrinking pool of unseen
//! buckets, so the expected number of sampled distinct items stays
//! proportional to `real_size * p` whatever the stream looks like. Values of
//! `p'` at or above 1 always sample. The hit that sets the last free bucket
//! leaves `zero_count == 0`; the real part is then full and that hit is
//! sampled without a draw.

use rand::{Rng, RngCore};

use super::bitmap::Bitmap;
use super::config::{validate, FilterConfig};
use super::key::{reduce, ItemKey};
use super::outcome::{Decision, FilterStats, Outcome};
use super::rng::Xorshift64;
use crate::traits::{ConfigError, SamplingSketch, Sketch};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Counters {
    processed: u64,
    virtual_hits: u64,
    duplicates: u64,
    first_hits: u64,
    sampled: u64,
}

/// Adaptive sampling filter over a stream of item identifiers
///
/// # Example
///
/// ```
/// use flowsample::sampling::{AdaptiveSamplingFilter, Decision, FlowKey};
///
/// let mut filter = AdaptiveSamplingFilter::with_seed(1000, 1500, 0.1, 42).unwrap();
///
/// let flow = FlowKey::new("10.0.0.1", "10.0.0.2");
/// let _first = filter.process(&flow);
///
/// // Repeats of an item never sample again within one lifetime
/// assert_eq!(filter.process(&flow), Decision::NotSampled);
///
/// // Start a new sampling period
/// filter.reset();
/// assert_eq!(filter.zero_count(), 1000);
/// ```
#[derive(Clone, Debug)]
pub struct AdaptiveSamplingFilter<R = Xorshift64> {
    /// Real part of the logical space
    bitmap: Bitmap,
    /// Size of the logical space (real + virtual)
    total_size: usize,
    /// Target sampling probability
    target_probability: f64,
    /// Seed of the default generator, when one was given
    seed: Option<u64>,
    /// Uniform source for sampling draws
    rng: R,
    counters: Counters,
}

impl AdaptiveSamplingFilter<Xorshift64> {
    /// Create a filter using the default generator with its default seed
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `real_size` is 0, `total_size < real_size`,
    /// or `target_probability` is not in (0, 1].
    pub fn new(
        real_size: usize,
        total_size: usize,
        target_probability: f64,
    ) -> Result<Self, ConfigError> {
        Self::from_parts(
            real_size,
            total_size,
            target_probability,
            None,
            Xorshift64::default(),
        )
    }

    /// Create a filter using the default generator seeded with `seed`
    pub fn with_seed(
        real_size: usize,
        total_size: usize,
        target_probability: f64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::from_parts(
            real_size,
            total_size,
            target_probability,
            Some(seed),
            Xorshift64::new(seed),
        )
    }
}

impl<R: RngCore> AdaptiveSamplingFilter<R> {
    /// Create a filter drawing its sampling decisions from `rng`
    pub fn with_rng(
        real_size: usize,
        total_size: usize,
        target_probability: f64,
        rng: R,
    ) -> Result<Self, ConfigError> {
        Self::from_parts(real_size, total_size, target_probability, None, rng)
    }

    fn from_parts(
        real_size: usize,
        total_size: usize,
        target_probability: f64,
        seed: Option<u64>,
        rng: R,
    ) -> Result<Self, ConfigError> {
        validate(real_size, total_size, target_probability)?;

        tracing::debug!(
            real_size,
            total_size,
            target_probability,
            "created adaptive sampling filter"
        );

        Ok(Self {
            bitmap: Bitmap::new(real_size),
            total_size,
            target_probability,
            seed,
            rng,
            counters: Counters::default(),
        })
    }

    /// Bucket of `item` in `[0, total_size)`
    #[inline]
    pub fn bucket<K: ItemKey + ?Sized>(&self, item: &K) -> usize {
        reduce(item.key_hash(), self.total_size)
    }

    /// Process one item and return whether it is sampled
    #[inline]
    pub fn process<K: ItemKey + ?Sized>(&mut self, item: &K) -> Decision {
        self.process_outcome(item).decision()
    }

    /// Process one item and return the detailed verdict
    pub fn process_outcome<K: ItemKey + ?Sized>(&mut self, item: &K) -> Outcome {
        let bucket = self.bucket(item);
        self.counters.processed += 1;

        if bucket >= self.bitmap.len() {
            self.counters.virtual_hits += 1;
            tracing::trace!(bucket, "virtual hit");
            return Outcome::Virtual { bucket };
        }

        if !self.bitmap.set(bucket) {
            self.counters.duplicates += 1;
            tracing::trace!(bucket, "duplicate");
            return Outcome::Duplicate { bucket };
        }
        self.counters.first_hits += 1;

        let zero_count = self.bitmap.zeros();
        let (adjusted_probability, decision) = if zero_count == 0 {
            // Real part is now full
            (f64::INFINITY, Decision::Sampled)
        } else {
            let p = self.bitmap.len() as f64 * self.target_probability / zero_count as f64;
            let r: f64 = self.rng.gen();
            (p, Decision::from(r < p))
        };

        if decision.is_sampled() {
            self.counters.sampled += 1;
        }
        tracing::trace!(bucket, adjusted_probability, %decision, "first-time hit");

        Outcome::FirstHit {
            bucket,
            adjusted_probability,
            decision,
        }
    }
}

impl<R> AdaptiveSamplingFilter<R> {
    /// Clear the bitmap and counters to start a new sampling period
    ///
    /// The configuration is kept and the generator continues its stream.
    pub fn reset(&mut self) {
        tracing::debug!(
            first_hits = self.counters.first_hits,
            sampled = self.counters.sampled,
            "resetting adaptive sampling filter"
        );
        self.bitmap.clear();
        self.counters = Counters::default();
    }

    /// Number of tracked buckets
    #[inline]
    pub fn real_size(&self) -> usize {
        self.bitmap.len()
    }

    /// Size of the full logical hash space
    #[inline]
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    #[inline]
    pub fn target_probability(&self) -> f64 {
        self.target_probability
    }

    /// Buckets of the real part still unset
    #[inline]
    pub fn zero_count(&self) -> usize {
        self.bitmap.zeros()
    }

    /// Whether `bucket` has had its first hit this lifetime
    ///
    /// Buckets outside the real part are never set.
    pub fn is_bucket_set(&self, bucket: usize) -> bool {
        bucket < self.bitmap.len() && self.bitmap.get(bucket)
    }

    /// Fraction of the real part already set
    pub fn fill_ratio(&self) -> f64 {
        (self.real_size() - self.zero_count()) as f64 / self.real_size() as f64
    }

    /// Fraction of the logical space that is eligible for sampling
    pub fn eligible_fraction(&self) -> f64 {
        self.real_size() as f64 / self.total_size as f64
    }

    /// Probability the next first-time hit would be sampled with
    pub fn current_probability(&self) -> f64 {
        match self.zero_count() {
            0 | 1 => f64::INFINITY,
            zeros => self.real_size() as f64 * self.target_probability / (zeros - 1) as f64,
        }
    }

    /// Snapshot of the counters for the current lifetime
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            processed: self.counters.processed,
            virtual_hits: self.counters.virtual_hits,
            duplicates: self.counters.duplicates,
            first_hits: self.counters.first_hits,
            sampled: self.counters.sampled,
            zero_count: self.zero_count(),
            real_size: self.real_size(),
        }
    }

    /// Parameters this filter was built with
    pub fn config(&self) -> FilterConfig {
        FilterConfig {
            real_size: self.real_size(),
            total_size: self.total_size,
            target_probability: self.target_probability,
            seed: self.seed,
        }
    }

    /// Borrow the generator
    pub fn rng(&self) -> &R {
        &self.rng
    }
}

impl<R: RngCore + Clone + core::fmt::Debug> Sketch for AdaptiveSamplingFilter<R> {
    type Item = [u8];

    fn update(&mut self, item: &Self::Item) {
        self.process(item);
    }

    fn clear(&mut self) {
        self.reset();
    }

    fn size_bytes(&self) -> usize {
        self.bitmap.size_bytes() + core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        self.counters.processed
    }
}

impl<R: RngCore + Clone + core::fmt::Debug> SamplingSketch for AdaptiveSamplingFilter<R> {
    fn process(&mut self, item: &Self::Item) -> Decision {
        AdaptiveSamplingFilter::process(self, item)
    }

    fn target_probability(&self) -> f64 {
        self.target_probability
    }

    fn fill_ratio(&self) -> f64 {
        AdaptiveSamplingFilter::fill_ratio(self)
    }
}
