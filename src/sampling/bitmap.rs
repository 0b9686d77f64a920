//! Word-packed bit array backing the real part of the filter

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Fixed-length bitmap that tracks how many of its bits are still clear
///
/// Bits can only go from clear to set; [`Bitmap::clear`] is the only way back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Bitmap {
    words: Vec<u64>,
    len: usize,
    zeros: usize,
}

impl Bitmap {
    /// Create a bitmap of `len` clear bits
    pub(crate) fn new(len: usize) -> Self {
        let num_words = (len + 63) / 64;
        Self {
            words: vec![0u64; num_words],
            len,
            zeros: len,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Number of bits still clear
    #[inline]
    pub(crate) fn zeros(&self) -> usize {
        self.zeros
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        (self.words[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Set bit `idx`, returning `true` if it was previously clear
    #[inline]
    pub(crate) fn set(&mut self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        let word = &mut self.words[idx / 64];
        let mask = 1u64 << (idx % 64);
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.zeros -= 1;
        true
    }

    pub(crate) fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
        self.zeros = self.len;
    }

    /// Count set bits by scanning the words
    #[cfg(test)]
    pub(crate) fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub(crate) fn size_bytes(&self) -> usize {
        self.words.len() * 8
    }
}
