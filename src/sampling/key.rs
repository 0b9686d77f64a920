//! Item identifiers and bucket assignment
//!
//! Every item is reduced to a canonical byte string, hashed with XXH3-64
//! (seed 0) and mapped into the logical space with `hash % total_size`.
//! The algorithm is fixed so bucket assignment is reproducible across runs,
//! processes and platforms.
//!
//! Callers plug in their own identifiers by implementing [`ItemKey`]. Keys made
//! of several fields stream each field into the hasher instead of building a
//! joined string, so no allocation happens on the hot path.

use xxhash_rust::xxh3::{xxh3_64, Xxh3};

#[cfg(feature = "std")]
use std::{string::String, vec::Vec};

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// Byte placed between the two fields of a [`FlowKey`]
///
/// ASCII unit separator: it has no printable form and does not occur in
/// addresses, hostnames or other textual field values, so two different field
/// pairs never share a canonical encoding.
pub const FIELD_DELIMITER: u8 = 0x1F;

/// Map raw canonical bytes to a bucket in `[0, total_size)`
///
/// # Panics
///
/// Panics if `total_size` is zero.
#[inline]
pub fn bucket_of(bytes: &[u8], total_size: usize) -> usize {
    reduce(xxh3_64(bytes), total_size)
}

#[inline]
pub(crate) fn reduce(hash: u64, total_size: usize) -> usize {
    (hash % total_size as u64) as usize
}

/// An identifier the filter can hash
///
/// Implementations feed their canonical byte encoding into the hasher. Two
/// keys that feed the same bytes are the same item as far as the filter is
/// concerned.
pub trait ItemKey {
    /// Stream the canonical encoding of this key into `hasher`
    fn write_key(&self, hasher: &mut Xxh3);

    /// XXH3-64 of the canonical encoding
    fn key_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        self.write_key(&mut hasher);
        hasher.digest()
    }
}

impl ItemKey for [u8] {
    #[inline]
    fn write_key(&self, hasher: &mut Xxh3) {
        hasher.update(self);
    }

    #[inline]
    fn key_hash(&self) -> u64 {
        xxh3_64(self)
    }
}

impl<const N: usize> ItemKey for [u8; N] {
    #[inline]
    fn write_key(&self, hasher: &mut Xxh3) {
        hasher.update(self);
    }

    #[inline]
    fn key_hash(&self) -> u64 {
        xxh3_64(self)
    }
}

impl ItemKey for Vec<u8> {
    #[inline]
    fn write_key(&self, hasher: &mut Xxh3) {
        self.as_slice().write_key(hasher)
    }

    #[inline]
    fn key_hash(&self) -> u64 {
        self.as_slice().key_hash()
    }
}

impl ItemKey for str {
    #[inline]
    fn write_key(&self, hasher: &mut Xxh3) {
        self.as_bytes().write_key(hasher)
    }

    #[inline]
    fn key_hash(&self) -> u64 {
        self.as_bytes().key_hash()
    }
}

impl ItemKey for String {
    #[inline]
    fn write_key(&self, hasher: &mut Xxh3) {
        self.as_str().write_key(hasher)
    }

    #[inline]
    fn key_hash(&self) -> u64 {
        self.as_str().key_hash()
    }
}

impl<T: ItemKey + ?Sized> ItemKey for &T {
    #[inline]
    fn write_key(&self, hasher: &mut Xxh3) {
        (**self).write_key(hasher)
    }

    #[inline]
    fn key_hash(&self) -> u64 {
        (**self).key_hash()
    }
}

/// Source/destination pair identifying a flow
///
/// Canonical encoding: `source`, [`FIELD_DELIMITER`], `destination`.
///
/// # Example
///
/// ```
/// use flowsample::sampling::{FlowKey, ItemKey};
///
/// let flow = FlowKey::new("10.0.0.1", "192.168.1.7");
/// assert_eq!(flow.key_hash(), flow.canonical().key_hash());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlowKey<'a> {
    /// Source field, e.g. a source address
    pub source: &'a str,
    /// Destination field, e.g. a destination address
    pub destination: &'a str,
}

impl<'a> FlowKey<'a> {
    pub fn new(source: &'a str, destination: &'a str) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// The joined byte string this key hashes as
    pub fn canonical(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.source.len() + 1 + self.destination.len());
        bytes.extend_from_slice(self.source.as_bytes());
        bytes.push(FIELD_DELIMITER);
        bytes.extend_from_slice(self.destination.as_bytes());
        bytes
    }
}

impl ItemKey for FlowKey<'_> {
    fn write_key(&self, hasher: &mut Xxh3) {
        hasher.update(self.source.as_bytes());
        hasher.update(&[FIELD_DELIMITER]);
        hasher.update(self.destination.as_bytes());
    }
}
