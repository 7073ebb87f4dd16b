//! Content equality between sets.

use std::hash::BuildHasher;

use crate::BlobSet;

impl<S> BlobSet<S> {
    /// Whether both sets hold exactly the same keys, byte for byte.
    ///
    /// Order-independent. Bails out on a length mismatch or on the first
    /// key of `self` missing from `other`.
    pub fn compare<T: BuildHasher>(&self, other: &BlobSet<T>) -> bool {
        if self.len != other.len {
            return false;
        }
        self.iter().all(|key| other.contains(key))
    }

    /// Whether every key of `self` is also in `other`.
    pub fn is_subset<T: BuildHasher>(&self, other: &BlobSet<T>) -> bool {
        self.len <= other.len && self.iter().all(|key| other.contains(key))
    }
}

impl<S, T: BuildHasher> PartialEq<BlobSet<T>> for BlobSet<S> {
    fn eq(&self, other: &BlobSet<T>) -> bool {
        self.compare(other)
    }
}

impl<S: BuildHasher> Eq for BlobSet<S> {}
