//! # blobset
//!
//! An open-addressing hash set over opaque byte-string keys.
//!
//! Keys are arbitrary `&[u8]` blobs (packed structs, floats, names with
//! embedded zeros); the set stores its own copy of each key and compares
//! them byte for byte. Removal leaves tombstones so probe chains stay
//! intact, and the table rebuilds itself when live keys or tombstones pass
//! their configured budgets.
//!
//! Two traversal styles are provided: [`BlobSet::each`] pushes every key to
//! a callback that may remove it in place, and [`BlobSet::view`] /
//! [`BlobSet::cursor`] let the caller pull keys one at a time.
//!
//! ## Example
//!
//! ```rust
//! use blobset::{BlobSet, SetAction};
//!
//! let mut set = BlobSet::new();
//! set.add(b"wheel1");
//! set.add(&7u32.to_le_bytes());
//! assert!(set.contains(b"wheel1"));
//! assert_eq!(set.len(), 2);
//!
//! // Remove every 4-byte key while walking the table.
//! let removed = set.each(|key| {
//!     if key.len() == 4 {
//!         SetAction::Remove
//!     } else {
//!         SetAction::Next
//!     }
//! });
//! assert_eq!(removed, 1);
//!
//! let mut view = set.view();
//! while view.is_valid() {
//!     assert_eq!(view.key(), Some(&b"wheel1"[..]));
//!     view.advance();
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
mod compare;
mod cursor;
mod debug;
mod error;
pub mod hash;
mod table;
mod traverse;

pub use config::{RemovePolicy, SetConfig};
pub use cursor::{Cursor, Iter, View};
pub use debug::TableStats;
pub use error::SetError;
pub use hash::{BuildFingerprint, Fingerprint};
pub use table::BlobSet;
pub use traverse::SetAction;

use std::hash::BuildHasher;

impl<K: AsRef<[u8]>> FromIterator<K> for BlobSet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = BlobSet::new();
        set.extend(iter);
        set
    }
}

impl<K: AsRef<[u8]>, S: BuildHasher> Extend<K> for BlobSet<S> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.add(key.as_ref());
        }
    }
}



#[cfg(test)]
mod proptests;
