//! Pull-style traversal.
//!
//! [`View`] borrows the set, so the borrow checker rules out mutation for as
//! long as it lives. [`Cursor`] is detached: it remembers a slot index and
//! the table generation it was derived at, and every use checks that
//! generation so a cursor outliving a rebuild fails with
//! [`SetError::StaleCursor`] instead of reading relocated slots.

use std::iter::FusedIterator;

use tracing::trace;

use crate::table::{next_live, Slot};
use crate::{BlobSet, SetError};

/// Borrowing cursor over the live keys of a set, in table order.
#[derive(Clone)]
pub struct View<'a> {
    slots: &'a [Slot],
    index: usize,
    verbose: bool,
}

impl<'a> View<'a> {
    fn new(slots: &'a [Slot], verbose: bool) -> Self {
        let index = next_live(slots, 0);
        if verbose {
            trace!(index, capacity = slots.len(), "view begin");
        }
        Self {
            slots,
            index,
            verbose,
        }
    }

    /// Whether the view is positioned on a key.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.index < self.slots.len()
    }

    /// Current key, or `None` once past the last one.
    #[inline]
    pub fn key(&self) -> Option<&'a [u8]> {
        self.slots.get(self.index).and_then(Slot::key)
    }

    #[inline]
    pub fn key_len(&self) -> Option<usize> {
        self.key().map(<[u8]>::len)
    }

    /// Slot index of the current key.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the next key. A no-op once past the last one.
    pub fn advance(&mut self) {
        if !self.is_valid() {
            return;
        }
        let from = self.index;
        self.index = next_live(self.slots, from + 1);
        if self.verbose {
            trace!(from, to = self.index, "view advance");
        }
    }
}

impl<'a> Iterator for View<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.key()?;
        self.advance();
        Some(key)
    }
}

impl FusedIterator for View<'_> {}

/// Iterator over the keys of a set. Created by [`BlobSet::iter`].
#[derive(Clone)]
pub struct Iter<'a> {
    view: View<'a>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.view.next()?;
        self.remaining -= 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// Detached cursor over the live keys of a set.
///
/// Holds no borrow; pass the set to each call. Removing keys without a
/// rebuild (see [`BlobSet::remove_at`]) leaves the cursor usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    generation: u64,
}

impl Cursor {
    fn check<S>(&self, set: &BlobSet<S>) -> Result<(), SetError> {
        if self.generation != set.generation {
            return Err(SetError::StaleCursor {
                cursor: self.generation,
                table: set.generation,
            });
        }
        Ok(())
    }

    /// Whether the set has not been rebuilt since this cursor was derived.
    pub fn is_current<S>(&self, set: &BlobSet<S>) -> bool {
        self.check(set).is_ok()
    }

    /// Whether the cursor is current and positioned on a live key.
    pub fn is_valid<S>(&self, set: &BlobSet<S>) -> bool {
        self.is_current(set) && set.slots.get(self.index).is_some_and(Slot::is_occupied)
    }

    /// Whether the cursor has run past the last slot.
    pub fn is_done<S>(&self, set: &BlobSet<S>) -> bool {
        self.index >= set.slots.len()
    }

    /// Current key. `Ok(None)` if past the end or the key was removed
    /// through [`BlobSet::remove_at`].
    pub fn key<'a, S>(&self, set: &'a BlobSet<S>) -> Result<Option<&'a [u8]>, SetError> {
        self.check(set)?;
        Ok(set.slots.get(self.index).and_then(Slot::key))
    }

    /// Length in bytes of the current key, with the same `Ok(None)` cases as
    /// [`key`](Self::key).
    pub fn key_len<S>(&self, set: &BlobSet<S>) -> Result<Option<usize>, SetError> {
        Ok(self.key(set)?.map(<[u8]>::len))
    }

    /// Move to the next live key.
    pub fn advance<S>(&mut self, set: &BlobSet<S>) -> Result<(), SetError> {
        self.check(set)?;
        if self.index < set.slots.len() {
            let from = self.index;
            self.index = next_live(&set.slots, from + 1);
            if set.verbose {
                trace!(from, to = self.index, generation = self.generation, "cursor advance");
            }
        }
        Ok(())
    }
}

impl<S> BlobSet<S> {
    /// Borrowing cursor positioned on the first key.
    pub fn view(&self) -> View<'_> {
        View::new(&self.slots, self.verbose)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            view: self.view(),
            remaining: self.len,
        }
    }

    /// Detached cursor positioned on the first key.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            index: next_live(&self.slots, 0),
            generation: self.generation,
        }
    }

    /// Remove the key under `cursor`. Never rebuilds, so `cursor` (and any
    /// other cursor of this generation) stays current; owed compaction
    /// happens on a later `add` or `remove`.
    ///
    /// Returns `false` if the cursor was past the end or its key was
    /// already removed.
    pub fn remove_at(&mut self, cursor: &Cursor) -> Result<bool, SetError> {
        cursor.check(self)?;
        match self.slots.get(cursor.index) {
            Some(slot) if slot.is_occupied() => {
                self.tombstone_at(cursor.index);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl<'a, S> IntoIterator for &'a BlobSet<S> {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
