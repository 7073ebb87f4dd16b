//! Error type for fallible set operations.

use std::collections::TryReserveError;

use thiserror::Error;

/// An error returned by a fallible [`BlobSet`](crate::BlobSet) operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SetError {
    /// The slot array could not be allocated while rebuilding the table.
    ///
    /// The set is left exactly as it was before the call.
    #[error("unable to allocate a table of {slots} slots")]
    SlotAlloc {
        /// Capacity we tried to allocate.
        slots: usize,
        /// Underlying allocator failure.
        #[source]
        source: TryReserveError,
    },

    /// The requested number of slots does not fit in `usize`.
    ///
    /// The set is left exactly as it was before the call.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The owned copy of a key could not be allocated.
    #[error("unable to copy a {len}-byte key")]
    KeyAlloc {
        /// Length of the key that was being inserted.
        len: usize,
        /// Underlying allocator failure.
        #[source]
        source: TryReserveError,
    },

    /// A detached [`Cursor`](crate::Cursor) was used after the table was
    /// rebuilt or cleared.
    #[error("cursor from generation {cursor} used on table at generation {table}")]
    StaleCursor {
        /// Generation the cursor was derived at.
        cursor: u64,
        /// Current generation of the table.
        table: u64,
    },

    /// A [`SetConfig`](crate::SetConfig) value was out of range.
    #[error("invalid set configuration: {0}")]
    InvalidConfig(&'static str),
}
