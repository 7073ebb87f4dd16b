//! Table configuration.

use crate::SetError;

/// Smallest slot array the table ever allocates.
pub const MIN_CAPACITY: usize = 8;

/// What [`BlobSet::remove`](crate::BlobSet::remove) does with a key that is
/// not in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovePolicy {
    /// Removing an absent key is a no-op.
    #[default]
    Lenient,
    /// Removing an absent key is a caller bug and panics.
    Strict,
}

/// Configuration for a [`BlobSet`](crate::BlobSet).
#[derive(Debug, Clone)]
pub struct SetConfig {
    /// Initial number of slots. Rounded up to a power of two, never below
    /// [`MIN_CAPACITY`].
    pub initial_capacity: usize,
    /// Fraction of slots (live keys plus tombstones) that may be in use
    /// before `add` rebuilds the table.
    pub max_load: f64,
    /// Fraction of slots that may be tombstones before `remove` compacts the
    /// table at its current capacity.
    pub max_tombstone_ratio: f64,
    /// Handling of `remove` on an absent key.
    pub remove_policy: RemovePolicy,
}

impl Default for SetConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            max_load: 0.75,
            max_tombstone_ratio: 0.25,
            remove_policy: RemovePolicy::Lenient,
        }
    }
}

impl SetConfig {
    /// Check that every ratio is in range.
    pub fn validate(&self) -> Result<(), SetError> {
        if !(self.max_load > 0.0 && self.max_load <= 0.95) {
            return Err(SetError::InvalidConfig("max_load must be in (0, 0.95]"));
        }
        if !(self.max_tombstone_ratio > 0.0 && self.max_tombstone_ratio <= self.max_load) {
            return Err(SetError::InvalidConfig(
                "max_tombstone_ratio must be in (0, max_load]",
            ));
        }
        if self.initial_slots().is_none() {
            return Err(SetError::InvalidConfig(
                "initial_capacity cannot be rounded up to a power of two",
            ));
        }
        Ok(())
    }

    /// Slot count for the initial table, or `None` if rounding up overflows.
    pub(crate) fn initial_slots(&self) -> Option<usize> {
        self.initial_capacity
            .max(MIN_CAPACITY)
            .checked_next_power_of_two()
    }

    /// Number of used (live + tombstone) slots a table of `capacity` slots
    /// may hold.
    #[inline]
    pub(crate) fn load_limit(&self, capacity: usize) -> usize {
        // At least one slot always stays empty so every probe terminates.
        ((capacity as f64 * self.max_load) as usize).min(capacity - 1)
    }

    #[inline]
    pub(crate) fn tombstone_limit(&self, capacity: usize) -> usize {
        (capacity as f64 * self.max_tombstone_ratio) as usize
    }

    /// Smallest capacity that holds `live` keys under the load limit.
    pub(crate) fn capacity_for(&self, live: usize) -> Result<usize, SetError> {
        let mut cap = MIN_CAPACITY;
        while self.load_limit(cap) < live {
            cap = cap.checked_mul(2).ok_or(SetError::CapacityOverflow)?;
        }
        Ok(cap)
    }
}
