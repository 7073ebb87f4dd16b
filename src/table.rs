//! Open-addressing slot table with linear probing and tombstones.

use std::hash::BuildHasher;

use tracing::{debug, warn};

use crate::config::{RemovePolicy, SetConfig};
use crate::hash::{fingerprint, BuildFingerprint};
use crate::SetError;

/// One storage cell of the table.
#[derive(Clone)]
pub(crate) enum Slot {
    /// Never used since the last rebuild or clear. Terminates probes.
    Empty,
    /// Held a key that was removed. Probes continue past it.
    Tombstone,
    Occupied {
        /// Cached fingerprint of `key`.
        hash: u64,
        key: Box<[u8]>,
    },
}

impl Slot {
    #[inline]
    pub(crate) fn key(&self) -> Option<&[u8]> {
        match self {
            Slot::Occupied { key, .. } => Some(&key[..]),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }
}

/// Index of the first occupied slot at or after `from`, or `slots.len()`.
#[inline]
pub(crate) fn next_live(slots: &[Slot], from: usize) -> usize {
    slots
        .get(from..)
        .and_then(|rest| rest.iter().position(Slot::is_occupied))
        .map_or(slots.len(), |pos| from + pos)
}

pub(crate) enum Probe {
    /// The key lives in this slot.
    Found(usize),
    /// The key is absent; this is where it would be inserted (the first
    /// tombstone on the chain, else the terminating empty slot).
    Vacant(usize),
    /// Every slot is in use and none matched. Unreachable while the load
    /// limit keeps an empty slot around.
    Full,
}

/// A hash set of opaque byte-string keys.
///
/// Keys are copied on insertion; equality and hashing cover every byte of
/// the key, including embedded zeros. Iteration order is table order, which
/// is unrelated to insertion order.
#[derive(Clone)]
pub struct BlobSet<S = BuildFingerprint> {
    /// Always a power of two, never below `MIN_CAPACITY`.
    pub(crate) slots: Vec<Slot>,
    pub(crate) len: usize,
    pub(crate) tombstones: usize,
    /// Bumped whenever slot positions stop being meaningful (rebuild, clear).
    pub(crate) generation: u64,
    pub(crate) verbose: bool,
    pub(crate) config: SetConfig,
    pub(crate) hasher: S,
}

impl BlobSet<BuildFingerprint> {
    pub fn new() -> Self {
        Self::with_hasher(BuildFingerprint)
    }

    /// Create a set that can hold `capacity` keys without rebuilding.
    ///
    /// # Panics
    ///
    /// Panics if the slot count needed for `capacity` keys overflows `usize`
    /// or cannot be allocated, like [`Vec::with_capacity`].
    pub fn with_capacity(capacity: usize) -> Self {
        let defaults = SetConfig::default();
        let slots = match defaults.capacity_for(capacity) {
            Ok(slots) => slots,
            Err(err) => panic!("BlobSet::with_capacity: {err}"),
        };
        let config = SetConfig {
            initial_capacity: slots,
            ..defaults
        };
        Self::from_parts(config, slots, BuildFingerprint)
    }

    pub fn with_config(config: SetConfig) -> Result<Self, SetError> {
        Self::with_config_and_hasher(config, BuildFingerprint)
    }
}

impl<S> BlobSet<S> {
    pub fn with_hasher(hasher: S) -> Self {
        let config = SetConfig::default();
        let capacity = config.initial_capacity;
        Self::from_parts(config, capacity, hasher)
    }

    pub fn with_config_and_hasher(config: SetConfig, hasher: S) -> Result<Self, SetError> {
        config.validate()?;
        let capacity = config
            .initial_slots()
            .ok_or(SetError::CapacityOverflow)?;
        let slots = alloc_slots(capacity)?;
        Ok(Self {
            slots,
            len: 0,
            tombstones: 0,
            generation: 0,
            verbose: false,
            config,
            hasher,
        })
    }

    /// `capacity` must already be a power of two of at least `MIN_CAPACITY`.
    fn from_parts(config: SetConfig, capacity: usize, hasher: S) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        Self {
            slots,
            len: 0,
            tombstones: 0,
            generation: 0,
            verbose: false,
            config,
            hasher,
        }
    }

    /// Number of keys in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of removed keys whose slots have not been reclaimed yet.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Counter bumped by every rebuild and every `clear`. Cursors derived at
    /// an older generation are stale.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn config(&self) -> &SetConfig {
        &self.config
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Toggle per-step `trace` events from cursors over this set.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Remove every key, keeping the current capacity.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
        self.tombstones = 0;
        self.generation += 1;
    }

    /// Make room for `additional` more keys without a rebuild.
    pub fn reserve(&mut self, additional: usize) -> Result<(), SetError> {
        let capacity = self.slots.len();
        let needed = (self.len + self.tombstones)
            .checked_add(additional)
            .ok_or(SetError::CapacityOverflow)?;
        if needed <= self.config.load_limit(capacity) {
            return Ok(());
        }
        let live = self
            .len
            .checked_add(additional)
            .ok_or(SetError::CapacityOverflow)?;
        let target = self.config.capacity_for(live)?.max(capacity);
        self.rebuild(target)
    }

    /// Rebuild at the smallest capacity that holds the live keys, dropping
    /// all tombstones.
    pub fn shrink_to_fit(&mut self) -> Result<(), SetError> {
        let target = self.config.capacity_for(self.len)?;
        if target == self.slots.len() && self.tombstones == 0 {
            return Ok(());
        }
        self.rebuild(target)
    }

    /// Approximate heap bytes owned by the set.
    pub fn memory_usage(&self) -> usize {
        let keys: usize = self
            .slots
            .iter()
            .filter_map(Slot::key)
            .map(<[u8]>::len)
            .sum();
        self.slots.capacity() * std::mem::size_of::<Slot>() + keys
    }

    /// Turn the occupied slot `idx` into a tombstone. Never moves other
    /// slots, so traversals and cursors stay positioned.
    pub(crate) fn tombstone_at(&mut self, idx: usize) {
        debug_assert!(self.slots[idx].is_occupied());
        self.slots[idx] = Slot::Tombstone;
        self.len -= 1;
        self.tombstones += 1;
    }

    /// Compact in place once tombstones exceed their budget. Best-effort: on
    /// allocation failure the tombstones stay and the table is still valid.
    pub(crate) fn maybe_compact(&mut self) {
        let capacity = self.slots.len();
        if self.tombstones <= self.config.tombstone_limit(capacity) {
            return;
        }
        if let Err(err) = self.rebuild(capacity) {
            warn!(%err, tombstones = self.tombstones, "compaction skipped");
        }
    }

    /// Capacity to rebuild at when inserting would push the used slot count
    /// past the load limit. Mostly-tombstone tables are compacted in place.
    fn grow_target(&self, live: usize) -> Result<usize, SetError> {
        let capacity = self.slots.len();
        if live <= self.config.load_limit(capacity) / 2 {
            return Ok(capacity);
        }
        let doubled = capacity
            .checked_mul(2)
            .ok_or(SetError::CapacityOverflow)?;
        Ok(doubled.max(self.config.capacity_for(live)?))
    }

    /// Reinsert every live key into a fresh table of `capacity` slots.
    ///
    /// Either succeeds completely or leaves the set untouched.
    pub(crate) fn rebuild(&mut self, capacity: usize) -> Result<(), SetError> {
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(self.len <= self.config.load_limit(capacity));

        let mut slots = alloc_slots(capacity)?;
        let mask = capacity - 1;
        let old = std::mem::take(&mut self.slots);
        let from = old.len();
        for slot in old {
            if let Slot::Occupied { hash, key } = slot {
                let mut idx = hash as usize & mask;
                while !matches!(slots[idx], Slot::Empty) {
                    idx = (idx + 1) & mask;
                }
                slots[idx] = Slot::Occupied { hash, key };
            }
        }

        debug!(
            from,
            to = capacity,
            live = self.len,
            tombstones = self.tombstones,
            generation = self.generation + 1,
            "rebuilt table"
        );

        self.slots = slots;
        self.tombstones = 0;
        self.generation += 1;
        Ok(())
    }

    pub(crate) fn probe_hashed(&self, hash: u64, key: &[u8]) -> Probe {
        let mask = self.slots.len() - 1;
        let mut idx = hash as usize & mask;
        let mut first_tombstone = None;
        for _ in 0..self.slots.len() {
            match &self.slots[idx] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(idx);
                }
                Slot::Occupied { hash: h, key: k } => {
                    if *h == hash && **k == *key {
                        return Probe::Found(idx);
                    }
                }
            }
            idx = (idx + 1) & mask;
        }
        match first_tombstone {
            Some(idx) => Probe::Vacant(idx),
            None => Probe::Full,
        }
    }
}

impl<S: BuildHasher> BlobSet<S> {
    #[inline]
    pub(crate) fn probe(&self, key: &[u8]) -> (u64, Probe) {
        let hash = fingerprint(&self.hasher, key);
        (hash, self.probe_hashed(hash, key))
    }

    /// Insert a copy of `key`. Returns `false` if it was already present.
    ///
    /// # Panics
    ///
    /// Panics if the allocator cannot satisfy a table rebuild or the key
    /// copy. Use [`try_add`](Self::try_add) to handle that case.
    pub fn add(&mut self, key: &[u8]) -> bool {
        match self.try_add(key) {
            Ok(added) => added,
            Err(err) => panic!("BlobSet::add: {err}"),
        }
    }

    /// Insert a copy of `key`, reporting allocation failure instead of
    /// panicking. On error the set is unchanged.
    pub fn try_add(&mut self, key: &[u8]) -> Result<bool, SetError> {
        let (hash, probe) = self.probe(key);
        let vacant = match probe {
            Probe::Found(_) => return Ok(false),
            Probe::Vacant(idx) => Some(idx),
            Probe::Full => None,
        };

        // Copy before any rebuild so a failed copy leaves the table as it was.
        let copy = copy_key(key)?;

        // Reusing a tombstone doesn't change the used slot count.
        let idx = match vacant {
            Some(idx)
                if matches!(self.slots[idx], Slot::Tombstone)
                    || self.len + self.tombstones < self.config.load_limit(self.slots.len()) =>
            {
                idx
            }
            _ => {
                let target = self.grow_target(self.len + 1)?;
                self.rebuild(target)?;
                self.vacant_after_rebuild(hash)
            }
        };

        if matches!(self.slots[idx], Slot::Tombstone) {
            self.tombstones -= 1;
        }
        self.slots[idx] = Slot::Occupied { hash, key: copy };
        self.len += 1;
        // Tombstones left by `remove_at` are only reclaimed here.
        self.maybe_compact();
        Ok(true)
    }

    /// Remove `key`. Returns whether it was present.
    ///
    /// # Panics
    ///
    /// Panics if `key` is absent and the set was configured with
    /// [`RemovePolicy::Strict`].
    pub fn remove(&mut self, key: &[u8]) -> bool {
        match self.probe(key).1 {
            Probe::Found(idx) => {
                self.tombstone_at(idx);
                self.maybe_compact();
                true
            }
            Probe::Vacant(_) | Probe::Full => {
                if self.config.remove_policy == RemovePolicy::Strict {
                    panic!("BlobSet::remove: {}-byte key is not in the set", key.len());
                }
                false
            }
        }
    }

    /// Whether `key` is in the set.
    #[inline]
    pub fn contains(&self, key: &[u8]) -> bool {
        matches!(self.probe(key).1, Probe::Found(_))
    }

    /// First empty slot on the chain of `hash`. Only valid on a table that
    /// has no tombstones.
    fn vacant_after_rebuild(&self, hash: u64) -> usize {
        debug_assert_eq!(self.tombstones, 0);
        let mask = self.slots.len() - 1;
        let mut idx = hash as usize & mask;
        while !matches!(self.slots[idx], Slot::Empty) {
            idx = (idx + 1) & mask;
        }
        idx
    }
}

impl Default for BlobSet<BuildFingerprint> {
    fn default() -> Self {
        Self::new()
    }
}


fn alloc_slots(capacity: usize) -> Result<Vec<Slot>, SetError> {
    #[cfg(test)]
    {
        if fault::SLOTS.with(std::cell::Cell::get) {
            return Err(SetError::SlotAlloc {
                slots: capacity,
                source: fault::alloc_error(),
            });
        }
    }
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|source| SetError::SlotAlloc {
            slots: capacity,
            source,
        })?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}

fn copy_key(key: &[u8]) -> Result<Box<[u8]>, SetError> {
    #[cfg(test)]
    {
        if fault::KEYS.with(std::cell::Cell::get) {
            return Err(SetError::KeyAlloc {
                len: key.len(),
                source: fault::alloc_error(),
            });
        }
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(key.len())
        .map_err(|source| SetError::KeyAlloc {
            len: key.len(),
            source,
        })?;
    buf.extend_from_slice(key);
    Ok(buf.into_boxed_slice())
}
