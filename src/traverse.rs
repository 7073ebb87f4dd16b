//! Push-style traversal with in-loop removal.

use crate::table::Slot;
use crate::BlobSet;

/// What [`BlobSet::each`] does after visiting a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetAction {
    /// Keep the key and move on.
    Next,
    /// Remove the key and move on.
    Remove,
    /// Remove the key and stop.
    RemoveBreak,
    /// Keep the key and stop.
    Break,
}

impl<S> BlobSet<S> {
    /// Visit every key in table order, letting `visit` decide whether each
    /// one stays. Returns the number of keys removed.
    ///
    /// Removal turns the slot into a tombstone in place, so no key is
    /// skipped or visited twice. Compaction owed to those removals runs after
    /// the traversal finishes.
    pub fn each<F>(&mut self, mut visit: F) -> usize
    where
        F: FnMut(&[u8]) -> SetAction,
    {
        let mut removed = 0;
        for idx in 0..self.slots.len() {
            let action = match &self.slots[idx] {
                Slot::Occupied { key, .. } => visit(&key[..]),
                _ => continue,
            };
            match action {
                SetAction::Next => {}
                SetAction::Break => break,
                SetAction::Remove => {
                    self.tombstone_at(idx);
                    removed += 1;
                }
                SetAction::RemoveBreak => {
                    self.tombstone_at(idx);
                    removed += 1;
                    break;
                }
            }
        }
        if removed > 0 {
            self.maybe_compact();
        }
        removed
    }

    /// Keep only the keys for which `keep` returns `true`. Returns the
    /// number of keys removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[u8]) -> bool,
    {
        self.each(|key| {
            if keep(key) {
                SetAction::Next
            } else {
                SetAction::Remove
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{int, Collide};
    use std::collections::BTreeSet;

    #[test]
    fn test_each_visits_every_key_once() {
        let nums = [1u32, 3, 5, 7, 11, 13, 15];
        let mut s = BlobSet::new();
        for n in nums {
            s.add(&int(n));
        }

        let mut seen = Vec::new();
        let removed = s.each(|key| {
            seen.push(u32::from_le_bytes(key.try_into().unwrap()));
            SetAction::Next
        });
        assert_eq!(removed, 0);
        seen.sort_unstable();
        assert_eq!(seen, nums);
        assert_eq!(s.len(), nums.len());
    }

    #[test]
    fn test_each_remove_all_drains() {
        let mut s = BlobSet::new();
        for i in 0..500u32 {
            s.add(&int(i));
        }

        let mut visited = BTreeSet::new();
        let removed = s.each(|key| {
            assert!(visited.insert(key.to_vec()), "visited twice");
            SetAction::Remove
        });
        assert_eq!(removed, 500);
        assert_eq!(visited.len(), 500);
        assert!(s.is_empty());
        for i in 0..500u32 {
            assert!(!s.contains(&int(i)));
        }
        assert!(s.verify().is_empty(), "{:?}", s.verify());
    }

    #[test]
    fn test_each_remove_break_removes_one() {
        let mut s = BlobSet::new();
        for i in [1u32, 3, 4, 5, 6, 7, 8, 9, 10, 11, 20, 23, 24] {
            s.add(&int(i));
        }

        for target in [1u32, 20, 24, 7, 8, 9] {
            let mut found = false;
            let removed = s.each(|key| {
                if key == &int(target)[..] {
                    found = true;
                    SetAction::RemoveBreak
                } else {
                    SetAction::Next
                }
            });
            assert!(found, "{target} not visited");
            assert_eq!(removed, 1);
            assert!(!s.contains(&int(target)));
        }
        assert_eq!(s.len(), 7);
    }

    #[test]
    fn test_each_break_keeps_key() {
        let mut s = BlobSet::new();
        for i in 0..10u32 {
            s.add(&int(i));
        }
        let mut visits = 0;
        let removed = s.each(|_| {
            visits += 1;
            SetAction::Break
        });
        assert_eq!(visits, 1);
        assert_eq!(removed, 0);
        assert_eq!(s.len(), 10);
    }

    #[test]
    fn test_each_removal_on_shared_chain() {
        // Removing mid-chain while walking it must not hide later keys.
        let mut s = BlobSet::with_hasher(Collide);
        for i in 0..6u32 {
            s.add(&int(i));
        }
        let mut seen = Vec::new();
        s.each(|key| {
            let n = u32::from_le_bytes(key.try_into().unwrap());
            seen.push(n);
            if n % 2 == 0 {
                SetAction::Remove
            } else {
                SetAction::Next
            }
        });
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(s.len(), 3);
        for i in [1u32, 3, 5] {
            assert!(s.contains(&int(i)));
        }
        assert!(s.verify().is_empty(), "{:?}", s.verify());
    }

    #[test]
    fn test_each_compacts_after_traversal() {
        let mut s = BlobSet::new();
        for i in 0..100u32 {
            s.add(&int(i));
        }
        let generation = s.generation();
        s.each(|_| SetAction::Remove);
        // Tombstone budget exceeded: compacted once, after the loop.
        assert_eq!(s.generation(), generation + 1);
        assert_eq!(s.tombstones(), 0);
    }

    #[test]
    fn test_retain() {
        let mut s = BlobSet::new();
        for i in 0..50u32 {
            s.add(&int(i));
        }
        let removed = s.retain(|key| key[0] % 5 == 0);
        assert_eq!(removed, 40);
        assert_eq!(s.len(), 10);
        assert!(s.contains(&int(45)));
        assert!(!s.contains(&int(44)));
    }
}
