//! Debug utilities: slot dumps, probe statistics and integrity checks.

use std::fmt::{self, Write as _};
use std::hash::BuildHasher;

use crate::config::MIN_CAPACITY;
use crate::hash::fingerprint;
use crate::table::{Probe, Slot};
use crate::BlobSet;

/// Occupancy and probe-length summary of a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableStats {
    pub len: usize,
    pub capacity: usize,
    pub tombstones: usize,
    pub generation: u64,
    /// Longest distance from a key's home slot to where it sits.
    pub max_probe: usize,
    /// Mean of that distance over all live keys.
    pub mean_probe: f64,
}

impl<S> BlobSet<S> {
    fn probe_distance(&self, idx: usize, hash: u64) -> usize {
        let mask = self.slots.len() - 1;
        idx.wrapping_sub(hash as usize) & mask
    }

    pub fn stats(&self) -> TableStats {
        let mut max_probe = 0;
        let mut total = 0;
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { hash, .. } = slot {
                let d = self.probe_distance(idx, *hash);
                max_probe = max_probe.max(d);
                total += d;
            }
        }
        TableStats {
            len: self.len,
            capacity: self.slots.len(),
            tombstones: self.tombstones,
            generation: self.generation,
            max_probe,
            mean_probe: if self.len == 0 {
                0.0
            } else {
                total as f64 / self.len as f64
            },
        }
    }

    /// Render the slot array, one line per slot: `E` for empty, `T` for a
    /// tombstone, otherwise the key in hex with its home slot and probe
    /// distance.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "capacity={} len={} tombstones={} generation={}",
            self.slots.len(),
            self.len,
            self.tombstones,
            self.generation
        );
        let mask = self.slots.len() - 1;
        for (idx, slot) in self.slots.iter().enumerate() {
            let _ = match slot {
                Slot::Empty => writeln!(out, "{idx:>6}: E"),
                Slot::Tombstone => writeln!(out, "{idx:>6}: T"),
                Slot::Occupied { hash, key } => writeln!(
                    out,
                    "{idx:>6}: {} (home {}, +{})",
                    Hex(key),
                    *hash as usize & mask,
                    self.probe_distance(idx, *hash)
                ),
            };
        }
        out
    }
}

impl<S: BuildHasher> BlobSet<S> {
    /// Check table integrity. Returns a list of issues found; empty means
    /// the table is consistent.
    pub fn verify(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let capacity = self.slots.len();

        if !capacity.is_power_of_two() || capacity < MIN_CAPACITY {
            issues.push(format!("capacity {capacity} is not a power of two >= {MIN_CAPACITY}"));
            return issues;
        }

        let live = self.slots.iter().filter(|s| s.is_occupied()).count();
        let dead = self
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Tombstone))
            .count();
        if live != self.len {
            issues.push(format!("len is {} but {live} slots are occupied", self.len));
        }
        if dead != self.tombstones {
            issues.push(format!(
                "tombstones is {} but {dead} slots are tombstones",
                self.tombstones
            ));
        }
        if live > self.config.load_limit(capacity) {
            issues.push(format!(
                "{live} live keys exceed the load limit of {}",
                self.config.load_limit(capacity)
            ));
        }
        if live + dead >= capacity {
            issues.push("no empty slot left to terminate probes".to_string());
        }

        let mask = capacity - 1;
        for (idx, slot) in self.slots.iter().enumerate() {
            let Slot::Occupied { hash, key } = slot else {
                continue;
            };
            if fingerprint(&self.hasher, key) != *hash {
                issues.push(format!("slot {idx}: cached fingerprint is wrong"));
                continue;
            }
            let mut at = *hash as usize & mask;
            while at != idx {
                if matches!(self.slots[at], Slot::Empty) {
                    issues.push(format!(
                        "slot {idx}: empty slot {at} cuts the chain from home {}",
                        *hash as usize & mask
                    ));
                    break;
                }
                at = (at + 1) & mask;
            }
            match self.probe_hashed(*hash, key) {
                Probe::Found(found) if found == idx => {}
                Probe::Found(found) => {
                    issues.push(format!("slot {idx}: duplicate of slot {found}"));
                }
                Probe::Vacant(_) | Probe::Full => {
                    issues.push(format!("slot {idx}: key unreachable by lookup"));
                }
            }
        }

        issues
    }
}

struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<empty>");
        }
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl<S> fmt::Debug for BlobSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Hex)).finish()
    }
}

impl fmt::Debug for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
