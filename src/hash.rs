//! Key fingerprints.
//!
//! The table hashes a key by feeding its raw bytes to a [`Hasher`] through a
//! single `write` call, so the fingerprint covers the whole key including any
//! embedded `0x00` bytes, and no length prefix is mixed in.

use std::hash::{BuildHasher, Hasher};

/// 64-bit FNV-1a with an avalanche finalizer.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    state: u64,
}

impl Fingerprint {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for Fingerprint {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        // FNV leaves the low bits weak for short keys; the mask-based probe
        // only looks at the low bits, so mix the high bits down.
        let mut h = self.state;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        h
    }
}

/// Default [`BuildHasher`] for [`BlobSet`](crate::BlobSet).
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildFingerprint;

impl BuildHasher for BuildFingerprint {
    type Hasher = Fingerprint;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        Fingerprint::default()
    }
}

/// Fingerprint of `key` under `build`.
#[inline]
pub(crate) fn fingerprint<S: BuildHasher>(build: &S, key: &[u8]) -> u64 {
    let mut hasher = build.build_hasher();
    hasher.write(key);
    hasher.finish()
}
