//! Program Key Building
//!
//! Every piece of state that changes generated shader code contributes bits to
//! a [`KeyBuilder`]. The finished [`ProgramKey`] is a flat byte string: two
//! draws whose keys are byte-identical can share one compiled program.
//!
//! Values are packed LSB-first into 32-bit words; a value that does not fit the
//! remaining bits of the current word starts a new one. Words are serialized
//! little-endian.

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;
use xxhash_rust::xxh3::xxh3_128;

#[derive(Debug, Clone, Default)]
pub struct KeyBuilder {
    words: SmallVec<[u32; 16]>,
    current: u32,
    bits_used: u32,
}

impl KeyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `num_bits` bits of `value`.
    pub fn add_bits(&mut self, num_bits: u32, value: u32) {
        debug_assert!(num_bits > 0 && num_bits <= 32);
        debug_assert!(
            num_bits == 32 || value < (1u32 << num_bits),
            "value {value:#x} does not fit in {num_bits} bits"
        );

        if self.bits_used + num_bits > 32 {
            self.flush();
        }
        if num_bits == 32 {
            self.words.push(value);
            return;
        }
        self.current |= value << self.bits_used;
        self.bits_used += num_bits;
        if self.bits_used == 32 {
            self.flush();
        }
    }

    #[inline]
    pub fn add32(&mut self, value: u32) {
        self.add_bits(32, value);
    }

    #[inline]
    pub fn add_bool(&mut self, value: bool) {
        self.add_bits(1, u32::from(value));
    }

    /// Closes the partially filled word, if any.
    pub fn flush(&mut self) {
        if self.bits_used > 0 {
            self.words.push(self.current);
            self.current = 0;
            self.bits_used = 0;
        }
    }

    /// Words written so far, excluding a partially filled word.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    #[must_use]
    pub fn finish(mut self) -> ProgramKey {
        self.flush();
        let bytes = self
            .words
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect::<Vec<u8>>();
        ProgramKey::from_bytes(bytes)
    }
}

/// Canonical program key bytes plus a precomputed xxh3-128 digest.
#[derive(Debug, Clone)]
pub struct ProgramKey {
    bytes: Vec<u8>,
    digest: u128,
}

impl ProgramKey {
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let digest = xxh3_128(&bytes);
        Self { bytes, digest }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn digest(&self) -> u128 {
        self.digest
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The key as little-endian 32-bit words.
    #[must_use]
    pub fn words(&self) -> Vec<u32> {
        self.bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

impl PartialEq for ProgramKey {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest && self.bytes == other.bytes
    }
}

impl Eq for ProgramKey {}

impl Hash for ProgramKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}
