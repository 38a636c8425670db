//! Deterministic pseudo-random draws derived from SHA-256.
//!
//! A [`Seed`] hashes a key (shipment id, document id, goods description...)
//! together with a per-stage salt. Each of its eight slots yields an
//! independent draw in `[0, 1)`, so the same input always produces the same
//! stage output.

use sha2::{Digest, Sha256};

const SLOTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed([u8; 32]);

impl Seed {
    /// Hash `salt` and every part, unit-separated.
    pub fn new(salt: &str, parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        for part in parts {
            hasher.update([0x1f]);
            hasher.update(part.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    /// Draw in `[0, 1)` from slot `slot` (taken modulo eight).
    pub fn unit(&self, slot: usize) -> f64 {
        let start = (slot % SLOTS) * 4;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.0[start..start + 4]);
        f64::from(u32::from_be_bytes(word)) / (f64::from(u32::MAX) + 1.0)
    }

    /// `min + unit * span`.
    pub fn range(&self, slot: usize, min: f64, span: f64) -> f64 {
        min + self.unit(slot) * span
    }

    /// Integer in `min..min + span`.
    pub fn pick(&self, slot: usize, min: u64, span: u64) -> u64 {
        min + (self.unit(slot) * span as f64).floor() as u64
    }

    /// Upper-case hex of the digest, truncated to `len` characters.
    pub fn tag(&self, len: usize) -> String {
        let mut hex = hex::encode_upper(self.0);
        hex.truncate(len);
        hex
    }
}
