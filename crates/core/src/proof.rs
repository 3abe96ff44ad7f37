//! Execution proof byte assembly
//!
//! Every handler records the tree paths it reads and writes, in the order an
//! on-chain verifier replays them. Fields are concatenated with no framing.

use rollup_smt::SmtProof;

use crate::types::{amount_to_word, u48_to_bytes, Amount, Hash, ProofBytes};

/// Append-only proof buffer
#[derive(Clone, Debug, Default)]
pub struct ProofWriter {
    buf: Vec<u8>,
}

impl ProofWriter {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// One 32-byte word
    pub fn hash(&mut self, hash: &Hash) -> &mut Self {
        self.bytes(hash)
    }

    /// A sibling path without its leaf
    pub fn siblings(&mut self, proof: &SmtProof) -> &mut Self {
        for sibling in &proof.siblings {
            self.hash(sibling);
        }
        self
    }

    /// Leaf value followed by its sibling path
    pub fn leaf_and_siblings(&mut self, proof: &SmtProof) -> &mut Self {
        self.hash(&proof.value).siblings(proof)
    }

    /// Big-endian `u16`
    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    /// Big-endian `u32`
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes(&value.to_be_bytes())
    }

    /// Big-endian low 48 bits
    pub fn u48(&mut self, value: u64) -> &mut Self {
        self.bytes(&u48_to_bytes(value))
    }

    /// 32-byte big-endian word
    pub fn amount(&mut self, amount: &Amount) -> &mut Self {
        self.bytes(&amount_to_word(amount))
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing was written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the finished proof
    pub fn finish(self) -> ProofBytes {
        self.buf
    }
}
