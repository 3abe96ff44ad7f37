//! SMT proof generation and verification

use serde::{Deserialize, Serialize};

use crate::{hasher::get_root, Hash};

/// SMT inclusion proof for one key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtProof {
    /// The key being proven
    pub key: u64,
    /// The value at the key
    pub value: Hash,
    /// Sibling hashes from just below the root down to the leaf level
    pub siblings: Vec<Hash>,
}

impl SmtProof {
    /// Verify this proof against a root hash
    pub fn verify(&self, root: &Hash) -> bool {
        self.compute_root() == *root
    }

    /// Compute root from proof
    pub fn compute_root(&self) -> Hash {
        let depth = self.siblings.len();
        let mut current = self.value;
        for (level, sibling) in self.siblings.iter().enumerate().rev() {
            current = if (self.key >> (depth - 1 - level)) & 1 == 0 {
                get_root(&current, sibling)
            } else {
                get_root(sibling, &current)
            };
        }
        current
    }
}

/// Compact proof for several leaves of one tree.
///
/// Produced by [`SparseMerkleTree::get_proof_batch`](crate::SparseMerkleTree::get_proof_batch).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProof {
    /// Depth of the tree the proof was taken from
    pub depth: usize,
    /// Queried keys, ascending and unique
    pub keys: Vec<u64>,
    /// Leaf value for each key
    pub values: Vec<Hash>,
    /// Siblings not covered by another queried key, bottom-up
    pub siblings: Vec<Hash>,
}

impl BatchProof {
    /// Verify this proof against a root hash
    pub fn verify(&self, root: &Hash) -> bool {
        self.compute_root().is_some_and(|computed| computed == *root)
    }

    /// Replay the level-by-level fold and return the implied root.
    ///
    /// Returns `None` when the proof is malformed: no keys, mismatched
    /// value count, or a sibling list of the wrong length.
    pub fn compute_root(&self) -> Option<Hash> {
        if self.keys.is_empty() || self.keys.len() != self.values.len() {
            return None;
        }

        let mut keys = self.keys.clone();
        let mut values = self.values.clone();
        let mut siblings = self.siblings.iter();

        for _ in 0..self.depth {
            let mut next_keys = Vec::with_capacity(keys.len());
            let mut next_values = Vec::with_capacity(values.len());
            let mut i = 0;
            while i < keys.len() {
                if i + 1 < keys.len() && keys[i] >> 1 == keys[i + 1] >> 1 {
                    next_keys.push(keys[i] >> 1);
                    next_values.push(get_root(&values[i], &values[i + 1]));
                    i += 2;
                    continue;
                }

                let sibling = siblings.next()?;
                let parent = if keys[i] & 1 == 0 {
                    get_root(&values[i], sibling)
                } else {
                    get_root(sibling, &values[i])
                };
                next_keys.push(keys[i] >> 1);
                next_values.push(parent);
                i += 1;
            }
            keys = next_keys;
            values = next_values;
        }

        if siblings.next().is_some() || values.len() != 1 {
            return None;
        }
        values.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SparseMerkleTree, ZERO_HASH};

    #[test]
    fn test_tampered_proof_fails() {
        let mut tree = SparseMerkleTree::new(11);
        tree.update(10, [3u8; 32]).unwrap();
        tree.update(1000, [4u8; 32]).unwrap();

        let mut proof = tree.get_proof(10).unwrap();
        assert!(proof.verify(&tree.root()));

        proof.value = [5u8; 32];
        assert!(!proof.verify(&tree.root()));
    }

    #[test]
    fn test_malformed_batch_proof() {
        let mut tree = SparseMerkleTree::new(5);
        tree.update(3, [1u8; 32]).unwrap();

        let mut batch = tree.get_proof_batch(&[3]).unwrap();
        batch.siblings.push(ZERO_HASH);
        assert_eq!(batch.compute_root(), None);

        let empty = tree.get_proof_batch(&[]).unwrap();
        assert!(empty.siblings.is_empty());
        assert!(!empty.verify(&tree.root()));
    }
}
