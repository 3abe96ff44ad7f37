//! Sparse Merkle tree implementation

use crate::{
    hasher::get_root,
    proof::{BatchProof, SmtProof},
    Hash, SmtError, MAX_DEPTH, ZERO_HASH,
};

/// Arena slot of the root node.
const ROOT: usize = 0;

/// Child slot value meaning "never touched, implicitly zero". The root is the
/// only node stored at index 0 and is never anyone's child.
const ABSENT: usize = 0;

#[derive(Clone, Debug, Default)]
struct Node {
    hash: Hash,
    children: [usize; 2],
}

/// Fixed-depth sparse Merkle tree keyed by `depth`-bit integers
#[derive(Clone, Debug)]
pub struct SparseMerkleTree {
    depth: usize,
    nodes: Vec<Node>,
}

impl SparseMerkleTree {
    /// Create an empty tree of the given depth.
    ///
    /// # Panics
    ///
    /// If `depth` is zero or larger than [`MAX_DEPTH`].
    pub fn new(depth: usize) -> Self {
        assert!(
            depth > 0 && depth <= MAX_DEPTH,
            "tree depth must be within 1..={MAX_DEPTH}, got {depth}"
        );
        Self { depth, nodes: vec![Node::default()] }
    }

    /// Number of levels below the root
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Get the root hash
    pub fn root(&self) -> Hash {
        self.nodes[ROOT].hash
    }

    /// Set the leaf at `key` to `value` and refresh every ancestor digest.
    pub fn update(&mut self, key: u64, value: Hash) -> Result<(), SmtError> {
        self.check_key(key)?;

        let mut path = Vec::with_capacity(self.depth + 1);
        let mut current = ROOT;
        path.push(current);
        for level in 0..self.depth {
            let bit = self.bit(key, level);
            let mut child = self.nodes[current].children[bit];
            if child == ABSENT {
                child = self.nodes.len();
                self.nodes.push(Node::default());
                self.nodes[current].children[bit] = child;
            }
            current = child;
            path.push(current);
        }

        self.nodes[current].hash = value;
        for &index in path.iter().rev().skip(1) {
            let [left, right] = self.nodes[index].children;
            self.nodes[index].hash = get_root(&self.hash_of(left), &self.hash_of(right));
        }
        Ok(())
    }

    /// Get the leaf value stored at `key` (zero when never set)
    pub fn get(&self, key: u64) -> Result<Hash, SmtError> {
        self.check_key(key)?;
        Ok(self.node_hash(0, key))
    }

    /// Generate a proof for a key.
    ///
    /// Siblings are ordered top-down: index 0 is the sibling just below the
    /// root, the last entry is the leaf's immediate sibling. Once the walk
    /// enters an untouched subtree every remaining sibling is zero.
    pub fn get_proof(&self, key: u64) -> Result<SmtProof, SmtError> {
        self.check_key(key)?;

        let mut siblings = Vec::with_capacity(self.depth);
        let mut cursor = Some(ROOT);
        for level in 0..self.depth {
            match cursor {
                Some(index) => {
                    let bit = self.bit(key, level);
                    let children = self.nodes[index].children;
                    siblings.push(self.hash_of(children[bit ^ 1]));
                    cursor = Self::present(children[bit]);
                }
                None => siblings.push(ZERO_HASH),
            }
        }

        let value = cursor.map_or(ZERO_HASH, |index| self.nodes[index].hash);
        Ok(SmtProof { key, value, siblings })
    }

    /// Generate one compact proof for several leaves.
    ///
    /// Keys are sorted and deduplicated first. The tree is folded level by
    /// level from the leaves: two queried nodes that are siblings merge
    /// without emitting anything, any other queried node emits its sibling's
    /// digest. Siblings are therefore ordered bottom-up, and within a level
    /// by ascending key.
    pub fn get_proof_batch(&self, keys: &[u64]) -> Result<BatchProof, SmtError> {
        let mut keys = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();
        for &key in &keys {
            self.check_key(key)?;
        }

        let values = keys.iter().map(|&key| self.node_hash(0, key)).collect();

        let mut siblings = Vec::new();
        let mut level_keys = keys.clone();
        for height in 0..self.depth {
            let mut next = Vec::with_capacity(level_keys.len());
            let mut i = 0;
            while i < level_keys.len() {
                let key = level_keys[i];
                if key & 1 == 0 && level_keys.get(i + 1) == Some(&(key + 1)) {
                    next.push(key >> 1);
                    i += 2;
                    continue;
                }
                siblings.push(self.node_hash(height, key ^ 1));
                next.push(key >> 1);
                i += 1;
            }
            level_keys = next;
        }

        Ok(BatchProof { depth: self.depth, keys, values, siblings })
    }

    /// Digest of the node `index` positions from the left at `height` levels
    /// above the leaves.
    fn node_hash(&self, height: usize, index: u64) -> Hash {
        let levels = self.depth - height;
        let mut cursor = Some(ROOT);
        for level in 0..levels {
            let Some(current) = cursor else {
                return ZERO_HASH;
            };
            let bit = ((index >> (levels - 1 - level)) & 1) as usize;
            cursor = Self::present(self.nodes[current].children[bit]);
        }
        cursor.map_or(ZERO_HASH, |current| self.nodes[current].hash)
    }

    fn hash_of(&self, index: usize) -> Hash {
        if index == ABSENT {
            ZERO_HASH
        } else {
            self.nodes[index].hash
        }
    }

    const fn present(index: usize) -> Option<usize> {
        if index == ABSENT {
            None
        } else {
            Some(index)
        }
    }

    const fn bit(&self, key: u64, level: usize) -> usize {
        ((key >> (self.depth - 1 - level)) & 1) as usize
    }

    fn check_key(&self, key: u64) -> Result<(), SmtError> {
        match key.checked_shr(self.depth as u32) {
            Some(high) if high != 0 => Err(SmtError::KeyOutOfRange { key, depth: self.depth }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Keccak256Hasher;

    fn hash_of_byte(byte: u8) -> Hash {
        let mut out = ZERO_HASH;
        out[31] = byte;
        out
    }

    #[test]
    fn test_single_leaf_root() {
        let mut tree = SparseMerkleTree::new(2);
        let value = hash_of_byte(0x45);
        tree.update(1, value).unwrap();

        // key 1 = path left, right
        let lower = Keccak256Hasher::hash_pair(&ZERO_HASH, &value);
        let expected = Keccak256Hasher::hash_pair(&lower, &ZERO_HASH);
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn test_reset_leaf_restores_zero_root() {
        let mut tree = SparseMerkleTree::new(33);
        tree.update(8, hash_of_byte(1)).unwrap();
        assert_ne!(tree.root(), ZERO_HASH);

        tree.update(8, ZERO_HASH).unwrap();
        assert_eq!(tree.root(), ZERO_HASH);
    }

    #[test]
    fn test_proof_sibling_order() {
        let mut tree = SparseMerkleTree::new(3);
        let a = hash_of_byte(1);
        let b = hash_of_byte(2);
        let c = hash_of_byte(3);
        tree.update(0, a).unwrap();
        tree.update(1, b).unwrap();
        tree.update(7, c).unwrap();

        let proof = tree.get_proof(0).unwrap();
        assert_eq!(proof.value, a);
        assert_eq!(proof.siblings.len(), 3);
        // top level: right half of the tree
        assert_eq!(proof.siblings[0], get_root(&ZERO_HASH, &get_root(&ZERO_HASH, &c)));
        // middle level: keys 2..=3 are empty
        assert_eq!(proof.siblings[1], ZERO_HASH);
        // leaf level: key 1
        assert_eq!(proof.siblings[2], b);
        assert!(proof.verify(&tree.root()));
    }

    #[test]
    fn test_proof_in_untouched_branch() {
        let mut tree = SparseMerkleTree::new(11);
        tree.update(3, hash_of_byte(9)).unwrap();

        let proof = tree.get_proof(2047).unwrap();
        assert_eq!(proof.value, ZERO_HASH);
        assert_eq!(proof.siblings[0], tree.nodes[tree.nodes[ROOT].children[0]].hash);
        assert!(proof.siblings[1..].iter().all(|sibling| *sibling == ZERO_HASH));
        assert!(proof.verify(&tree.root()));
    }

    #[test]
    fn test_key_out_of_range() {
        let mut tree = SparseMerkleTree::new(11);
        assert_eq!(
            tree.update(2048, hash_of_byte(1)),
            Err(SmtError::KeyOutOfRange { key: 2048, depth: 11 })
        );
        assert!(tree.get_proof(1 << 20).is_err());
        assert!(tree.get_proof_batch(&[1, 4096]).is_err());
    }

    #[test]
    fn test_batch_proof_folds_siblings() {
        let v1 = hash_of_byte(0x45);
        let v2 = hash_of_byte(0x78);

        let mut tree = SparseMerkleTree::new(4);
        tree.update(3, v1).unwrap();
        tree.update(5, v2).unwrap();
        tree.update(1, hash_of_byte(0xcd)).unwrap();

        let batch = tree.get_proof_batch(&[5, 3]).unwrap();
        assert_eq!(batch.keys, vec![3, 5]);
        assert_eq!(batch.values, vec![v1, v2]);
        assert_eq!(batch.compute_root(), Some(tree.root()));

        // 4 and 5 are leaf siblings, so querying both saves one hash
        let pair = tree.get_proof_batch(&[4, 5]).unwrap();
        let single = tree.get_proof_batch(&[5]).unwrap();
        assert_eq!(pair.siblings.len() + 1, single.siblings.len());
        assert!(pair.verify(&tree.root()));
    }

    proptest! {
        #[test]
        fn proof_reconstructs_root(
            updates in proptest::collection::vec((0u64..2048, any::<[u8; 32]>()), 1..40),
            probe in 0u64..2048,
        ) {
            let mut tree = SparseMerkleTree::new(11);
            for (key, value) in &updates {
                tree.update(*key, *value).unwrap();
            }

            for (key, _) in &updates {
                let proof = tree.get_proof(*key).unwrap();
                prop_assert_eq!(proof.value, tree.get(*key).unwrap());
                prop_assert_eq!(proof.compute_root(), tree.root());
            }
            let proof = tree.get_proof(probe).unwrap();
            prop_assert!(proof.verify(&tree.root()));
        }

        #[test]
        fn batch_proof_matches_single_proofs(
            updates in proptest::collection::vec((0u64..256, any::<[u8; 32]>()), 0..40),
            keys in proptest::collection::vec(0u64..256, 1..16),
        ) {
            let mut tree = SparseMerkleTree::new(8);
            for (key, value) in &updates {
                tree.update(*key, *value).unwrap();
            }

            let batch = tree.get_proof_batch(&keys).unwrap();
            for (key, value) in batch.keys.iter().zip(&batch.values) {
                let single = tree.get_proof(*key).unwrap();
                prop_assert_eq!(single.value, *value);
                prop_assert_eq!(single.compute_root(), tree.root());
            }
            prop_assert_eq!(batch.compute_root(), Some(tree.root()));
        }
    }
}
