//! Keccak256 hashing for tree nodes and account digests

use tiny_keccak::{Hasher, Keccak};

use crate::{Hash, ZERO_HASH};

/// Keccak256 hasher
#[derive(Clone, Copy, Debug)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash two 32-byte values together
    pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
        Self::hash_parts(&[left.as_slice(), right.as_slice()])
    }

    /// Hash a single value
    pub fn hash(data: &[u8]) -> Hash {
        Self::hash_parts(&[data])
    }

    /// Hash the concatenation of several byte strings without copying them
    /// into a single buffer first.
    pub fn hash_parts(parts: &[&[u8]]) -> Hash {
        let mut hasher = Keccak::v256();
        for part in parts {
            hasher.update(part);
        }
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }
}

/// Parent digest of two children.
///
/// Two empty children collapse to the zero hash, which keeps untouched
/// subtrees free at every depth.
pub fn get_root(left: &Hash, right: &Hash) -> Hash {
    if *left == ZERO_HASH && *right == ZERO_HASH {
        return ZERO_HASH;
    }
    Keccak256Hasher::hash_pair(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_pair() {
        let left = [1u8; 32];
        let right = [2u8; 32];
        let hash = Keccak256Hasher::hash_pair(&left, &right);
        assert_ne!(hash, ZERO_HASH);
        assert_eq!(hash, Keccak256Hasher::hash(&[[1u8; 32], [2u8; 32]].concat()));
    }

    #[test]
    fn test_empty_keccak() {
        assert_eq!(
            hex::encode(Keccak256Hasher::hash(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_get_root_zero_children() {
        assert_eq!(get_root(&ZERO_HASH, &ZERO_HASH), ZERO_HASH);

        let leaf = [7u8; 32];
        assert_eq!(get_root(&leaf, &ZERO_HASH), Keccak256Hasher::hash_pair(&leaf, &ZERO_HASH));
        assert_eq!(get_root(&ZERO_HASH, &leaf), Keccak256Hasher::hash_pair(&ZERO_HASH, &leaf));
    }
}
