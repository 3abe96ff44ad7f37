//! Hash-list folding
//!
//! A list is reduced by hashing adjacent pairs, `keccak(a ‖ b)`, with an odd
//! tail hashed against the zero word, until one hash remains. Mini-block
//! hashes fold into the block info hash this way.

use rollup_core::Hash;
use rollup_smt::{Keccak256Hasher, ZERO_HASH};

use crate::error::{FraudProofError, Result};

fn fold_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| Keccak256Hasher::hash_pair(&pair[0], pair.get(1).unwrap_or(&ZERO_HASH)))
        .collect()
}

/// Fold `hashes` down to a single hash.
///
/// A single hash folds to itself and an empty list to the zero hash.
pub fn block_info_hash(hashes: &[Hash]) -> Hash {
    if hashes.is_empty() {
        return ZERO_HASH;
    }
    let mut level = hashes.to_vec();
    while level.len() > 1 {
        level = fold_level(&level);
    }
    level[0]
}

/// Inclusion proof of `hashes[index]` in [`block_info_hash`].
///
/// A leading byte holds the number of fold rounds, followed by the sibling
/// met in each round, the zero word where the target was an odd tail.
pub fn block_info_proof(hashes: &[Hash], index: usize) -> Result<Vec<u8>> {
    if index >= hashes.len() {
        return Err(FraudProofError::IndexOutOfRange { index, len: hashes.len() });
    }

    let mut proof = vec![0u8];
    let mut rounds = 0u8;
    let mut level = hashes.to_vec();
    let mut index = index;
    while level.len() > 1 {
        let sibling = level.get(index ^ 1).copied().unwrap_or(ZERO_HASH);
        proof.extend_from_slice(&sibling);
        level = fold_level(&level);
        index /= 2;
        rounds += 1;
    }
    proof[0] = rounds;
    Ok(proof)
}

/// Replay a [`block_info_proof`] from `leaf` at `index`, returning the
/// folded hash it implies, or `None` if the proof is malformed
pub fn block_info_root(proof: &[u8], leaf: &Hash, index: usize) -> Option<Hash> {
    let (&rounds, siblings) = proof.split_first()?;
    if siblings.len() != usize::from(rounds) * 32 {
        return None;
    }

    let mut current = *leaf;
    let mut index = index;
    for chunk in siblings.chunks_exact(32) {
        let mut sibling = ZERO_HASH;
        sibling.copy_from_slice(chunk);
        current = if index % 2 == 0 {
            Keccak256Hasher::hash_pair(&current, &sibling)
        } else {
            Keccak256Hasher::hash_pair(&sibling, &current)
        };
        index /= 2;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(n: u8) -> Hash {
        let mut hash = ZERO_HASH;
        hash[31] = n;
        hash
    }

    fn hashes(n: u8) -> Vec<Hash> {
        (1..=n).map(word).collect()
    }

    #[test]
    fn test_fold_shapes() {
        assert_eq!(block_info_hash(&[]), ZERO_HASH);
        assert_eq!(block_info_hash(&[word(7)]), word(7));

        let pair = Keccak256Hasher::hash_pair(&word(1), &word(2));
        assert_eq!(block_info_hash(&hashes(2)), pair);

        let tail = Keccak256Hasher::hash_pair(&word(3), &ZERO_HASH);
        assert_eq!(block_info_hash(&hashes(3)), Keccak256Hasher::hash_pair(&pair, &tail));
    }

    #[test]
    fn test_single_hash_proof() {
        assert_eq!(block_info_proof(&[word(1)], 0).unwrap(), vec![0]);
    }

    #[test]
    fn test_proof_of_five() {
        let list = hashes(5);
        let proof = block_info_proof(&list, 1).unwrap();
        // 5 -> 3 -> 2 -> 1
        assert_eq!(proof[0], 3);
        assert_eq!(proof.len(), 1 + 3 * 32);
        assert_eq!(&proof[1..33], &word(1));

        let root = block_info_hash(&list);
        for index in 0..list.len() {
            let proof = block_info_proof(&list, index).unwrap();
            assert_eq!(block_info_root(&proof, &list[index], index), Some(root));
        }
    }

    #[test]
    fn test_odd_tail_gets_zero_sibling() {
        let list = hashes(5);
        let proof = block_info_proof(&list, 4).unwrap();
        assert_eq!(&proof[1..33], &ZERO_HASH);
    }

    #[test]
    fn test_index_out_of_range() {
        assert_eq!(
            block_info_proof(&hashes(2), 2),
            Err(FraudProofError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(block_info_proof(&[], 0).is_err());
        assert_eq!(block_info_root(&[2, 0], &word(1), 0), None);
    }
}
