//! Mini-block structure

use rollup_smt::Keccak256Hasher;
use serde::{Deserialize, Serialize};

use crate::tx::Transaction;
use crate::types::{Hash, ZERO_HASH};

/// Ordered transactions applied together, plus the two digests their
/// application produces
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniBlock {
    /// Transactions in application order
    pub txs: Vec<Transaction>,
    /// State data hash after the block, set by the engine
    pub state_hash: Hash,
    /// SHA-256 commitment over the signed messages, set by the engine
    pub commitment: Hash,
}

impl MiniBlock {
    /// Create an unapplied mini-block
    pub fn new(txs: Vec<Transaction>) -> Self {
        Self { txs, state_hash: ZERO_HASH, commitment: ZERO_HASH }
    }

    /// Add a transaction
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.txs.push(tx);
    }

    /// Concatenated pubdata of every transaction
    pub fn tx_bytes(&self) -> Vec<u8> {
        self.txs.iter().flat_map(Transaction::to_bytes).collect()
    }

    /// `keccak(tx bytes)`
    pub fn tx_root(&self) -> Hash {
        Keccak256Hasher::hash(&self.tx_bytes())
    }

    /// `keccak(commitment ‖ stateHash ‖ txRoot)`
    pub fn hash(&self) -> Hash {
        Keccak256Hasher::hash_parts(&[
            self.commitment.as_slice(),
            self.state_hash.as_slice(),
            self.tx_root().as_slice(),
        ])
    }

    /// `commitment ‖ stateHash ‖ tx bytes`, the form a block is submitted in
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&self.commitment);
        out.extend_from_slice(&self.state_hash);
        out.extend(self.tx_bytes());
        out
    }

    /// Get transaction count
    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{DepositOp, Settlement3};

    #[test]
    fn test_mini_block_hash() {
        let mut block = MiniBlock::new(vec![Settlement3 { loo_id1: 1, loo_id2: 2 }.into()]);
        block.add_transaction(DepositOp { deposit_id: 3, ..Default::default() }.into());
        assert_eq!(block.tx_count(), 2);
        assert_eq!(hex::encode(block.tx_bytes()), "600000000001000000000020800000000003");

        let tx_root = Keccak256Hasher::hash(&block.tx_bytes());
        assert_eq!(block.tx_root(), tx_root);

        block.commitment = [1; 32];
        block.state_hash = [2; 32];
        let mut preimage = vec![1; 32];
        preimage.extend_from_slice(&[2; 32]);
        preimage.extend_from_slice(&tx_root);
        assert_eq!(block.hash(), Keccak256Hasher::hash(&preimage));
        assert_eq!(&block.to_bytes()[64..], block.tx_bytes().as_slice());
    }

    #[test]
    fn test_empty_tx_root() {
        assert_eq!(
            hex::encode(MiniBlock::default().tx_root()),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
