//! Accounts and their balance trees

use alloy_primitives::Address;
use rollup_smt::{Keccak256Hasher, SmtProof, SparseMerkleTree};

use crate::error::Result;
use crate::types::{amount_to_word, word_to_amount, Amount, Hash, TokenId, ACCOUNT_TREE_DEPTH};

/// A rollup account
#[derive(Clone, Debug)]
pub struct Account {
    pub_key: Vec<u8>,
    withdraw_to: Address,
    tree: SparseMerkleTree,
    is_confirmed_exit: bool,
}

impl Account {
    /// Empty account owned by `pub_key`
    pub fn new(pub_key: Vec<u8>, withdraw_to: Address) -> Self {
        Self {
            pub_key,
            withdraw_to,
            tree: SparseMerkleTree::new(ACCOUNT_TREE_DEPTH),
            is_confirmed_exit: false,
        }
    }

    /// Opaque public key blob
    pub fn pub_key(&self) -> &[u8] {
        &self.pub_key
    }

    /// L1 address withdrawals are paid to
    pub const fn withdraw_to(&self) -> Address {
        self.withdraw_to
    }

    /// Whether an exit has been applied to this account
    pub const fn is_confirmed_exit(&self) -> bool {
        self.is_confirmed_exit
    }

    pub(crate) fn confirm_exit(&mut self) {
        self.is_confirmed_exit = true;
    }

    /// Set the balance of `token`, returning the new balance root
    pub fn update(&mut self, token: TokenId, amount: &Amount) -> Result<Hash> {
        self.tree.update(u64::from(token), amount_to_word(amount))?;
        Ok(self.tree.root())
    }

    /// Balance of `token`
    pub fn balance(&self, token: TokenId) -> Result<Amount> {
        Ok(word_to_amount(&self.tree.get(u64::from(token))?))
    }

    /// Balance of `token` together with its path in the balance tree
    pub fn balance_proof(&self, token: TokenId) -> Result<SmtProof> {
        Ok(self.tree.get_proof(u64::from(token))?)
    }

    /// Root of the balance tree
    pub fn balance_root(&self) -> Hash {
        self.tree.root()
    }

    /// The account's balance tree
    pub const fn balance_tree(&self) -> &SparseMerkleTree {
        &self.tree
    }

    /// `keccak(pubKey ‖ withdrawTo)`
    pub fn pub_account_hash(&self) -> Hash {
        Keccak256Hasher::hash_parts(&[self.pub_key.as_slice(), self.withdraw_to.as_slice()])
    }

    /// Leaf value in the state tree: `keccak(balanceRoot ‖ pubAccountHash)`
    pub fn digest(&self) -> Hash {
        Self::digest_with_root(&self.balance_root(), &self.pub_account_hash())
    }

    /// State tree leaf for an arbitrary balance root
    pub fn digest_with_root(balance_root: &Hash, pub_account_hash: &Hash) -> Hash {
        Keccak256Hasher::hash_pair(balance_root, pub_account_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ZERO_HASH;

    #[test]
    fn test_account_digest() {
        let mut account = Account::new(vec![0x11; 32], Address::repeat_byte(0x22));
        assert_eq!(account.balance_root(), ZERO_HASH);

        let root = account.update(2, &Amount::from(5_000_000u64)).unwrap();
        assert_ne!(root, ZERO_HASH);
        assert_eq!(account.balance(2).unwrap(), Amount::from(5_000_000u64));
        assert_eq!(account.balance(3).unwrap(), Amount::ZERO);

        let mut preimage = vec![0x11; 32];
        preimage.extend_from_slice(&[0x22; 20]);
        assert_eq!(account.pub_account_hash(), Keccak256Hasher::hash(&preimage));
        assert_eq!(
            account.digest(),
            Keccak256Hasher::hash_pair(&root, &account.pub_account_hash())
        );

        let proof = account.balance_proof(2).unwrap();
        assert!(proof.verify(&root));
    }

    #[test]
    fn test_token_out_of_range() {
        let mut account = Account::new(Vec::new(), Address::ZERO);
        assert!(account.update(1 << 11, &Amount::from(1u8)).is_err());
    }
}
