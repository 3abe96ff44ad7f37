//! Account state, the left-over order store and the committed snapshot

use std::collections::BTreeMap;

use alloy_primitives::Address;
use rollup_smt::{Keccak256Hasher, SmtProof, SparseMerkleTree};
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::error::{EngineError, Result};
use crate::loo::LeftOverOrder;
use crate::types::{
    u48_to_bytes, AccountId, Amount, Hash, LooId, TokenId, LOO_TREE_DEPTH, STATE_TREE_DEPTH,
};

/// All accounts plus the tree committing to them
#[derive(Clone, Debug)]
pub struct State {
    accounts: BTreeMap<AccountId, Account>,
    tree: SparseMerkleTree,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self { accounts: BTreeMap::new(), tree: SparseMerkleTree::new(STATE_TREE_DEPTH) }
    }

    /// Seed accounts and balances from a genesis allocation
    pub fn from_alloc(alloc: &BTreeMap<AccountId, GenesisAccount>) -> Result<Self> {
        let mut state = Self::new();
        for (&account_id, genesis) in alloc {
            let mut account = Account::new(genesis.pub_key.clone(), genesis.address);
            for (&token, amount) in &genesis.tokens {
                account.update(token, amount)?;
            }
            state.insert(account_id, account)?;
        }
        Ok(state)
    }

    /// Look up an account
    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Look up an account, failing if it is unallocated
    pub fn try_account(&self, id: AccountId) -> Result<&Account> {
        self.accounts.get(&id).ok_or(EngineError::UnknownAccount(id))
    }

    pub(crate) fn try_account_mut(&mut self, id: AccountId) -> Result<&mut Account> {
        self.accounts.get_mut(&id).ok_or(EngineError::UnknownAccount(id))
    }

    /// Whether `id` is allocated
    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Number of allocated accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether no account is allocated
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Store `account` under `id` and commit its digest
    pub(crate) fn insert(&mut self, id: AccountId, account: Account) -> Result<()> {
        self.tree.update(u64::from(id), account.digest())?;
        self.accounts.insert(id, account);
        Ok(())
    }

    /// Write a state tree leaf for `id`
    pub(crate) fn set_leaf(&mut self, id: AccountId, digest: Hash) -> Result<()> {
        Ok(self.tree.update(u64::from(id), digest)?)
    }

    /// Path of `id` in the state tree
    pub fn account_proof(&self, id: AccountId) -> Result<SmtProof> {
        Ok(self.tree.get_proof(u64::from(id))?)
    }

    /// Root of the state tree
    pub fn root(&self) -> Hash {
        self.tree.root()
    }
}

/// Left-over orders plus the tree committing to them
#[derive(Clone, Debug)]
pub struct LooStore {
    loos: BTreeMap<LooId, LeftOverOrder>,
    tree: SparseMerkleTree,
}

impl Default for LooStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LooStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self { loos: BTreeMap::new(), tree: SparseMerkleTree::new(LOO_TREE_DEPTH) }
    }

    /// Seed orders from a genesis allocation
    pub fn from_alloc(alloc: &BTreeMap<LooId, LeftOverOrder>) -> Result<Self> {
        let mut store = Self::new();
        for (&id, loo) in alloc {
            store.insert(id, loo.clone())?;
        }
        Ok(store)
    }

    /// Look up an order
    pub fn get(&self, id: LooId) -> Option<&LeftOverOrder> {
        self.loos.get(&id)
    }

    /// Look up an order, failing if it is unallocated
    pub fn try_get(&self, id: LooId) -> Result<&LeftOverOrder> {
        self.loos.get(&id).ok_or(EngineError::UnknownLeftOverOrder(id))
    }

    pub(crate) fn try_get_mut(&mut self, id: LooId) -> Result<&mut LeftOverOrder> {
        self.loos.get_mut(&id).ok_or(EngineError::UnknownLeftOverOrder(id))
    }

    /// Number of stored orders
    pub fn len(&self) -> usize {
        self.loos.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.loos.is_empty()
    }

    /// Store `loo` under `id` and commit its digest
    pub(crate) fn insert(&mut self, id: LooId, loo: LeftOverOrder) -> Result<()> {
        self.tree.update(id, loo.hash())?;
        self.loos.insert(id, loo);
        Ok(())
    }

    /// Recommit the digest of an order mutated in place
    pub(crate) fn refresh(&mut self, id: LooId) -> Result<()> {
        let digest = self.try_get(id)?.hash();
        Ok(self.tree.update(id, digest)?)
    }

    /// Path of `id` in the LOO tree
    pub fn proof(&self, id: LooId) -> Result<SmtProof> {
        Ok(self.tree.get_proof(id)?)
    }

    /// Root of the LOO tree
    pub fn root(&self) -> Hash {
        self.tree.root()
    }
}

/// Externally committed snapshot of the rollup state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateData {
    /// Root of the account tree
    pub state_root: Hash,
    /// Root of the LOO tree
    pub loo_root: Hash,
    /// Highest allocated account id
    pub account_max: AccountId,
    /// Highest allocated LOO id
    pub loo_max: LooId,
}

impl StateData {
    /// `keccak(stateRoot ‖ looRoot ‖ u32 accountMax ‖ u48 looMax)`
    pub fn hash(&self) -> Hash {
        Keccak256Hasher::hash_parts(&[
            self.state_root.as_slice(),
            self.loo_root.as_slice(),
            self.account_max.to_be_bytes().as_slice(),
            u48_to_bytes(self.loo_max).as_slice(),
        ])
    }
}

/// Genesis allocation of one account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Initial balance per token
    pub tokens: BTreeMap<TokenId, Amount>,
    /// Public key blob
    pub pub_key: Vec<u8>,
    /// Withdrawal address
    pub address: Address,
}

/// Initial rollup state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Funded accounts by id
    pub account_alloc: BTreeMap<AccountId, GenesisAccount>,
    /// Highest account id considered allocated; new accounts start above it
    pub account_max: AccountId,
    /// Stored left-over orders by id
    pub loo_alloc: BTreeMap<LooId, LeftOverOrder>,
    /// Highest LOO id considered allocated; new orders start above it
    pub loo_max: LooId,
}
