//! Rollup engine
//!
//! A [`Blockchain`] owns the account state and the left-over order store and
//! applies mini-blocks to them one at a time. Application is not atomic: if
//! [`Blockchain::apply_mini_block`] returns an error the instance holds a
//! partially applied block and must be discarded.

use tracing::{debug, info, warn};

use crate::account::Account;
use crate::block::MiniBlock;
use crate::commitment::{
    commitment, empty_slot, settlement1_zk_msg, settlement2_zk_msg, withdraw_zk_msg,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::loo::LeftOverOrder;
use crate::state::{Genesis, LooStore, State, StateData};
use crate::tx::Transaction;
use crate::types::{AccountId, Amount, LooId, ProofBytes, ZK_MSG_SLOT_LEN};

/// Rollup state plus the counters transactions allocate from
#[derive(Clone, Debug, Default)]
pub struct Blockchain {
    pub(crate) config: EngineConfig,
    pub(crate) state: State,
    pub(crate) account_max: AccountId,
    pub(crate) loos: LooStore,
    pub(crate) loo_max: LooId,
    pub(crate) num_deposit: u64,
    pub(crate) num_withdraw: u64,
}

impl Blockchain {
    /// Build the genesis state with the default configuration
    pub fn new(genesis: &Genesis) -> Result<Self> {
        Self::with_config(genesis, EngineConfig::default())
    }

    /// Build the genesis state
    pub fn with_config(genesis: &Genesis, config: EngineConfig) -> Result<Self> {
        let state = State::from_alloc(&genesis.account_alloc)?;
        let loos = LooStore::from_alloc(&genesis.loo_alloc)?;
        info!(
            "Genesis: {} accounts (max {}), {} left-over orders (max {})",
            state.len(),
            genesis.account_max,
            loos.len(),
            genesis.loo_max
        );
        Ok(Self {
            config,
            state,
            account_max: genesis.account_max,
            loos,
            loo_max: genesis.loo_max,
            num_deposit: 0,
            num_withdraw: 0,
        })
    }

    /// Apply every transaction of `block` in order, then credit the collected
    /// fees to the admin account.
    ///
    /// Fills in `block.state_hash` and `block.commitment` and returns one
    /// execution proof per transaction followed by the fee transfer proof.
    pub fn apply_mini_block(&mut self, block: &mut MiniBlock) -> Result<Vec<ProofBytes>> {
        let slots = self.config.txs_per_mini_block;
        let mut proofs = Vec::with_capacity(block.txs.len() + 1);
        let mut commitment_input = Vec::with_capacity(slots * ZK_MSG_SLOT_LEN);
        let mut total_fee = Amount::ZERO;

        for (index, tx) in block.txs.iter_mut().enumerate() {
            debug!("Applying tx {} ({:?})", index, tx.op_type());
            commitment_input.extend(self.zk_msg(tx)?);
            let (proof, fee) = self.execute_tx(tx)?;
            total_fee = total_fee
                .checked_add(fee)
                .ok_or(EngineError::ArithmeticOverflow("mini-block fee"))?;
            proofs.push(proof);
        }
        proofs.push(self.transfer_fee(total_fee)?);

        block.state_hash = self.state_data().hash();

        if block.txs.len() <= slots {
            let padded = slots * ZK_MSG_SLOT_LEN;
            if commitment_input.len() < padded {
                commitment_input.resize(padded, 0);
            }
        } else {
            warn!(
                "Mini-block has {} txs, more than {}; commitment input left unpadded",
                block.txs.len(),
                slots
            );
        }
        block.commitment = commitment(&commitment_input);

        info!(
            "Applied mini-block: {} txs, fee {}, state hash 0x{}, commitment 0x{}",
            block.txs.len(),
            total_fee,
            hex::encode(block.state_hash),
            hex::encode(block.commitment)
        );
        Ok(proofs)
    }

    /// Signed messages of `tx`, read from the state before it is applied
    fn zk_msg(&self, tx: &Transaction) -> Result<Vec<u8>> {
        Ok(match tx {
            Transaction::Settlement1(op) => settlement1_zk_msg(
                op,
                self.state.try_account(op.account1)?.pub_key(),
                self.state.try_account(op.account2)?.pub_key(),
            ),
            Transaction::Settlement2(op) => {
                let loo = self.loos.try_get(op.loo_id1)?;
                let account = self.state.try_account(op.account_id2)?;
                settlement2_zk_msg(op, loo.src_token, loo.dest_token, account.pub_key())
            }
            Transaction::Withdraw(op) => {
                withdraw_zk_msg(op, self.state.try_account(op.account_id)?.pub_key())
            }
            Transaction::Settlement3(_)
            | Transaction::Deposit(_)
            | Transaction::DepositToNew(_)
            | Transaction::Exit(_) => empty_slot(),
        })
    }

    /// Snapshot of the committed state
    pub fn state_data(&self) -> StateData {
        StateData {
            state_root: self.state.root(),
            loo_root: self.loos.root(),
            account_max: self.account_max,
            loo_max: self.loo_max,
        }
    }

    /// Get configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get account state
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Get left-over order store
    pub const fn loos(&self) -> &LooStore {
        &self.loos
    }

    /// Look up an account
    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.state.account(id)
    }

    /// Look up a left-over order
    pub fn loo(&self, id: LooId) -> Option<&LeftOverOrder> {
        self.loos.get(id)
    }

    /// Highest allocated account id
    pub const fn account_max(&self) -> AccountId {
        self.account_max
    }

    /// Highest allocated left-over order id
    pub const fn loo_max(&self) -> LooId {
        self.loo_max
    }

    /// Deposits applied so far, and the id the next one receives
    pub const fn num_deposit(&self) -> u64 {
        self.num_deposit
    }

    /// Withdrawals applied so far, and the id the next one receives
    pub const fn num_withdraw(&self) -> u64 {
        self.num_withdraw
    }
}
