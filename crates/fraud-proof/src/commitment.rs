//! Commitment-reconstruction proof
//!
//! The commitment of a mini-block hashes messages built from account and
//! left-over order fields that the block pubdata does not carry. This proof
//! re-emits those fields, read from the post-block state, so a verifier can
//! rebuild the commitment itself.

use rollup_core::{AccountId, Blockchain, MiniBlock, ProofWriter, Transaction};
use tracing::debug;

use crate::error::Result;

fn write_account(chain: &Blockchain, id: AccountId, out: &mut ProofWriter) -> Result<()> {
    let account = chain.state().try_account(id)?;
    let path = chain.state().account_proof(id)?;
    out.u32(id)
        .bytes(account.pub_key())
        .bytes(account.withdraw_to().as_slice())
        .hash(&account.balance_root())
        .siblings(&path);
    Ok(())
}

/// Build the proof for every transaction of `block`, against `chain` as it
/// stands after the block was applied.
///
/// Per transaction:
/// - Settlement1: both accounts
/// - Settlement2: the fresh order's account, then LOO bytes ‖ u48 LOO id ‖
///   LOO siblings
/// - Withdraw: the withdrawing account
///
/// where an account entry is `u32 id ‖ pubKey ‖ withdrawTo ‖ balanceRoot ‖
/// account siblings`. Other transactions contribute nothing.
pub fn build_commitment_proof(chain: &Blockchain, block: &MiniBlock) -> Result<Vec<u8>> {
    let mut out = ProofWriter::new();
    for tx in &block.txs {
        match tx {
            Transaction::Settlement1(op) => {
                write_account(chain, op.account1, &mut out)?;
                write_account(chain, op.account2, &mut out)?;
            }
            Transaction::Settlement2(op) => {
                write_account(chain, op.account_id2, &mut out)?;
                let loo = chain.loos().try_get(op.loo_id1)?;
                let path = chain.loos().proof(op.loo_id1)?;
                out.bytes(&loo.to_bytes()).u48(op.loo_id1).siblings(&path);
            }
            Transaction::Withdraw(op) => write_account(chain, op.account_id, &mut out)?,
            Transaction::Settlement3(_)
            | Transaction::Deposit(_)
            | Transaction::DepositToNew(_)
            | Transaction::Exit(_) => {}
        }
    }

    debug!("Built commitment proof over {} txs: {} bytes", block.tx_count(), out.len());
    Ok(out.finish())
}
