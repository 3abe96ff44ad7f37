//! Exit proofs
//!
//! Leaving the rollup is two steps on the settlement layer. Submitting an
//! exit proves the account's leaf against the state data hash; completing
//! it proves token balances against the balance root fixed by the first
//! step.

use rollup_core::{AccountId, Amount, Blockchain, Hash, ProofWriter, TokenId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Build the submit-exit proof for `account_id`.
///
/// Returns the account's balance root and `pubKey ‖ account siblings ‖
/// looRoot ‖ u32 accountMax ‖ u48 looMax`.
pub fn build_submit_exit_proof(chain: &Blockchain, account_id: AccountId) -> Result<(Hash, Vec<u8>)> {
    let account = chain.state().try_account(account_id)?;
    let path = chain.state().account_proof(account_id)?;

    let mut out = ProofWriter::new();
    out.bytes(account.pub_key())
        .siblings(&path)
        .hash(&chain.loos().root())
        .u32(chain.account_max())
        .u48(chain.loo_max());

    Ok((account.balance_root(), out.finish()))
}

/// Balances of an exiting account with one batch proof against its balance
/// root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteExit {
    /// Proven tokens, ascending and unique
    pub token_ids: Vec<TokenId>,
    /// Balance of each token
    pub amounts: Vec<Amount>,
    /// Batch proof siblings, bottom-up
    pub siblings: Vec<Hash>,
}

/// Build the complete-exit proof for `token_ids` of `account_id`
pub fn build_complete_exit(
    chain: &Blockchain,
    account_id: AccountId,
    token_ids: &[TokenId],
) -> Result<CompleteExit> {
    let account = chain.state().try_account(account_id)?;
    let keys: Vec<u64> = token_ids.iter().map(|&token| u64::from(token)).collect();
    let batch = account.balance_tree().get_proof_batch(&keys)?;

    let token_ids: Vec<TokenId> = batch.keys.iter().map(|&key| key as TokenId).collect();
    let amounts = token_ids
        .iter()
        .map(|&token| account.balance(token))
        .collect::<rollup_core::Result<Vec<_>>>()?;

    debug!(
        "Built complete-exit proof for account {}: {} tokens, {} siblings",
        account_id,
        token_ids.len(),
        batch.siblings.len()
    );
    Ok(CompleteExit { token_ids, amounts, siblings: batch.siblings })
}
