//! Assembled dispute bundle

use rollup_core::{MiniBlock, ProofBytes, StateData};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::mini_block::{
    build_final_state_hash_proof, build_mini_block_proof, build_prev_state_hash_proof,
};

/// Mini-blocks of one submitted block and the timestamp it was submitted with
#[derive(Clone, Copy, Debug)]
pub struct SubmittedBlock<'a> {
    /// Mini-blocks in order, already applied
    pub mini_blocks: &'a [MiniBlock],
    /// Submission timestamp
    pub timestamp: u32,
}

/// Everything a challenger submits to dispute one mini-block
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudProof {
    /// State data before the disputed mini-block
    pub prev_state_data: StateData,
    /// Proves `prev_state_data` was committed, empty when the predecessor
    /// is genesis
    pub prev_state_hash_proof: Vec<u8>,
    /// Locates the disputed mini-block in its block
    pub mini_block_proof: Vec<u8>,
    /// Execution proofs of the disputed mini-block's transactions
    pub execution_proof: Vec<ProofBytes>,
}

impl FraudProof {
    /// Assemble the bundle disputing `block.mini_blocks[index]`.
    ///
    /// The predecessor state is proven inside `block` for a non-zero index,
    /// by the final state hash of `previous` otherwise, and left unproven
    /// when there is no previous block.
    pub fn build(
        prev_state_data: StateData,
        previous: Option<SubmittedBlock<'_>>,
        block: SubmittedBlock<'_>,
        index: usize,
        execution_proof: Vec<ProofBytes>,
    ) -> Result<Self> {
        let mini_block_proof = build_mini_block_proof(block.mini_blocks, index, block.timestamp)?;
        let prev_state_hash_proof = match (index, previous) {
            (0, Some(prev)) => build_final_state_hash_proof(prev.mini_blocks, prev.timestamp)?,
            (0, None) => Vec::new(),
            _ => build_prev_state_hash_proof(block.mini_blocks, index - 1)?,
        };

        info!(
            "Assembled fraud proof for mini-block {} of {} ({} execution proofs)",
            index,
            block.mini_blocks.len(),
            execution_proof.len()
        );
        Ok(Self { prev_state_data, prev_state_hash_proof, mini_block_proof, execution_proof })
    }
}
