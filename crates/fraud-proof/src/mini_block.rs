//! Proofs locating a mini-block and its predecessor state inside a
//! submitted block

use rollup_core::{Hash, MiniBlock};
use tracing::debug;

use crate::block_info::{block_info_hash, block_info_proof};
use crate::error::{FraudProofError, Result};

/// [`MiniBlock::hash`] of every mini-block, in order
pub fn mini_block_hashes(blocks: &[MiniBlock]) -> Vec<Hash> {
    blocks.iter().map(MiniBlock::hash).collect()
}

fn block_len(blocks: &[MiniBlock]) -> Result<u8> {
    if blocks.is_empty() {
        return Err(FraudProofError::EmptyBlock);
    }
    u8::try_from(blocks.len()).map_err(|_| FraudProofError::TooManyMiniBlocks(blocks.len()))
}

/// Proof that `blocks[index]` belongs to the submitted block:
/// `blockInfoProof ‖ u32 timestamp ‖ u8 count ‖ last stateHash`
pub fn build_mini_block_proof(blocks: &[MiniBlock], index: usize, timestamp: u32) -> Result<Vec<u8>> {
    let count = block_len(blocks)?;
    let hashes = mini_block_hashes(blocks);
    let mut proof = block_info_proof(&hashes, index)?;
    proof.extend_from_slice(&timestamp.to_be_bytes());
    proof.push(count);
    proof.extend_from_slice(&blocks[blocks.len() - 1].state_hash);

    debug!("Built mini-block proof for {} of {}: {} bytes", index, count, proof.len());
    Ok(proof)
}

/// Proof of the state hash recorded by `blocks[index]`, the predecessor of
/// a disputed mini-block in the same block.
///
/// Layout: `commitment ‖ txRoot ‖ blockInfoProof`, the state hash itself
/// being supplied by the challenger.
pub fn build_prev_state_hash_proof(blocks: &[MiniBlock], index: usize) -> Result<Vec<u8>> {
    let block = blocks
        .get(index)
        .ok_or(FraudProofError::IndexOutOfRange { index, len: blocks.len() })?;
    let hashes = mini_block_hashes(blocks);

    let mut proof = Vec::with_capacity(64);
    proof.extend_from_slice(&block.commitment);
    proof.extend_from_slice(&block.tx_root());
    proof.extend(block_info_proof(&hashes, index)?);
    Ok(proof)
}

/// Proof of the final state hash of a whole block, used when the disputed
/// mini-block opens the following block:
/// `blockInfoHash ‖ u32 timestamp ‖ u8 count`
pub fn build_final_state_hash_proof(blocks: &[MiniBlock], timestamp: u32) -> Result<Vec<u8>> {
    let count = block_len(blocks)?;
    let hashes = mini_block_hashes(blocks);

    let mut proof = Vec::with_capacity(37);
    proof.extend_from_slice(&block_info_hash(&hashes));
    proof.extend_from_slice(&timestamp.to_be_bytes());
    proof.push(count);
    Ok(proof)
}
