//! Dispute artifacts for the order-book rollup
//!
//! Builders here run after the fact over mini-blocks the engine already
//! applied:
//! - `block_info`: the pairwise hash fold and its inclusion proof
//! - `mini_block`: proofs locating a mini-block and its predecessor state
//! - `commitment`: plaintext fields needed to rebuild a commitment
//! - `exit`: submit-exit and complete-exit proofs
//! - `fraud`: the bundle a challenger submits

pub mod block_info;
pub mod commitment;
pub mod error;
pub mod exit;
pub mod fraud;
pub mod mini_block;

pub use block_info::{block_info_hash, block_info_proof, block_info_root};
pub use commitment::build_commitment_proof;
pub use error::{FraudProofError, Result};
pub use exit::{build_complete_exit, build_submit_exit_proof, CompleteExit};
pub use fraud::{FraudProof, SubmittedBlock};
pub use mini_block::{
    build_final_state_hash_proof, build_mini_block_proof, build_prev_state_hash_proof,
    mini_block_hashes,
};
