//! Fixed-depth sparse Merkle tree for rollup state commitment
//!
//! - Keys are `depth`-bit unsigned integers, walked from the most significant bit.
//! - Untouched subtrees are the all-zero hash and are never materialized.
//! - Parent digest is `keccak256(left ‖ right)`, except that two zero
//!   children yield zero (see [`get_root`]).
//! - Nodes live in an arena addressed by index.

mod error;
mod hasher;
mod proof;
mod tree;

pub use error::SmtError;
pub use hasher::{get_root, Keccak256Hasher};
pub use proof::{BatchProof, SmtProof};
pub use tree::SparseMerkleTree;

/// 32-byte digest
pub type Hash = [u8; 32];

/// Digest of an empty subtree or an unset leaf
pub const ZERO_HASH: Hash = [0u8; 32];

/// Deepest tree supported (keys are `u64`)
pub const MAX_DEPTH: usize = 64;
