//! Fraud-proof builder errors

use rollup_core::EngineError;
use rollup_smt::SmtError;
use thiserror::Error;

/// Why a dispute artifact could not be built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FraudProofError {
    /// Target index past the end of the list
    #[error("index {index} out of range for {len} entries")]
    IndexOutOfRange {
        /// Requested position
        index: usize,
        /// Entries available
        len: usize,
    },
    /// A block needs at least one mini-block
    #[error("block has no mini-blocks")]
    EmptyBlock,
    /// The mini-block count is carried in one byte
    #[error("{0} mini-blocks do not fit the one-byte count")]
    TooManyMiniBlocks(usize),
    /// Referenced state is missing
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Tree key outside the tree's range
    #[error(transparent)]
    Tree(#[from] SmtError),
}

/// Builder result alias
pub type Result<T, E = FraudProofError> = std::result::Result<T, E>;
