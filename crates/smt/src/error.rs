use thiserror::Error;

/// Errors raised by tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmtError {
    /// The key has bits set above the tree depth.
    #[error("key {key} does not fit in a tree of depth {depth}")]
    KeyOutOfRange {
        /// Offending key
        key: u64,
        /// Depth of the tree that rejected it
        depth: usize,
    },
}
