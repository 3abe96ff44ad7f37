//! Engine and codec errors

use rollup_smt::SmtError;
use thiserror::Error;

use crate::types::{AccountId, Amount, LooId, TokenId};

/// Failure to decode a transaction from its pubdata bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input ended inside a transaction
    #[error("unexpected end of input: need {needed} bytes, {remaining} left")]
    UnexpectedEnd {
        /// Bytes the transaction needs
        needed: usize,
        /// Bytes left in the input
        remaining: usize,
    },
    /// Opcode nibble outside the known set
    #[error("unknown op type {0}")]
    UnknownOpType(u8),
    /// Opcode 0 has no encoding
    #[error("no-op carries no pubdata")]
    NoOp,
    /// Input continued after a single transaction
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
}

/// Invariant violations that abort a mini-block.
///
/// These indicate a malformed block, never an expected runtime condition.
/// After one is returned the [`Blockchain`](crate::Blockchain) holds partially
/// applied state and must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Referenced account id is unallocated
    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),
    /// A new account would overwrite an existing one
    #[error("account {0} already exists")]
    AccountExists(AccountId),
    /// Referenced left-over order id is unallocated
    #[error("left-over order {0} does not exist")]
    UnknownLeftOverOrder(LooId),
    /// The fee recipient is missing from state
    #[error("admin account {0} does not exist")]
    MissingAdminAccount(AccountId),
    /// A subtraction would underflow a balance
    #[error("account {account} holds {balance} of token {token}, needs {required}")]
    InsufficientBalance {
        /// Debited account
        account: AccountId,
        /// Debited token
        token: TokenId,
        /// Balance before the debit
        balance: Amount,
        /// Amount the debit asked for
        required: Amount,
    },
    /// A packed value or an intermediate product exceeded 256 bits
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
    /// An order rate of zero was used as a divisor
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),
    /// Tree key outside the tree's range
    #[error(transparent)]
    Tree(#[from] SmtError),
}

/// Engine result alias
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
