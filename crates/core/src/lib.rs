//! Rollup state-transition engine
//!
//! This crate contains the execution logic of the order-book rollup:
//! - Transaction pubdata codecs and packed numeric types
//! - Account, left-over order and state stores committed in sparse Merkle trees
//! - Order matching and the per-transaction handlers emitting execution proofs
//! - Mini-block application with its state hash and SHA-256 commitment

pub mod account;
pub mod block;
pub mod blockchain;
pub mod commitment;
pub mod config;
pub mod error;
mod executor;
pub mod loo;
pub mod proof;
pub mod settlement;
pub mod state;
pub mod tx;
pub mod types;

pub use account::Account;
pub use block::MiniBlock;
pub use blockchain::Blockchain;
pub use config::EngineConfig;
pub use error::{CodecError, EngineError, Result};
pub use loo::LeftOverOrder;
pub use proof::ProofWriter;
pub use state::{Genesis, GenesisAccount, LooStore, State, StateData};
pub use tx::{
    DepositOp, DepositToNewOp, ExitOp, OpType, Settlement1, Settlement2, Settlement3,
    Transaction, WithdrawOp,
};
pub use types::*;
