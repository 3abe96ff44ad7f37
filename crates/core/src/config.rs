//! Configuration

use serde::{Deserialize, Serialize};
use std::env;

use crate::types::{AccountId, TokenId, ADMIN_ACCOUNT_ID, FEE_TOKEN_INDEX, TXS_PER_MINI_BLOCK};

/// Engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Token in which fees are charged and collected
    pub fee_token: TokenId,
    /// Account receiving the aggregated fee of each mini-block
    pub admin_account: AccountId,
    /// Transactions per mini-block the commitment input is padded for
    pub txs_per_mini_block: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_token: FEE_TOKEN_INDEX,
            admin_account: ADMIN_ACCOUNT_ID,
            txs_per_mini_block: TXS_PER_MINI_BLOCK,
        }
    }
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults for
    /// anything absent or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fee_token: env::var("ROLLUP_FEE_TOKEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fee_token),
            admin_account: env::var("ROLLUP_ADMIN_ACCOUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.admin_account),
            txs_per_mini_block: env::var("ROLLUP_TXS_PER_MINI_BLOCK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.txs_per_mini_block),
        }
    }
}
