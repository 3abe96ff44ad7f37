//! Left-over orders

use serde::{Deserialize, Serialize};

use crate::types::{amount_to_word, AccountId, Amount, Hash, TokenId};
use rollup_smt::Keccak256Hasher;

/// Unfilled remainder of a partially matched order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeftOverOrder {
    /// Owner
    pub account_id: AccountId,
    /// Token the owner still sells
    pub src_token: TokenId,
    /// Token the owner buys
    pub dest_token: TokenId,
    /// Remaining sell amount
    pub amount: Amount,
    /// Remaining fee
    pub fee: Amount,
    /// Rate of the original order, scaled by 1e18
    pub rate: Amount,
    /// Start of the validity window of the original order
    pub valid_since: u32,
    /// Length of the validity window of the original order
    pub valid_period: u32,
}

impl LeftOverOrder {
    /// Width of [`Self::to_bytes`]
    pub const ENCODED_LEN: usize = 4 + 2 + 2 + 32 * 3 + 4 + 4;

    /// `u32 account ‖ u16 src ‖ u16 dest ‖ amount ‖ fee ‖ rate ‖ u32 validSince ‖ u32 validPeriod`,
    /// big amounts as 32-byte words
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN);
        out.extend_from_slice(&self.account_id.to_be_bytes());
        out.extend_from_slice(&self.src_token.to_be_bytes());
        out.extend_from_slice(&self.dest_token.to_be_bytes());
        out.extend_from_slice(&amount_to_word(&self.amount));
        out.extend_from_slice(&amount_to_word(&self.fee));
        out.extend_from_slice(&amount_to_word(&self.rate));
        out.extend_from_slice(&self.valid_since.to_be_bytes());
        out.extend_from_slice(&self.valid_period.to_be_bytes());
        out
    }

    /// Leaf value in the LOO tree
    pub fn hash(&self) -> Hash {
        Keccak256Hasher::hash(&self.to_bytes())
    }
}
