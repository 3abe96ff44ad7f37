//! Common types and fixed-point encodings

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

pub use rollup_smt::{Hash, ZERO_HASH};

/// Account identifier (state tree key)
pub type AccountId = u32;

/// Token identifier (balance tree key)
pub type TokenId = u16;

/// Left-over order identifier (LOO tree key)
pub type LooId = u64;

/// Token amounts, fees and rates
pub type Amount = U256;

/// Serialized execution proof handed to the on-chain verifier
pub type ProofBytes = Vec<u8>;

/// Depth of each account's balance tree
pub const ACCOUNT_TREE_DEPTH: usize = 11;

/// Depth of the global account tree
pub const STATE_TREE_DEPTH: usize = 33;

/// Depth of the left-over order tree
pub const LOO_TREE_DEPTH: usize = 45;

/// Token in which settlement and withdrawal fees are paid
pub const FEE_TOKEN_INDEX: TokenId = 0;

/// Account credited with the aggregated fees of every mini-block
pub const ADMIN_ACCOUNT_ID: AccountId = 0;

/// Nominal number of transactions committed per mini-block
pub const TXS_PER_MINI_BLOCK: usize = 4;

/// Size of one transaction's slot in the commitment input
pub const ZK_MSG_SLOT_LEN: usize = 128;

/// Fixed-point scale of order rates (1e18)
pub const PRECISION: Amount = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Largest value a 44-bit wire field can carry
pub(crate) const MASK_44: u64 = (1 << 44) - 1;

/// Largest value a 28-bit wire field can carry
pub(crate) const MASK_28: u32 = (1 << 28) - 1;

/// Largest value a 10-bit wire field can carry
pub(crate) const MASK_10: u16 = (1 << 10) - 1;

/// `mantissa * 10^exp` with a 32-bit mantissa, 40 bits on the wire
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedAmount {
    /// Significand
    pub mantissa: u32,
    /// Power of ten
    pub exp: u8,
}

impl PackedAmount {
    /// Encoded width
    pub const LEN: usize = 5;

    /// Create from its parts
    pub const fn new(mantissa: u32, exp: u8) -> Self {
        Self { mantissa, exp }
    }

    /// Expanded value, `None` if it does not fit in 256 bits
    pub fn value(&self) -> Option<Amount> {
        expand(u64::from(self.mantissa), self.exp)
    }

    /// Big-endian mantissa followed by the exponent byte
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..4].copy_from_slice(&self.mantissa.to_be_bytes());
        out[4] = self.exp;
        out
    }

    /// Inverse of [`Self::to_bytes`]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self {
            mantissa: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            exp: bytes[4],
        }
    }
}

/// `mantissa * 10^exp` with a 10-bit mantissa and 6-bit exponent packed in 16 bits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedFee {
    /// Significand, 10 bits used
    pub mantissa: u16,
    /// Power of ten, 6 bits used
    pub exp: u8,
}

impl PackedFee {
    /// Encoded width
    pub const LEN: usize = 2;

    /// Create from its parts
    pub const fn new(mantissa: u16, exp: u8) -> Self {
        Self { mantissa, exp }
    }

    /// Expanded value, `None` if it does not fit in 256 bits
    pub fn value(&self) -> Option<Amount> {
        expand(u64::from(self.mantissa), self.exp)
    }

    /// `mantissa << 6 | exp`
    pub const fn packed(&self) -> u16 {
        ((self.mantissa & MASK_10) << 6) | (self.exp as u16 & 0x3f)
    }

    /// Big-endian packed form
    pub const fn to_bytes(&self) -> [u8; Self::LEN] {
        self.packed().to_be_bytes()
    }

    /// Inverse of [`Self::to_bytes`]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        let packed = u16::from_be_bytes(bytes);
        Self { mantissa: packed >> 6, exp: (packed & 0x3f) as u8 }
    }
}

fn expand(mantissa: u64, exp: u8) -> Option<Amount> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .and_then(|scale| scale.checked_mul(U256::from(mantissa)))
}

/// Big-endian low 48 bits of `value`
pub fn u48_to_bytes(value: u64) -> [u8; 6] {
    let bytes = value.to_be_bytes();
    [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
}

/// Inverse of [`u48_to_bytes`]
pub const fn u48_from_bytes(bytes: [u8; 6]) -> u64 {
    u64::from_be_bytes([0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]])
}

/// 32-byte big-endian word of `amount`, the form balances take in the trees
pub fn amount_to_word(amount: &Amount) -> Hash {
    amount.to_be_bytes::<32>()
}

/// Inverse of [`amount_to_word`]
pub fn word_to_amount(word: &Hash) -> Amount {
    U256::from_be_bytes(*word)
}
