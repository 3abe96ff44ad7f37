//! Mini-block commitment input
//!
//! Each settlement side and each withdrawal is packed into a 32-byte message
//! in the external circuit's bit order, followed by the signer's public key
//! with its bytes reversed. A transaction's messages fill one or more
//! 128-byte slots; the commitment is the SHA-256 of all slots.

use sha2::{Digest, Sha256};

use crate::tx::{OpType, Settlement1, Settlement2, WithdrawOp};
use crate::types::{AccountId, Hash, PackedAmount, PackedFee, TokenId, ZK_MSG_SLOT_LEN};

const ORDER_TAG: u8 = 1;
const WITHDRAW_TAG: u8 = OpType::Withdraw as u8;
const MSG_LEN: usize = 32;
const PARTIAL_FILL_FLAG: u8 = 0x80;

/// Order fields signed by one settlement side
#[derive(Clone, Copy, Debug)]
pub struct OrderMsg {
    pub account_id: AccountId,
    pub src_token: TokenId,
    pub dst_token: TokenId,
    pub amount: PackedAmount,
    pub rate: PackedAmount,
    pub valid_since: u32,
    pub valid_period: u32,
    pub fee: PackedFee,
    /// Whether the order may leave a remainder
    pub partially_fillable: bool,
}

impl OrderMsg {
    /// Plain 32-byte message, before any bit reordering.
    ///
    /// `tag ‖ u32 account ‖ amount ‖ rate ‖ u32 validSince ‖ u64 word ‖ flag`,
    /// zero padded, where the word is
    /// `validPeriod << 36 | fee << 20 | src << 10 | dst`.
    pub fn to_bytes(&self) -> [u8; MSG_LEN] {
        let word = (u64::from(self.valid_period) << 36)
            | (u64::from(self.fee.packed()) << 20)
            | (u64::from(self.src_token) << 10)
            | u64::from(self.dst_token);

        let mut out = [0u8; MSG_LEN];
        out[0] = ORDER_TAG;
        out[1..5].copy_from_slice(&self.account_id.to_be_bytes());
        out[5..10].copy_from_slice(&self.amount.to_bytes());
        out[10..15].copy_from_slice(&self.rate.to_bytes());
        out[15..19].copy_from_slice(&self.valid_since.to_be_bytes());
        out[19..27].copy_from_slice(&word.to_be_bytes());
        out[27] = if self.partially_fillable { PARTIAL_FILL_FLAG } else { 0 };
        out
    }
}

/// Reverse the bit order inside every byte
pub fn reverse_bits_each_byte(data: &[u8]) -> Vec<u8> {
    data.iter().map(|byte| byte.reverse_bits()).collect()
}

/// Reverse the byte order
pub fn reverse_bytes(data: &[u8]) -> Vec<u8> {
    data.iter().rev().copied().collect()
}

fn push_signed(out: &mut Vec<u8>, msg: &[u8], pub_key: &[u8]) {
    out.extend(msg.iter().map(|byte| byte.reverse_bits()));
    out.extend(pub_key.iter().rev());
}

/// Zero-pad to the next multiple of the slot size
fn pad_to_slots(mut out: Vec<u8>) -> Vec<u8> {
    let slots = out.len().div_ceil(ZK_MSG_SLOT_LEN).max(1);
    out.resize(slots * ZK_MSG_SLOT_LEN, 0);
    out
}

/// Both sides of a direct order match.
///
/// Side 1 may be partially filled only under `Settlement11`, side 2 under
/// anything but `Settlement13`.
pub fn settlement1_zk_msg(op: &Settlement1, pub_key1: &[u8], pub_key2: &[u8]) -> Vec<u8> {
    let side1 = OrderMsg {
        account_id: op.account1,
        src_token: op.token1,
        dst_token: op.token2,
        amount: op.amount1,
        rate: op.rate1,
        valid_since: op.valid_since1,
        valid_period: op.valid_period1,
        fee: op.fee1,
        partially_fillable: op.op_type == OpType::Settlement11,
    };
    let side2 = OrderMsg {
        account_id: op.account2,
        src_token: op.token2,
        dst_token: op.token1,
        amount: op.amount2,
        rate: op.rate2,
        valid_since: op.valid_since2,
        valid_period: op.valid_period2,
        fee: op.fee2,
        partially_fillable: op.op_type != OpType::Settlement13,
    };

    let mut out = Vec::with_capacity(2 * ZK_MSG_SLOT_LEN);
    push_signed(&mut out, &side1.to_bytes(), pub_key1);
    push_signed(&mut out, &side2.to_bytes(), pub_key2);
    pad_to_slots(out)
}

/// The fresh order of a left-over-order match. It trades the LOO's tokens
/// in the opposite direction.
pub fn settlement2_zk_msg(
    op: &Settlement2,
    loo_src_token: TokenId,
    loo_dst_token: TokenId,
    pub_key: &[u8],
) -> Vec<u8> {
    let order = OrderMsg {
        account_id: op.account_id2,
        src_token: loo_dst_token,
        dst_token: loo_src_token,
        amount: op.amount2,
        rate: op.rate2,
        valid_since: op.valid_since2,
        valid_period: op.valid_period2,
        fee: op.fee2,
        partially_fillable: op.op_type == OpType::Settlement21,
    };

    let mut out = Vec::with_capacity(ZK_MSG_SLOT_LEN);
    push_signed(&mut out, &order.to_bytes(), pub_key);
    pad_to_slots(out)
}

/// A withdrawal: `9 ‖ u32 account ‖ amount ‖ u32 validSince ‖ u32 word`
/// with `word = token << 22 | feeMantissa << 12 | feeExp << 6`
pub fn withdraw_zk_msg(op: &WithdrawOp, pub_key: &[u8]) -> Vec<u8> {
    let word = (u32::from(op.token_id) << 22)
        | (u32::from(op.fee.mantissa) << 12)
        | (u32::from(op.fee.exp) << 6);

    let mut msg = [0u8; MSG_LEN];
    msg[0] = WITHDRAW_TAG;
    msg[1..5].copy_from_slice(&op.account_id.to_be_bytes());
    msg[5..10].copy_from_slice(&op.amount.to_bytes());
    msg[10..14].copy_from_slice(&op.valid_since.to_be_bytes());
    msg[14..18].copy_from_slice(&word.to_be_bytes());

    let mut out = Vec::with_capacity(ZK_MSG_SLOT_LEN);
    push_signed(&mut out, &msg, pub_key);
    pad_to_slots(out)
}

/// Contribution of a transaction that signs nothing
pub fn empty_slot() -> Vec<u8> {
    vec![0u8; ZK_MSG_SLOT_LEN]
}

/// SHA-256 of the commitment input
pub fn commitment(input: &[u8]) -> Hash {
    Sha256::digest(input).into()
}
