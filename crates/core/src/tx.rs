//! Transaction variants and their fixed-width pubdata encodings
//!
//! Every encoding is big-endian and carries its opcode in the top nibble of
//! its first byte, so a concatenated mini-block body can be split without
//! extra framing.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::types::{
    u48_from_bytes, u48_to_bytes, AccountId, Amount, Hash, LooId, PackedAmount, PackedFee,
    TokenId, MASK_10, MASK_28, MASK_44,
};

/// Transaction opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpType {
    /// Empty slot
    NoOp = 0,
    /// Order × order, both sides may be partially filled
    Settlement11 = 1,
    /// Order × order, only side 2 may be partially filled
    Settlement12 = 2,
    /// Order × order, neither side may be partially filled
    Settlement13 = 3,
    /// Left-over order × order, the fresh order may be partially filled
    Settlement21 = 4,
    /// Left-over order × order, the fresh order must fill completely
    Settlement22 = 5,
    /// Left-over order × left-over order
    Settlement3 = 6,
    /// Deposit that opens a new account
    DepositToNew = 7,
    /// Deposit into an existing account
    Deposit = 8,
    /// Withdrawal to an L1 address
    Withdraw = 9,
    /// Forced exit of an account
    Exit = 10,
}

impl OpType {
    /// Number of pubdata bytes a transaction with this opcode occupies
    pub const fn encoded_len(self) -> usize {
        match self {
            Self::NoOp => 0,
            Self::Settlement11 | Self::Settlement12 | Self::Settlement13 => Settlement1::LEN,
            Self::Settlement21 | Self::Settlement22 => Settlement2::LEN,
            Self::Settlement3 => Settlement3::LEN,
            Self::DepositToNew | Self::Deposit => 6,
            Self::Withdraw => WithdrawOp::LEN,
            Self::Exit => ExitOp::LEN,
        }
    }
}

impl TryFrom<u8> for OpType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::NoOp,
            1 => Self::Settlement11,
            2 => Self::Settlement12,
            3 => Self::Settlement13,
            4 => Self::Settlement21,
            5 => Self::Settlement22,
            6 => Self::Settlement3,
            7 => Self::DepositToNew,
            8 => Self::Deposit,
            9 => Self::Withdraw,
            10 => Self::Exit,
            other => return Err(CodecError::UnknownOpType(other)),
        })
    }
}

/// Direct match of two signed orders
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement1 {
    /// One of `Settlement11`, `Settlement12`, `Settlement13`
    pub op_type: OpType,
    /// Token sold by side 1
    pub token1: TokenId,
    /// Token sold by side 2
    pub token2: TokenId,
    /// Account signing side 1
    pub account1: AccountId,
    /// Account signing side 2
    pub account2: AccountId,
    /// Price of side 1, scaled by 1e18
    pub rate1: PackedAmount,
    /// Price of side 2, scaled by 1e18
    pub rate2: PackedAmount,
    /// Amount offered by side 1
    pub amount1: PackedAmount,
    /// Amount offered by side 2
    pub amount2: PackedAmount,
    /// Full fee of side 1
    pub fee1: PackedFee,
    /// Full fee of side 2
    pub fee2: PackedFee,
    /// Start of side 1's validity window
    pub valid_since1: u32,
    /// Start of side 2's validity window
    pub valid_since2: u32,
    /// 28 bits on the wire
    pub valid_period1: u32,
    /// 28 bits on the wire
    pub valid_period2: u32,
}

/// Match of a stored left-over order with a fresh order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement2 {
    /// `Settlement21` or `Settlement22`
    pub op_type: OpType,
    /// 44 bits on the wire
    pub loo_id1: LooId,
    /// Account signing the fresh order
    pub account_id2: AccountId,
    /// Amount offered by the fresh order
    pub amount2: PackedAmount,
    /// Price of the fresh order, scaled by 1e18
    pub rate2: PackedAmount,
    /// Full fee of the fresh order
    pub fee2: PackedFee,
    /// Start of the fresh order's validity window
    pub valid_since2: u32,
    /// Only bits 27..4 are carried on the wire
    pub valid_period2: u32,
}

/// Match of two stored left-over orders
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement3 {
    /// Reference side, 44 bits on the wire
    pub loo_id1: LooId,
    /// Counter side, 44 bits on the wire
    pub loo_id2: LooId,
}

/// Credit to an existing account.
///
/// Only `deposit_id` travels in pubdata; the rest is known from the L1
/// deposit queue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositOp {
    /// Credited account
    pub account_id: AccountId,
    /// Credited token
    pub token_id: TokenId,
    /// Credited amount
    pub amount: Amount,
    /// Assigned by the engine when applied
    pub deposit_id: u64,
}

/// Deposit that allocates the next account id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositToNewOp {
    /// Public key of the new account
    pub pub_key: Vec<u8>,
    /// Withdrawal address of the new account
    pub withdraw_to: Address,
    /// Initial token
    pub token_id: TokenId,
    /// Initial balance
    pub amount: Amount,
    /// Assigned by the engine when applied
    pub deposit_id: u64,
}

/// Withdrawal of one token to an L1 address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOp {
    /// Withdrawn token, 10 bits on the wire
    pub token_id: TokenId,
    /// Withdrawn amount
    pub amount: PackedAmount,
    /// L1 recipient
    pub dest_addr: Address,
    /// Debited account
    pub account_id: AccountId,
    /// Signing time
    pub valid_since: u32,
    /// Fee in the fee token
    pub fee: PackedFee,
    /// Assigned by the engine when applied, not part of pubdata
    pub withdraw_id: u64,
}

/// Forced exit, freezing the account's balance root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitOp {
    /// Exiting account
    pub account_id: AccountId,
    /// Balance root at exit time, captured by the engine
    pub account_root: Hash,
}

/// A rollup transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    /// [`Settlement1`]
    Settlement1(Settlement1),
    /// [`Settlement2`]
    Settlement2(Settlement2),
    /// [`Settlement3`]
    Settlement3(Settlement3),
    /// [`DepositOp`]
    Deposit(DepositOp),
    /// [`DepositToNewOp`]
    DepositToNew(DepositToNewOp),
    /// [`WithdrawOp`]
    Withdraw(WithdrawOp),
    /// [`ExitOp`]
    Exit(ExitOp),
}

impl Transaction {
    /// Opcode this transaction is encoded with
    pub const fn op_type(&self) -> OpType {
        match self {
            Self::Settlement1(op) => op.op_type,
            Self::Settlement2(op) => op.op_type,
            Self::Settlement3(_) => OpType::Settlement3,
            Self::Deposit(_) => OpType::Deposit,
            Self::DepositToNew(_) => OpType::DepositToNew,
            Self::Withdraw(_) => OpType::Withdraw,
            Self::Exit(_) => OpType::Exit,
        }
    }

    /// Canonical pubdata
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Settlement1(op) => op.to_bytes(),
            Self::Settlement2(op) => op.to_bytes(),
            Self::Settlement3(op) => op.to_bytes(),
            Self::Deposit(op) => deposit_bytes(OpType::Deposit, op.deposit_id).to_vec(),
            Self::DepositToNew(op) => deposit_bytes(OpType::DepositToNew, op.deposit_id).to_vec(),
            Self::Withdraw(op) => op.to_bytes(),
            Self::Exit(op) => op.to_bytes(),
        }
    }

    /// Decode the transaction at the start of `bytes`, returning it together
    /// with the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let first = *bytes.first().ok_or(CodecError::UnexpectedEnd { needed: 1, remaining: 0 })?;
        let op_type = OpType::try_from(first >> 4)?;
        let len = op_type.encoded_len();
        if bytes.len() < len {
            return Err(CodecError::UnexpectedEnd { needed: len, remaining: bytes.len() });
        }

        let mut reader = Reader::new(&bytes[..len]);
        let tx = match op_type {
            OpType::NoOp => return Err(CodecError::NoOp),
            OpType::Settlement11 | OpType::Settlement12 | OpType::Settlement13 => {
                Self::Settlement1(Settlement1::read(&mut reader)?)
            }
            OpType::Settlement21 | OpType::Settlement22 => {
                Self::Settlement2(Settlement2::read(&mut reader)?)
            }
            OpType::Settlement3 => Self::Settlement3(Settlement3::read(&mut reader)?),
            OpType::Deposit => Self::Deposit(DepositOp {
                deposit_id: u48_from_bytes(reader.take()?) & MASK_44,
                ..Default::default()
            }),
            OpType::DepositToNew => Self::DepositToNew(DepositToNewOp {
                deposit_id: u48_from_bytes(reader.take()?) & MASK_44,
                ..Default::default()
            }),
            OpType::Withdraw => Self::Withdraw(WithdrawOp::read(&mut reader)?),
            OpType::Exit => Self::Exit(ExitOp::read(&mut reader)?),
        };
        Ok((tx, len))
    }

    /// Decode exactly one transaction
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (tx, used) = Self::decode(bytes)?;
        match bytes.len() - used {
            0 => Ok(tx),
            trailing => Err(CodecError::TrailingBytes(trailing)),
        }
    }

    /// Split a concatenated mini-block body into its transactions
    pub fn decode_all(mut bytes: &[u8]) -> Result<Vec<Self>, CodecError> {
        let mut txs = Vec::new();
        while !bytes.is_empty() {
            let (tx, used) = Self::decode(bytes)?;
            txs.push(tx);
            bytes = &bytes[used..];
        }
        Ok(txs)
    }
}

macro_rules! impl_from_op {
    ($($op:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$op> for Transaction {
                fn from(op: $op) -> Self {
                    Self::$variant(op)
                }
            }
        )*
    };
}

impl_from_op! {
    Settlement1 => Settlement1,
    Settlement2 => Settlement2,
    Settlement3 => Settlement3,
    DepositOp => Deposit,
    DepositToNewOp => DepositToNew,
    WithdrawOp => Withdraw,
    ExitOp => Exit,
}

impl Settlement1 {
    /// Encoded width
    pub const LEN: usize = 50;

    /// 3-byte head (opcode, token1, token2), then the per-side fields, then
    /// both 28-bit validity periods packed into 7 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        let head = (u32::from(self.op_type as u8) << 20)
            | (u32::from(self.token1 & MASK_10) << 10)
            | u32::from(self.token2 & MASK_10);
        out.extend_from_slice(&head.to_be_bytes()[1..]);
        out.extend_from_slice(&self.account1.to_be_bytes());
        out.extend_from_slice(&self.account2.to_be_bytes());
        out.extend_from_slice(&self.amount1.to_bytes());
        out.extend_from_slice(&self.amount2.to_bytes());
        out.extend_from_slice(&self.rate1.to_bytes());
        out.extend_from_slice(&self.rate2.to_bytes());
        out.extend_from_slice(&self.fee1.to_bytes());
        out.extend_from_slice(&self.fee2.to_bytes());
        out.extend_from_slice(&self.valid_since1.to_be_bytes());
        out.extend_from_slice(&self.valid_since2.to_be_bytes());
        let periods = (u64::from(self.valid_period1 & MASK_28) << 28)
            | u64::from(self.valid_period2 & MASK_28);
        out.extend_from_slice(&periods.to_be_bytes()[1..]);
        out
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let [h0, h1, h2] = reader.take()?;
        let head = u32::from_be_bytes([0, h0, h1, h2]);
        let op_type = OpType::try_from((head >> 20) as u8)?;
        let token1 = (head >> 10) as u16 & MASK_10;
        let token2 = head as u16 & MASK_10;
        let account1 = u32::from_be_bytes(reader.take()?);
        let account2 = u32::from_be_bytes(reader.take()?);
        let amount1 = PackedAmount::from_bytes(reader.take()?);
        let amount2 = PackedAmount::from_bytes(reader.take()?);
        let rate1 = PackedAmount::from_bytes(reader.take()?);
        let rate2 = PackedAmount::from_bytes(reader.take()?);
        let fee1 = PackedFee::from_bytes(reader.take()?);
        let fee2 = PackedFee::from_bytes(reader.take()?);
        let valid_since1 = u32::from_be_bytes(reader.take()?);
        let valid_since2 = u32::from_be_bytes(reader.take()?);
        let [p0, p1, p2, p3, p4, p5, p6] = reader.take()?;
        let periods = u64::from_be_bytes([0, p0, p1, p2, p3, p4, p5, p6]);
        Ok(Self {
            op_type,
            token1,
            token2,
            account1,
            account2,
            rate1,
            rate2,
            amount1,
            amount2,
            fee1,
            fee2,
            valid_since1,
            valid_since2,
            valid_period1: (periods >> 28) as u32 & MASK_28,
            valid_period2: periods as u32 & MASK_28,
        })
    }
}

impl Settlement2 {
    /// Encoded width
    pub const LEN: usize = 29;

    /// Fixed-width pubdata
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        let head = (u64::from(self.op_type as u8) << 44) | (self.loo_id1 & MASK_44);
        out.extend_from_slice(&u48_to_bytes(head));
        out.extend_from_slice(&self.account_id2.to_be_bytes());
        out.extend_from_slice(&self.amount2.to_bytes());
        out.extend_from_slice(&self.rate2.to_bytes());
        out.extend_from_slice(&self.fee2.to_bytes());
        out.extend_from_slice(&self.valid_since2.to_be_bytes());
        let period = (self.valid_period2 & MASK_28) >> 4;
        out.extend_from_slice(&period.to_be_bytes()[1..]);
        out
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let head = u48_from_bytes(reader.take()?);
        let op_type = OpType::try_from((head >> 44) as u8)?;
        let account_id2 = u32::from_be_bytes(reader.take()?);
        let amount2 = PackedAmount::from_bytes(reader.take()?);
        let rate2 = PackedAmount::from_bytes(reader.take()?);
        let fee2 = PackedFee::from_bytes(reader.take()?);
        let valid_since2 = u32::from_be_bytes(reader.take()?);
        let [p0, p1, p2] = reader.take()?;
        Ok(Self {
            op_type,
            loo_id1: head & MASK_44,
            account_id2,
            amount2,
            rate2,
            fee2,
            valid_since2,
            valid_period2: u32::from_be_bytes([0, p0, p1, p2]) << 4,
        })
    }
}

impl Settlement3 {
    /// Encoded width
    pub const LEN: usize = 12;

    /// Fixed-width pubdata
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        let head = (u64::from(OpType::Settlement3 as u8) << 44) | (self.loo_id1 & MASK_44);
        out.extend_from_slice(&u48_to_bytes(head));
        out.extend_from_slice(&u48_to_bytes((self.loo_id2 & MASK_44) << 4));
        out
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let loo_id1 = u48_from_bytes(reader.take()?) & MASK_44;
        let loo_id2 = u48_from_bytes(reader.take()?) >> 4;
        Ok(Self { loo_id1, loo_id2 })
    }
}

fn deposit_bytes(op_type: OpType, deposit_id: u64) -> [u8; 6] {
    u48_to_bytes((u64::from(op_type as u8) << 44) | (deposit_id & MASK_44))
}

impl WithdrawOp {
    /// Encoded width
    pub const LEN: usize = 37;

    /// Fixed-width pubdata
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        let head = (u16::from(OpType::Withdraw as u8) << 12) | ((self.token_id & MASK_10) << 2);
        out.extend_from_slice(&head.to_be_bytes());
        out.extend_from_slice(&self.amount.to_bytes());
        out.extend_from_slice(self.dest_addr.as_slice());
        out.extend_from_slice(&self.account_id.to_be_bytes());
        out.extend_from_slice(&self.valid_since.to_be_bytes());
        out.extend_from_slice(&self.fee.to_bytes());
        out
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let head = u16::from_be_bytes(reader.take()?);
        let amount = PackedAmount::from_bytes(reader.take()?);
        let dest_addr = Address::from(reader.take::<20>()?);
        let account_id = u32::from_be_bytes(reader.take()?);
        let valid_since = u32::from_be_bytes(reader.take()?);
        let fee = PackedFee::from_bytes(reader.take()?);
        Ok(Self {
            token_id: (head >> 2) & MASK_10,
            amount,
            dest_addr,
            account_id,
            valid_since,
            fee,
            withdraw_id: 0,
        })
    }
}

impl ExitOp {
    /// Encoded width
    pub const LEN: usize = 37;

    /// Fixed-width pubdata
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.push((OpType::Exit as u8) << 4);
        out.extend_from_slice(&self.account_id.to_be_bytes());
        out.extend_from_slice(&self.account_root);
        out
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let [_op] = reader.take()?;
        let account_id = u32::from_be_bytes(reader.take()?);
        let account_root = reader.take()?;
        Ok(Self { account_id, account_root })
    }
}

/// Cursor over a fixed-size pubdata record
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        if self.bytes.len() < N {
            return Err(CodecError::UnexpectedEnd { needed: N, remaining: self.bytes.len() });
        }
        let (head, rest) = self.bytes.split_at(N);
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        self.bytes = rest;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample_settlement1() -> Settlement1 {
        Settlement1 {
            op_type: OpType::Settlement11,
            token1: 1,
            token2: 2,
            account1: 14,
            account2: 15,
            rate1: PackedAmount::new(1, 18),
            rate2: PackedAmount::new(2, 17),
            amount1: PackedAmount::new(2, 14),
            amount2: PackedAmount::new(3, 13),
            fee1: PackedFee::new(1, 6),
            fee2: PackedFee::new(2, 7),
            valid_since1: 1600331441,
            valid_since2: 1600331442,
            valid_period1: 86400,
            valid_period2: 86401,
        }
    }

    #[test]
    fn test_settlement1_layout() {
        let op = sample_settlement1();
        let bytes = op.to_bytes();
        assert_eq!(bytes.len(), Settlement1::LEN);
        // opcode 1, token1 1, token2 2
        assert_eq!(hex::encode(&bytes[..3]), "100402");
        assert_eq!(hex::encode(&bytes[3..11]), "0000000e0000000f");
        // 86400 << 28 | 86401 over 7 bytes
        assert_eq!(hex::encode(&bytes[43..]), "00151800015181");

        let decoded = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, Transaction::Settlement1(op));
    }

    #[test]
    fn test_settlement2_roundtrip() {
        let op = Settlement2 {
            op_type: OpType::Settlement21,
            loo_id1: 34,
            account_id2: 45,
            amount2: PackedAmount::new(2, 16),
            rate2: PackedAmount::new(5, 19),
            fee2: PackedFee::new(2, 6),
            valid_since2: 1605323952,
            valid_period2: 268430000,
        };
        let bytes = op.to_bytes();
        assert_eq!(bytes.len(), Settlement2::LEN);
        assert_eq!(hex::encode(&bytes[..6]), "400000000022");
        assert_eq!(Transaction::from_bytes(&bytes).unwrap(), Transaction::Settlement2(op));
    }

    #[test]
    fn test_settlement2_drops_low_period_nibble() {
        let op = Settlement2 {
            op_type: OpType::Settlement22,
            loo_id1: 1,
            account_id2: 2,
            amount2: PackedAmount::new(1, 0),
            rate2: PackedAmount::new(1, 18),
            fee2: PackedFee::default(),
            valid_since2: 0,
            valid_period2: 0x0abc_def7,
        };
        let Transaction::Settlement2(decoded) = Transaction::from_bytes(&op.to_bytes()).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(decoded.valid_period2, 0x0abc_def0);
    }

    #[test]
    fn test_settlement3_layout() {
        let op = Settlement3 { loo_id1: 1, loo_id2: 2 };
        let bytes = op.to_bytes();
        assert_eq!(hex::encode(&bytes), "600000000001000000000020");
        assert_eq!(Transaction::from_bytes(&bytes).unwrap(), Transaction::Settlement3(op));
    }

    #[test]
    fn test_deposit_pubdata_carries_only_id() {
        let op = DepositOp { account_id: 8, token_id: 2, amount: Amount::from(45242000u64), deposit_id: 3 };
        let bytes = Transaction::from(op).to_bytes();
        assert_eq!(hex::encode(&bytes), "800000000003");

        let Transaction::Deposit(decoded) = Transaction::from_bytes(&bytes).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(decoded.deposit_id, 3);
        assert_eq!(Transaction::Deposit(decoded).to_bytes(), bytes);

        let new_account = DepositToNewOp { deposit_id: 9, ..Default::default() };
        assert_eq!(hex::encode(Transaction::from(new_account).to_bytes()), "700000000009");
    }

    #[test]
    fn test_withdraw_and_exit_roundtrip() {
        let withdraw = WithdrawOp {
            token_id: 7,
            amount: PackedAmount::new(314, 2),
            dest_addr: Address::repeat_byte(0x85),
            account_id: 13,
            valid_since: 1607871567,
            fee: PackedFee::new(5, 4),
            withdraw_id: 0,
        };
        let bytes = withdraw.to_bytes();
        assert_eq!(bytes.len(), WithdrawOp::LEN);
        assert_eq!(hex::encode(&bytes[..2]), "901c");

        let exit = ExitOp { account_id: 23, account_root: [0xab; 32] };
        assert_eq!(exit.to_bytes()[0], 0xa0);

        let mut body = bytes.clone();
        body.extend_from_slice(&exit.to_bytes());
        let txs = Transaction::decode_all(&body).unwrap();
        assert_eq!(txs, vec![Transaction::Withdraw(withdraw), Transaction::Exit(exit)]);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(Transaction::decode(&[]), Err(CodecError::UnexpectedEnd { needed: 1, remaining: 0 }));
        assert_eq!(Transaction::decode(&[0xf0]), Err(CodecError::UnknownOpType(15)));
        assert_eq!(Transaction::decode(&[0x00; 8]), Err(CodecError::NoOp));
        assert_eq!(
            Transaction::decode(&[0x60, 0, 0]),
            Err(CodecError::UnexpectedEnd { needed: 12, remaining: 3 })
        );

        let mut bytes = Settlement3 { loo_id1: 5, loo_id2: 6 }.to_bytes();
        bytes.push(0);
        assert_eq!(Transaction::from_bytes(&bytes), Err(CodecError::TrailingBytes(1)));
    }
    fn packed_amount() -> impl Strategy<Value = PackedAmount> {
        (any::<u32>(), any::<u8>()).prop_map(|(mantissa, exp)| PackedAmount::new(mantissa, exp))
    }

    fn packed_fee() -> impl Strategy<Value = PackedFee> {
        (0u16..1 << 10, 0u8..1 << 6).prop_map(|(mantissa, exp)| PackedFee::new(mantissa, exp))
    }

    fn roundtrip(tx: &Transaction) -> Transaction {
        let bytes = tx.to_bytes();
        assert_eq!(bytes.len(), tx.op_type().encoded_len());
        Transaction::from_bytes(&bytes).unwrap()
    }

    proptest! {
        #[test]
        fn settlement1_roundtrips(
            op_type in prop_oneof![
                Just(OpType::Settlement11),
                Just(OpType::Settlement12),
                Just(OpType::Settlement13),
            ],
            tokens in (0u16..1 << 10, 0u16..1 << 10),
            accounts in any::<(u32, u32)>(),
            amounts in (packed_amount(), packed_amount()),
            rates in (packed_amount(), packed_amount()),
            fees in (packed_fee(), packed_fee()),
            valid_since in any::<(u32, u32)>(),
            periods in (0u32..1 << 28, 0u32..1 << 28),
        ) {
            let tx = Transaction::Settlement1(Settlement1 {
                op_type,
                token1: tokens.0,
                token2: tokens.1,
                account1: accounts.0,
                account2: accounts.1,
                rate1: rates.0,
                rate2: rates.1,
                amount1: amounts.0,
                amount2: amounts.1,
                fee1: fees.0,
                fee2: fees.1,
                valid_since1: valid_since.0,
                valid_since2: valid_since.1,
                valid_period1: periods.0,
                valid_period2: periods.1,
            });
            prop_assert_eq!(roundtrip(&tx), tx);
        }

        #[test]
        fn settlement2_roundtrips(
            partial in any::<bool>(),
            loo_id1 in 0u64..1 << 44,
            account_id2 in any::<u32>(),
            amount2 in packed_amount(),
            rate2 in packed_amount(),
            fee2 in packed_fee(),
            valid_since2 in any::<u32>(),
            period in 0u32..1 << 24,
            nibble in 0u32..16,
        ) {
            let op_type = if partial { OpType::Settlement21 } else { OpType::Settlement22 };
            let op = Settlement2 {
                op_type,
                loo_id1,
                account_id2,
                amount2,
                rate2,
                fee2,
                valid_since2,
                valid_period2: period << 4,
            };
            let tx = Transaction::Settlement2(op.clone());
            prop_assert_eq!(roundtrip(&tx), tx);

            // only bits 27..4 of the period travel
            let noisy = Settlement2 { valid_period2: (period << 4) | nibble, ..op.clone() };
            prop_assert_eq!(roundtrip(&noisy.into()), Transaction::Settlement2(op));
        }

        #[test]
        fn settlement3_and_exit_roundtrip(
            loo_id1 in 0u64..1 << 44,
            loo_id2 in 0u64..1 << 44,
            account_id in any::<u32>(),
            account_root in any::<[u8; 32]>(),
        ) {
            let tx = Transaction::Settlement3(Settlement3 { loo_id1, loo_id2 });
            prop_assert_eq!(roundtrip(&tx), tx);

            let tx = Transaction::Exit(ExitOp { account_id, account_root });
            prop_assert_eq!(roundtrip(&tx), tx);
        }

        #[test]
        fn withdraw_roundtrips(
            token_id in 0u16..1 << 10,
            amount in packed_amount(),
            dest_addr in any::<[u8; 20]>(),
            account_id in any::<u32>(),
            valid_since in any::<u32>(),
            fee in packed_fee(),
        ) {
            let tx = Transaction::Withdraw(WithdrawOp {
                token_id,
                amount,
                dest_addr: Address::from(dest_addr),
                account_id,
                valid_since,
                fee,
                withdraw_id: 0,
            });
            prop_assert_eq!(roundtrip(&tx), tx);
        }

        #[test]
        fn deposit_ids_roundtrip(deposit_id in 0u64..1 << 44, new_account in any::<bool>()) {
            let tx = if new_account {
                Transaction::DepositToNew(DepositToNewOp { deposit_id, ..Default::default() })
            } else {
                Transaction::Deposit(DepositOp { deposit_id, ..Default::default() })
            };
            prop_assert_eq!(roundtrip(&tx), tx);
        }
    }
}
