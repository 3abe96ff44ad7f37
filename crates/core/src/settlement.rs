//! Order matching arithmetic
//!
//! Amounts are integers, rates are scaled by [`PRECISION`]. The order with
//! the earlier (or equal) `valid_since` sets the price: its full amount is
//! converted at its own rate, and when that would exceed the counter order
//! the counter order is filled completely instead and the reference side's
//! input is rounded up.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::loo::LeftOverOrder;
use crate::types::{Amount, PRECISION};

/// One side of a match with every packed value expanded
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Amount offered
    pub amount: Amount,
    /// Units of the counter token per unit offered, scaled by 1e18
    pub rate: Amount,
    /// Full fee for filling the whole order
    pub fee: Amount,
    /// Start of the validity window, the earlier side sets the price
    pub valid_since: u32,
}

impl From<&LeftOverOrder> for Order {
    fn from(loo: &LeftOverOrder) -> Self {
        Self { amount: loo.amount, rate: loo.rate, fee: loo.fee, valid_since: loo.valid_since }
    }
}

/// Outcome of matching two orders
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Amount side 1 gives up
    pub amount1: Amount,
    /// Amount side 2 gives up
    pub amount2: Amount,
    /// Fee charged to side 1
    pub fee1: Amount,
    /// Fee charged to side 2
    pub fee2: Amount,
}

impl Fill {
    /// Sum of both fees
    pub fn total_fee(&self) -> Result<Amount> {
        self.fee1.checked_add(self.fee2).ok_or(EngineError::ArithmeticOverflow("settlement fee"))
    }
}

/// `floor(amount * rate / 1e18)`
pub fn cal_amount_out(amount: Amount, rate: Amount) -> Result<Amount> {
    let scaled = amount.checked_mul(rate).ok_or(EngineError::ArithmeticOverflow("amount out"))?;
    Ok(scaled / PRECISION)
}

/// `ceil(amount_out * 1e18 / rate)`, the smallest input that buys `amount_out`
pub fn cal_amount_in(amount_out: Amount, rate: Amount) -> Result<Amount> {
    if rate.is_zero() {
        return Err(EngineError::DivisionByZero("amount in"));
    }
    let scaled =
        amount_out.checked_mul(PRECISION).ok_or(EngineError::ArithmeticOverflow("amount in"))?;
    let (quotient, remainder) = scaled.div_rem(rate);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(Amount::from(1u8)).ok_or(EngineError::ArithmeticOverflow("amount in"))
    }
}

/// Fee owed for filling `filled` out of `original`.
///
/// A partial fill pays `floor(fee * filled / original)`, a complete one the
/// whole fee.
pub fn prorate_fee(fee: Amount, filled: Amount, original: Amount) -> Result<Amount> {
    if filled >= original {
        return Ok(fee);
    }
    let scaled = fee.checked_mul(filled).ok_or(EngineError::ArithmeticOverflow("fee"))?;
    Ok(scaled / original)
}

/// Match two orders
pub fn match_orders(order1: &Order, order2: &Order) -> Result<Fill> {
    let (amount1, amount2) = if order1.valid_since <= order2.valid_since {
        let amount2 = cal_amount_out(order1.amount, order1.rate)?;
        if amount2 > order2.amount {
            (cal_amount_in(order2.amount, order1.rate)?, order2.amount)
        } else {
            (order1.amount, amount2)
        }
    } else {
        let amount1 = cal_amount_out(order2.amount, order2.rate)?;
        if amount1 > order1.amount {
            (order1.amount, cal_amount_in(order1.amount, order2.rate)?)
        } else {
            (amount1, order2.amount)
        }
    };

    Ok(Fill {
        amount1,
        amount2,
        fee1: prorate_fee(order1.fee, amount1, order1.amount)?,
        fee2: prorate_fee(order2.fee, amount2, order2.amount)?,
    })
}

/// What is left of `order` after giving up `filled` and paying `fee`,
/// `None` if it was filled completely
pub(crate) fn remainder(order: &Order, filled: Amount, fee: Amount) -> Option<(Amount, Amount)> {
    (filled < order.amount).then(|| (order.amount - filled, order.fee.saturating_sub(fee)))
}
