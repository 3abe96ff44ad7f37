//! Per-transaction handlers
//!
//! Each handler mutates the state and returns the execution proof of every
//! tree read and write it performed, together with the fee it collected.

use tracing::debug;

use crate::account::Account;
use crate::blockchain::Blockchain;
use crate::error::{EngineError, Result};
use crate::loo::LeftOverOrder;
use crate::proof::ProofWriter;
use crate::settlement::{match_orders, remainder, Fill, Order};
use crate::tx::{
    DepositOp, DepositToNewOp, ExitOp, Settlement1, Settlement2, Settlement3, Transaction,
    WithdrawOp,
};
use crate::types::{
    word_to_amount, AccountId, Amount, LooId, PackedAmount, PackedFee, ProofBytes, TokenId,
    ZERO_HASH,
};

/// One balance mutation
#[derive(Clone, Copy, Debug)]
enum BalanceChange {
    Credit(TokenId, Amount),
    Debit(TokenId, Amount),
}

/// What identifies the owner in a balance proof
#[derive(Clone, Copy, Debug)]
enum OwnerField {
    /// `keccak(pubKey ‖ withdrawTo)`
    PubAccountHash,
    /// `pubKey ‖ withdrawTo` in clear
    PubKeyAndAddress,
}

fn amount_value(amount: PackedAmount, what: &'static str) -> Result<Amount> {
    amount.value().ok_or(EngineError::ArithmeticOverflow(what))
}

fn fee_value(fee: PackedFee, what: &'static str) -> Result<Amount> {
    fee.value().ok_or(EngineError::ArithmeticOverflow(what))
}

impl Blockchain {
    /// Apply one transaction, returning its proof and the fee it collected
    pub(crate) fn execute_tx(&mut self, tx: &mut Transaction) -> Result<(ProofBytes, Amount)> {
        match tx {
            Transaction::Settlement1(op) => self.handle_settlement1(op),
            Transaction::Settlement2(op) => self.handle_settlement2(op),
            Transaction::Settlement3(op) => self.handle_settlement3(op),
            Transaction::Deposit(op) => Ok((self.handle_deposit(op)?, Amount::ZERO)),
            Transaction::DepositToNew(op) => Ok((self.handle_deposit_to_new(op)?, Amount::ZERO)),
            Transaction::Withdraw(op) => self.handle_withdraw(op),
            Transaction::Exit(op) => Ok((self.handle_exit(op)?, Amount::ZERO)),
        }
    }

    fn handle_deposit(&mut self, op: &mut DepositOp) -> Result<ProofBytes> {
        let mut proof = ProofWriter::new();
        self.update_balances(
            &mut proof,
            op.account_id,
            OwnerField::PubAccountHash,
            &[BalanceChange::Credit(op.token_id, op.amount)],
        )?;
        proof.u32(op.account_id).u16(op.token_id).amount(&op.amount);

        op.deposit_id = self.num_deposit;
        self.num_deposit += 1;
        debug!("Deposit {} of token {} to account {}", op.amount, op.token_id, op.account_id);
        Ok(proof.finish())
    }

    fn handle_deposit_to_new(&mut self, op: &mut DepositToNewOp) -> Result<ProofBytes> {
        let account_id = self
            .account_max
            .checked_add(1)
            .ok_or(EngineError::ArithmeticOverflow("account id"))?;
        if self.state.contains(account_id) {
            return Err(EngineError::AccountExists(account_id));
        }
        let siblings = self.state.account_proof(account_id)?;

        let mut account = Account::new(op.pub_key.clone(), op.withdraw_to);
        account.update(op.token_id, &op.amount)?;
        self.state.insert(account_id, account)?;
        self.account_max = account_id;

        let mut proof = ProofWriter::new();
        proof
            .bytes(&op.pub_key)
            .bytes(op.withdraw_to.as_slice())
            .u16(op.token_id)
            .amount(&op.amount)
            .siblings(&siblings);

        op.deposit_id = self.num_deposit;
        self.num_deposit += 1;
        debug!("Opened account {} with {} of token {}", account_id, op.amount, op.token_id);
        Ok(proof.finish())
    }

    fn handle_settlement1(&mut self, op: &Settlement1) -> Result<(ProofBytes, Amount)> {
        let order1 = Order {
            amount: amount_value(op.amount1, "amount1")?,
            rate: amount_value(op.rate1, "rate1")?,
            fee: fee_value(op.fee1, "fee1")?,
            valid_since: op.valid_since1,
        };
        let order2 = Order {
            amount: amount_value(op.amount2, "amount2")?,
            rate: amount_value(op.rate2, "rate2")?,
            fee: fee_value(op.fee2, "fee2")?,
            valid_since: op.valid_since2,
        };
        let fill = match_orders(&order1, &order2)?;

        let mut proof = ProofWriter::new();
        self.settle(&mut proof, (op.account1, op.token1), (op.account2, op.token2), &fill)?;

        let left_over = if let Some((amount, fee)) = remainder(&order1, fill.amount1, fill.fee1) {
            Some(LeftOverOrder {
                account_id: op.account1,
                src_token: op.token1,
                dest_token: op.token2,
                amount,
                fee,
                rate: order1.rate,
                valid_since: op.valid_since1,
                valid_period: op.valid_period1,
            })
        } else {
            remainder(&order2, fill.amount2, fill.fee2).map(|(amount, fee)| LeftOverOrder {
                account_id: op.account2,
                src_token: op.token2,
                dest_token: op.token1,
                amount,
                fee,
                rate: order2.rate,
                valid_since: op.valid_since2,
                valid_period: op.valid_period2,
            })
        };
        if let Some(loo) = left_over {
            self.append_loo(&mut proof, loo)?;
        }

        Ok((proof.finish(), fill.total_fee()?))
    }

    fn handle_settlement2(&mut self, op: &Settlement2) -> Result<(ProofBytes, Amount)> {
        let loo = self.loos.try_get(op.loo_id1)?.clone();
        let loo_path = self.loos.proof(op.loo_id1)?;

        let mut proof = ProofWriter::new();
        proof.bytes(&loo.to_bytes()).siblings(&loo_path);

        let order1 = Order::from(&loo);
        let order2 = Order {
            amount: amount_value(op.amount2, "amount2")?,
            rate: amount_value(op.rate2, "rate2")?,
            fee: fee_value(op.fee2, "fee2")?,
            valid_since: op.valid_since2,
        };
        let fill = match_orders(&order1, &order2)?;

        self.settle(
            &mut proof,
            (loo.account_id, loo.src_token),
            (op.account_id2, loo.dest_token),
            &fill,
        )?;
        self.shrink_loo(op.loo_id1, fill.amount1, fill.fee1)?;

        if let Some((amount, fee)) = remainder(&order2, fill.amount2, fill.fee2) {
            let fresh = LeftOverOrder {
                account_id: op.account_id2,
                src_token: loo.dest_token,
                dest_token: loo.src_token,
                amount,
                fee,
                rate: order2.rate,
                valid_since: op.valid_since2,
                valid_period: op.valid_period2,
            };
            self.append_loo(&mut proof, fresh)?;
        }

        Ok((proof.finish(), fill.total_fee()?))
    }

    fn handle_settlement3(&mut self, op: &Settlement3) -> Result<(ProofBytes, Amount)> {
        let loo1 = self.loos.try_get(op.loo_id1)?.clone();
        let loo2 = self.loos.try_get(op.loo_id2)?.clone();

        let mut proof = ProofWriter::new();
        proof.bytes(&loo1.to_bytes()).bytes(&loo2.to_bytes());

        let fill = match_orders(&Order::from(&loo1), &Order::from(&loo2))?;

        // Both orders shrink in place and stay in the store even when emptied.
        proof.siblings(&self.loos.proof(op.loo_id1)?);
        self.shrink_loo(op.loo_id1, fill.amount1, fill.fee1)?;
        proof.siblings(&self.loos.proof(op.loo_id2)?);
        self.shrink_loo(op.loo_id2, fill.amount2, fill.fee2)?;

        self.settle(
            &mut proof,
            (loo1.account_id, loo1.src_token),
            (loo2.account_id, loo2.src_token),
            &fill,
        )?;

        Ok((proof.finish(), fill.total_fee()?))
    }

    fn handle_withdraw(&mut self, op: &mut WithdrawOp) -> Result<(ProofBytes, Amount)> {
        let amount = amount_value(op.amount, "withdraw amount")?;
        let fee = fee_value(op.fee, "withdraw fee")?;
        let fee_token = self.config.fee_token;

        let mut proof = ProofWriter::new();
        self.update_balances(
            &mut proof,
            op.account_id,
            OwnerField::PubKeyAndAddress,
            &[BalanceChange::Debit(op.token_id, amount), BalanceChange::Debit(fee_token, fee)],
        )?;

        op.withdraw_id = self.num_withdraw;
        self.num_withdraw += 1;
        debug!("Withdraw {} of token {} from account {}", amount, op.token_id, op.account_id);
        Ok((proof.finish(), fee))
    }

    fn handle_exit(&mut self, op: &mut ExitOp) -> Result<ProofBytes> {
        let account = self.state.try_account(op.account_id)?;
        let balance_root = account.balance_root();
        let pub_account_hash = account.pub_account_hash();
        let account_path = self.state.account_proof(op.account_id)?;

        let mut proof = ProofWriter::new();
        proof.hash(&balance_root).hash(&pub_account_hash).siblings(&account_path);

        // The balance tree is kept so the owner can later prove each token
        // against the captured root.
        self.state
            .set_leaf(op.account_id, Account::digest_with_root(&ZERO_HASH, &pub_account_hash))?;
        self.state.try_account_mut(op.account_id)?.confirm_exit();
        op.account_root = balance_root;

        debug!("Account {} exited with balance root 0x{}", op.account_id, hex::encode(balance_root));
        Ok(proof.finish())
    }

    /// Credit the fees collected over a mini-block to the admin account
    pub(crate) fn transfer_fee(&mut self, fee: Amount) -> Result<ProofBytes> {
        let admin = self.config.admin_account;
        if !self.state.contains(admin) {
            return Err(EngineError::MissingAdminAccount(admin));
        }

        let mut proof = ProofWriter::new();
        self.update_balances(
            &mut proof,
            admin,
            OwnerField::PubAccountHash,
            &[BalanceChange::Credit(self.config.fee_token, fee)],
        )?;
        Ok(proof.finish())
    }

    /// Move both sides' balances of a match.
    ///
    /// Side 1 gives `amount1` of its token, receives `amount2` of side 2's
    /// token and pays `fee1`, side 2 the mirror image.
    fn settle(
        &mut self,
        proof: &mut ProofWriter,
        (account1, token1): (AccountId, TokenId),
        (account2, token2): (AccountId, TokenId),
        fill: &Fill,
    ) -> Result<()> {
        let fee_token = self.config.fee_token;
        self.update_balances(
            proof,
            account1,
            OwnerField::PubAccountHash,
            &[
                BalanceChange::Debit(token1, fill.amount1),
                BalanceChange::Credit(token2, fill.amount2),
                BalanceChange::Debit(fee_token, fill.fee1),
            ],
        )?;
        self.update_balances(
            proof,
            account2,
            OwnerField::PubAccountHash,
            &[
                BalanceChange::Debit(token2, fill.amount2),
                BalanceChange::Credit(token1, fill.amount1),
                BalanceChange::Debit(fee_token, fill.fee2),
            ],
        )
    }

    /// Apply `changes` to one account in order, recording
    /// `account siblings ‖ owner ‖ (balance before ‖ token siblings)*`
    fn update_balances(
        &mut self,
        proof: &mut ProofWriter,
        account_id: AccountId,
        owner: OwnerField,
        changes: &[BalanceChange],
    ) -> Result<()> {
        let account_path = self.state.account_proof(account_id)?;
        let account = self.state.try_account_mut(account_id)?;

        proof.siblings(&account_path);
        match owner {
            OwnerField::PubAccountHash => proof.hash(&account.pub_account_hash()),
            OwnerField::PubKeyAndAddress => {
                proof.bytes(account.pub_key()).bytes(account.withdraw_to().as_slice())
            }
        };

        for change in changes {
            let (BalanceChange::Credit(token, amount) | BalanceChange::Debit(token, amount)) =
                *change;
            let path = account.balance_proof(token)?;
            let before = word_to_amount(&path.value);
            let after = match change {
                BalanceChange::Credit(..) => before
                    .checked_add(amount)
                    .ok_or(EngineError::ArithmeticOverflow("balance"))?,
                BalanceChange::Debit(..) => before.checked_sub(amount).ok_or(
                    EngineError::InsufficientBalance {
                        account: account_id,
                        token,
                        balance: before,
                        required: amount,
                    },
                )?,
            };
            proof.leaf_and_siblings(&path);
            account.update(token, &after)?;
        }

        let digest = account.digest();
        self.state.set_leaf(account_id, digest)
    }

    /// Store `loo` at the next free id, recording its empty slot's siblings
    fn append_loo(&mut self, proof: &mut ProofWriter, loo: LeftOverOrder) -> Result<()> {
        let id = self
            .loo_max
            .checked_add(1)
            .ok_or(EngineError::ArithmeticOverflow("left-over order id"))?;
        proof.siblings(&self.loos.proof(id)?);
        debug!("Left-over order {} for account {}: {} remaining", id, loo.account_id, loo.amount);
        self.loos.insert(id, loo)?;
        self.loo_max = id;
        Ok(())
    }

    /// Reduce a stored order by what a match consumed
    fn shrink_loo(&mut self, id: LooId, filled: Amount, fee: Amount) -> Result<()> {
        let loo = self.loos.try_get_mut(id)?;
        loo.amount = loo
            .amount
            .checked_sub(filled)
            .ok_or(EngineError::ArithmeticOverflow("left-over amount"))?;
        loo.fee =
            loo.fee.checked_sub(fee).ok_or(EngineError::ArithmeticOverflow("left-over fee"))?;
        self.loos.refresh(id)
    }
}
