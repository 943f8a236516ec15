use eodstypecrate::types::Delegator;
use fixed::types::I80F48;
use tracing::debug;

use crate::{
    check, math_error,
    prelude::{DelegationError, DelegationResult, ValidatorAccount},
    utils::{mul_div, saturating_debit},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Credit,
    Debit,
}

/// Whether a delegator balance change also moves the delegator's fee ledger.
/// Rewards and penalties accrue fees, slashing does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeAccrual {
    Accrue,
    Skip,
}

/// How a debit against active stake was absorbed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ActiveDebit {
    pub operator: I80F48,
    pub delegators: I80F48,
    /// Part of the debit exceeding the whole effective balance
    pub unabsorbed: I80F48,
}

impl ValidatorAccount {
    /// Credits a protocol reward to the operator and delegators by their current quotas.
    /// Every delegator's fee ledger accrues `fee_quotient` of its credit.
    pub fn apply_reward(&mut self, amount: I80F48) -> DelegationResult {
        check!(
            amount > I80F48::ZERO,
            DelegationError::InvalidAmount,
            "Reward amount: {}",
            amount
        );

        self.transact(|account| {
            let operator_share = amount
                .checked_mul(account.operator_quota())
                .ok_or_else(math_error!())?;
            let delegator_share = amount
                .checked_sub(operator_share)
                .ok_or_else(math_error!())?;

            account.change_operator_balance(operator_share)?;
            account.change_total_delegated_balance(delegator_share)?;
            account.distribute_to_delegators(
                delegator_share,
                BalanceChange::Credit,
                FeeAccrual::Accrue,
            )?;

            debug!(
                "Reward {} applied, operator share: {}, delegator share: {}",
                amount, operator_share, delegator_share
            );

            Ok(())
        })
    }

    /// Debits a protocol penalty from the operator and delegators by their current quotas.
    /// Every delegator's fee ledger gives back `fee_quotient` of its debit. Quotas are left
    /// as they are.
    pub fn apply_penalty(&mut self, amount: I80F48) -> DelegationResult {
        check!(
            amount > I80F48::ZERO,
            DelegationError::InvalidAmount,
            "Penalty amount: {}",
            amount
        );

        let effective_balance = self.effective_balance()?;
        check!(
            amount <= effective_balance,
            DelegationError::InsufficientBalance {
                requested: amount,
                available: effective_balance,
            }
        );

        self.transact(|account| {
            let debit = account.debit_active_stake(amount, FeeAccrual::Accrue)?;

            // Delegated stake wiped out entirely, the operator holds the whole quota again.
            if account.total_delegated_balance() == I80F48::ZERO {
                account.recompute_quotas_internal()?;
            }

            debug!(
                "Penalty {} applied, operator share: {}, delegator share: {}",
                amount, debit.operator, debit.delegators
            );

            Ok(())
        })
    }

    /// Splits `amount` between operator and delegators by the current operator quota and
    /// debits both sides. A side that cannot cover its share passes the remainder to the
    /// other side, anything neither side can cover is reported as unabsorbed.
    pub(crate) fn debit_active_stake(
        &mut self,
        amount: I80F48,
        fee_accrual: FeeAccrual,
    ) -> DelegationResult<ActiveDebit> {
        let operator_balance = self.operator_balance();
        let total_delegated_balance = self.total_delegated_balance();

        let operator_share = amount
            .checked_mul(self.operator_quota())
            .ok_or_else(math_error!())?;
        let (_, operator_remainder) = saturating_debit(operator_balance, operator_share)?;
        let mut operator_debit = operator_share
            .checked_sub(operator_remainder)
            .ok_or_else(math_error!())?;

        let delegator_share = amount
            .checked_sub(operator_debit)
            .ok_or_else(math_error!())?;
        let (_, delegator_remainder) =
            saturating_debit(total_delegated_balance, delegator_share)?;
        let delegator_debit = delegator_share
            .checked_sub(delegator_remainder)
            .ok_or_else(math_error!())?;

        let mut unabsorbed = I80F48::ZERO;
        if delegator_remainder > I80F48::ZERO {
            let operator_left = operator_balance
                .checked_sub(operator_debit)
                .ok_or_else(math_error!())?;
            let (_, left_over) = saturating_debit(operator_left, delegator_remainder)?;
            operator_debit = operator_debit
                .checked_add(delegator_remainder)
                .and_then(|debit| debit.checked_sub(left_over))
                .ok_or_else(math_error!())?;
            unabsorbed = left_over;
        }

        self.change_operator_balance(-operator_debit)?;
        self.change_total_delegated_balance(-delegator_debit)?;
        self.distribute_to_delegators(delegator_debit, BalanceChange::Debit, fee_accrual)?;

        Ok(ActiveDebit {
            operator: operator_debit,
            delegators: delegator_debit,
            unabsorbed,
        })
    }

    /// Spreads `amount` over the delegators in proportion to their quotas, normalized by the
    /// delegators' combined quota. The individual changes add up to exactly `amount`: the last
    /// delegator with a quota takes the rounding remainder, and debits a delegator cannot cover
    /// are taken from the others in index order.
    pub(crate) fn distribute_to_delegators(
        &mut self,
        amount: I80F48,
        change: BalanceChange,
        fee_accrual: FeeAccrual,
    ) -> DelegationResult {
        if amount == I80F48::ZERO {
            return Ok(());
        }

        let delegators_quota = I80F48::ONE
            .checked_sub(self.operator_quota())
            .ok_or_else(math_error!())?;
        check!(
            delegators_quota > I80F48::ZERO,
            DelegationError::InvariantViolation("delegator share without delegator quota"),
            "Undistributed delegator amount: {}",
            amount
        );

        let fee_quotient = self.fee_quotient();
        let last_index = self
            .delegators
            .iter()
            .filter(|(_, delegator)| delegator.quota.to_fixed() > I80F48::ZERO)
            .map(|(index, _)| *index)
            .next_back();

        let mut unassigned = amount;
        for (index, delegator) in self.delegators.iter_mut() {
            let quota: I80F48 = delegator.quota.into();
            if quota == I80F48::ZERO {
                continue;
            }

            let portion = if Some(*index) == last_index {
                unassigned
            } else {
                mul_div(amount, quota, delegators_quota)?.min(unassigned)
            };
            let applied =
                change_delegator_balance(delegator, portion, change, fee_accrual, fee_quotient)?;
            unassigned = unassigned
                .checked_sub(applied)
                .ok_or_else(math_error!())?;
        }

        if change == BalanceChange::Debit {
            for delegator in self.delegators.values_mut() {
                if unassigned == I80F48::ZERO {
                    break;
                }

                let applied = change_delegator_balance(
                    delegator,
                    unassigned,
                    change,
                    fee_accrual,
                    fee_quotient,
                )?;
                unassigned = unassigned
                    .checked_sub(applied)
                    .ok_or_else(math_error!())?;
            }
        }

        check!(
            unassigned == I80F48::ZERO,
            DelegationError::InvariantViolation("delegator share not fully distributed"),
            "Undistributed delegator amount: {}",
            unassigned
        );

        Ok(())
    }
}

/// Credits or debits `amount` to one delegator, the debit bounded by its delegated balance.
/// Returns the amount actually moved.
fn change_delegator_balance(
    delegator: &mut Delegator,
    amount: I80F48,
    change: BalanceChange,
    fee_accrual: FeeAccrual,
    fee_quotient: I80F48,
) -> DelegationResult<I80F48> {
    let delegated_balance: I80F48 = delegator.delegated_balance.into();

    let (delegated_balance, applied, fee_delta) = match change {
        BalanceChange::Credit => (
            delegated_balance
                .checked_add(amount)
                .ok_or_else(math_error!())?,
            amount,
            amount,
        ),
        BalanceChange::Debit => {
            let (remaining, _) = saturating_debit(delegated_balance, amount)?;
            let debited = delegated_balance
                .checked_sub(remaining)
                .ok_or_else(math_error!())?;
            (remaining, debited, -debited)
        }
    };
    delegator.delegated_balance = delegated_balance.into();

    if fee_accrual == FeeAccrual::Accrue {
        let fee_ledger: I80F48 = delegator.fee_ledger.into();
        let fee = fee_delta
            .checked_mul(fee_quotient)
            .ok_or_else(math_error!())?;
        delegator.fee_ledger = fee_ledger.checked_add(fee).ok_or_else(math_error!())?.into();
    }

    Ok(applied)
}
