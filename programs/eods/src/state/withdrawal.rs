use eodstypecrate::types::{DelegatorIndex, Epoch, ExitId};
use fixed::types::I80F48;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    check, math_error,
    prelude::{DelegationError, DelegationResult, ValidatorAccount},
    utils::mul_div,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WithdrawalReceipt {
    pub delegator_index: DelegatorIndex,
    /// Set when the withdrawal settled a queued exit
    pub exit_id: Option<ExitId>,
    pub amount: I80F48,
    /// Fee ledger share that came due with the withdrawal, may be negative
    pub fee_realized: I80F48,
    /// Fee actually paid to the operator, `fee_realized` bounded to `[0, amount]`
    pub fee_charged: I80F48,
    /// Amount released to the delegator, `amount - fee_charged`
    pub released: I80F48,
}

impl WithdrawalReceipt {
    fn empty(delegator_index: DelegatorIndex) -> Self {
        WithdrawalReceipt {
            delegator_index,
            exit_id: None,
            amount: I80F48::ZERO,
            fee_realized: I80F48::ZERO,
            fee_charged: I80F48::ZERO,
            released: I80F48::ZERO,
        }
    }
}

impl ValidatorAccount {
    /// Withdraws `amount` straight from a delegator's active stake, realizing the matching
    /// share of its fee ledger. The fee goes to the operator, the rest to the delegator's
    /// liquid balance. A zero amount is a no-op.
    pub fn settle_withdrawal(
        &mut self,
        delegator_index: DelegatorIndex,
        amount: I80F48,
    ) -> DelegationResult<WithdrawalReceipt> {
        check!(
            !amount.is_negative(),
            DelegationError::InvalidAmount,
            "Withdrawal amount: {}",
            amount
        );

        let delegator = self
            .delegator(delegator_index)
            .ok_or(DelegationError::DelegatorNotFound(delegator_index))?;

        if amount == I80F48::ZERO {
            return Ok(WithdrawalReceipt::empty(delegator_index));
        }

        let delegated_balance: I80F48 = delegator.delegated_balance.into();
        check!(
            delegated_balance > I80F48::ZERO,
            DelegationError::InvalidWithdrawal("nothing delegated"),
            "Delegator {} has no active stake",
            delegator_index
        );
        check!(
            amount <= delegated_balance,
            DelegationError::InsufficientBalance {
                requested: amount,
                available: delegated_balance,
            }
        );

        self.transact(|account| {
            let delegator = account.get_delegator_mut(delegator_index)?;

            let fee_ledger: I80F48 = delegator.fee_ledger.into();
            let fee_realized = mul_div(fee_ledger, amount, delegated_balance)?;

            delegator.fee_ledger = fee_ledger
                .checked_sub(fee_realized)
                .ok_or_else(math_error!())?
                .into();
            delegator.delegated_balance = delegated_balance
                .checked_sub(amount)
                .ok_or_else(math_error!())?
                .into();

            account.change_total_delegated_balance(-amount)?;

            let receipt = account.pay_out(delegator_index, None, amount, fee_realized)?;
            account.recompute_quotas_internal()?;

            debug!(
                "Delegator {} withdrew {}, fee charged: {}",
                delegator_index, amount, receipt.fee_charged
            );

            Ok(receipt)
        })
    }

    /// Settles a matured exit entry: its remaining amount is paid out and the fee ledger
    /// portion it carried is realized. Active stake was already debited when the exit was
    /// requested, only the operator's fee changes the effective balance.
    pub fn settle_exit(
        &mut self,
        exit_id: ExitId,
        current_epoch: Epoch,
    ) -> DelegationResult<WithdrawalReceipt> {
        self.transact(|account| account.settle_exit_internal(exit_id, current_epoch))
    }

    /// Settles every exit entry matured at `current_epoch`, oldest first.
    pub fn release_matured_exits(
        &mut self,
        current_epoch: Epoch,
    ) -> DelegationResult<Vec<WithdrawalReceipt>> {
        let matured: Vec<ExitId> = self
            .matured_exits(current_epoch)
            .map(|entry| entry.exit_id)
            .collect();

        if matured.is_empty() {
            return Ok(Vec::new());
        }

        let receipts = self.transact(|account| {
            matured
                .iter()
                .map(|exit_id| account.settle_exit_internal(*exit_id, current_epoch))
                .collect::<DelegationResult<Vec<_>>>()
        })?;

        info!(
            "Released {} matured exits at epoch {}",
            receipts.len(),
            current_epoch
        );

        Ok(receipts)
    }

    fn settle_exit_internal(
        &mut self,
        exit_id: ExitId,
        current_epoch: Epoch,
    ) -> DelegationResult<WithdrawalReceipt> {
        let entry = self.take_exit_entry(exit_id)?;
        check!(
            entry.is_matured(current_epoch),
            DelegationError::ExitNotMatured {
                exit_epoch: entry.exit_epoch,
                current_epoch,
            }
        );

        let receipt = self.pay_out(
            entry.delegator_index,
            Some(exit_id),
            entry.remaining(),
            entry.fee_ledger_portion.into(),
        )?;
        self.recompute_quotas_internal()?;

        debug!(
            "Exit {} settled for delegator {}, released: {}",
            exit_id, entry.delegator_index, receipt.released
        );

        Ok(receipt)
    }

    /// Pays the operator the realized fee, bounded by the withdrawn amount, and releases the
    /// rest to the delegator.
    fn pay_out(
        &mut self,
        delegator_index: DelegatorIndex,
        exit_id: Option<ExitId>,
        amount: I80F48,
        fee_realized: I80F48,
    ) -> DelegationResult<WithdrawalReceipt> {
        let fee_charged = fee_realized.clamp(I80F48::ZERO, amount);
        let released = amount
            .checked_sub(fee_charged)
            .ok_or_else(math_error!())?;

        self.change_operator_balance(fee_charged)?;

        let delegator = self.get_delegator_mut(delegator_index)?;
        let liquid_balance: I80F48 = delegator.liquid_balance.into();
        delegator.liquid_balance = liquid_balance
            .checked_add(released)
            .ok_or_else(math_error!())?
            .into();

        Ok(WithdrawalReceipt {
            delegator_index,
            exit_id,
            amount,
            fee_realized,
            fee_charged,
            released,
        })
    }
}

#[cfg(test)]
mod tests {
    use eodstypecrate::types::DelegationConfig;
    use fixed::types::I80F48;
    use fixed_macro::types::I80F48;
    use pretty_assertions::assert_eq;

    use crate::{assert_eq_with_tolerance, prelude::*};

    fn rewarded_account() -> ValidatorAccount {
        let mut account = ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
        account.delegate(0, I80F48!(20)).unwrap();
        account.delegate(1, I80F48!(20)).unwrap();
        account.apply_reward(I80F48!(9)).unwrap();
        account
    }

    #[test]
    fn withdrawal_realizes_proportional_fee() {
        let mut account = rewarded_account();
        let operator_before = account.operator_balance();

        let receipt = account.settle_withdrawal(0, I80F48!(22.5)).unwrap();

        assert_eq_with_tolerance!(receipt.fee_charged, I80F48!(0.25), I80F48!(0.000001));
        assert_eq_with_tolerance!(receipt.released, I80F48!(22.25), I80F48!(0.000001));
        assert_eq_with_tolerance!(
            account.operator_balance() - operator_before,
            I80F48!(0.25),
            I80F48!(0.000001)
        );

        let delegator = account.delegator(0).unwrap();
        assert_eq_with_tolerance!(delegator.delegated_balance.to_fixed(), I80F48::ZERO, I80F48!(0.000001));
        assert_eq_with_tolerance!(delegator.fee_ledger.to_fixed(), I80F48::ZERO, I80F48!(0.000001));
        assert_eq!(delegator.quota.to_fixed(), I80F48::ZERO);
        account.check_invariants().unwrap();
    }

    #[test]
    fn negative_fee_ledger_charges_nothing() {
        let mut account = ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
        account.delegate(0, I80F48!(40)).unwrap();
        account.apply_penalty(I80F48!(9)).unwrap();

        let receipt = account.settle_withdrawal(0, I80F48!(10)).unwrap();

        assert!(receipt.fee_realized < I80F48::ZERO);
        assert_eq!(receipt.fee_charged, I80F48::ZERO);
        assert_eq!(receipt.released, I80F48!(10));
    }

    #[test]
    fn zero_withdrawal_is_a_no_op() {
        let mut account = rewarded_account();
        let before = account.clone();

        let receipt = account.settle_withdrawal(1, I80F48::ZERO).unwrap();

        assert_eq!(receipt.released, I80F48::ZERO);
        assert_eq!(account, before);
    }

    #[test]
    fn withdrawal_without_stake_is_rejected() {
        let mut account = rewarded_account();
        let delegated_balance = account.delegator(0).unwrap().delegated_balance.to_fixed();
        account.settle_withdrawal(0, delegated_balance).unwrap();

        assert_eq!(
            account.settle_withdrawal(0, I80F48!(1)),
            Err(DelegationError::InvalidWithdrawal("nothing delegated"))
        );
    }

    #[test]
    fn exit_settles_only_after_maturity() {
        let mut account = rewarded_account();
        let exit_id = account.request_undelegation(1, I80F48!(11.25), 6).unwrap();

        assert_eq!(
            account.settle_exit(exit_id, 5),
            Err(DelegationError::ExitNotMatured {
                exit_epoch: 6,
                current_epoch: 5
            })
        );
        assert!(account.exit_entry(exit_id).is_some());

        let receipt = account.settle_exit(exit_id, 6).unwrap();

        assert_eq!(receipt.exit_id, Some(exit_id));
        assert_eq_with_tolerance!(receipt.fee_charged, I80F48!(0.125), I80F48!(0.000001));
        assert_eq_with_tolerance!(
            account.delegator(1).unwrap().liquid_balance.to_fixed(),
            I80F48!(11.125),
            I80F48!(0.000001)
        );
        assert!(account.exit_entry(exit_id).is_none());
        assert_eq!(
            account.settle_exit(exit_id, 6),
            Err(DelegationError::ExitEntryNotFound(exit_id))
        );
    }

    #[test]
    fn release_matured_exits_keeps_immature_entries() {
        let mut account = rewarded_account();
        account.request_undelegation(0, I80F48!(1), 3).unwrap();
        account.request_undelegation(1, I80F48!(1), 8).unwrap();
        account.request_undelegation(0, I80F48!(1), 2).unwrap();

        let receipts = account.release_matured_exits(4).unwrap();

        assert_eq!(
            receipts.iter().map(|r| r.exit_id).collect::<Vec<_>>(),
            vec![Some(0), Some(2)]
        );
        assert_eq!(account.exit_queue().count(), 1);
    }
}
