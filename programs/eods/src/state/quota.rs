use fixed::types::I80F48;
use tracing::debug;

use crate::{
    math_error,
    prelude::{DelegationResult, ValidatorAccount},
    utils::mul_div,
};

impl ValidatorAccount {
    /// Recomputes the operator quota and every delegator quota from current balances.
    ///
    /// `operator_quota = operator_balance / effective_balance`, and each delegator receives
    /// `delegated_balance / total_delegated_balance` of the remaining `1 - operator_quota`.
    /// Without delegated stake the operator holds the whole quota.
    pub fn recompute_quotas(&mut self) -> DelegationResult {
        self.transact(|account| account.recompute_quotas_internal())
    }

    pub(crate) fn recompute_quotas_internal(&mut self) -> DelegationResult {
        let operator_balance = self.operator_balance();
        let total_delegated_balance = self.total_delegated_balance();

        if total_delegated_balance == I80F48::ZERO {
            self.ledger.operator_quota = I80F48::ONE.into();
            for delegator in self.delegators.values_mut() {
                delegator.quota = I80F48::ZERO.into();
            }

            debug!("Quotas recomputed without delegated stake");

            return Ok(());
        }

        let effective_balance = operator_balance
            .checked_add(total_delegated_balance)
            .ok_or_else(math_error!())?;
        let operator_quota = operator_balance
            .checked_div(effective_balance)
            .ok_or_else(math_error!())?;
        let delegators_quota = I80F48::ONE
            .checked_sub(operator_quota)
            .ok_or_else(math_error!())?;

        for delegator in self.delegators.values_mut() {
            let quota = mul_div(
                delegator.delegated_balance.into(),
                delegators_quota,
                total_delegated_balance,
            )?;
            delegator.quota = quota.into();
        }
        self.ledger.operator_quota = operator_quota.into();

        debug!(
            "Quotas recomputed, operator quota: {}, effective balance: {}",
            operator_quota, effective_balance
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use eodstypecrate::types::{DelegationConfig, Delegator};
    use fixed::types::I80F48;
    use fixed_macro::types::I80F48;

    use crate::{assert_eq_with_tolerance, prelude::*};

    #[test]
    fn quotas_follow_balances() {
        let mut account = ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
        account.delegators.insert(0, Delegator::new(I80F48!(20)));
        account.delegators.insert(1, Delegator::new(I80F48!(20)));
        account.ledger.total_delegated_balance = I80F48!(40).into();

        account.recompute_quotas().unwrap();

        assert_eq_with_tolerance!(account.operator_quota(), I80F48!(0.4444), I80F48!(0.0001));
        for (_, delegator) in account.delegators() {
            assert_eq_with_tolerance!(
                delegator.quota.to_fixed(),
                I80F48!(0.2778),
                I80F48!(0.0001)
            );
        }
        account.check_invariants().unwrap();
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut account = ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
        account.delegate(0, I80F48!(7)).unwrap();
        account.delegate(1, I80F48!(13)).unwrap();
        account.apply_reward(I80F48!(3)).unwrap();

        account.recompute_quotas().unwrap();
        let once = account.clone();
        account.recompute_quotas().unwrap();

        assert_eq!(account, once);
    }

    #[test]
    fn operator_holds_everything_without_delegation() {
        let mut account = ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
        account.delegators.insert(0, Delegator::new(I80F48::ZERO));

        account.recompute_quotas().unwrap();

        assert_eq!(account.operator_quota(), I80F48::ONE);
        assert_eq!(account.delegator(0).unwrap().quota.to_fixed(), I80F48::ZERO);
    }

    #[test]
    fn delegation_only_validator_has_zero_operator_quota() {
        let mut account = ValidatorAccount::new(I80F48::ZERO, DelegationConfig::default()).unwrap();
        account.delegators.insert(0, Delegator::new(I80F48!(10)));
        account.ledger.total_delegated_balance = I80F48!(10).into();

        account.recompute_quotas().unwrap();

        assert_eq!(account.operator_quota(), I80F48::ZERO);
        assert_eq!(account.delegator(0).unwrap().quota.to_fixed(), I80F48::ONE);
    }
}
