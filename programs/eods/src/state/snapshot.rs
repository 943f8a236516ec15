use eodstypecrate::types::{DelegatorIndex, Epoch, ExitId};
use fixed::types::I80F48;
use serde::Serialize;

use crate::{
    math_error,
    prelude::{DelegationResult, ValidatorAccount},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelegatorSnapshot {
    pub delegator_index: DelegatorIndex,
    pub delegated_balance: I80F48,
    pub quota: I80F48,
    pub fee_ledger: I80F48,
    pub liquid_balance: I80F48,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitEntrySnapshot {
    pub exit_id: ExitId,
    pub delegator_index: DelegatorIndex,
    pub exit_epoch: Epoch,
    pub undelegated_amount: I80F48,
    pub total_effective_balance_at_exit: I80F48,
}

/// Point-in-time view of a validator account, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub operator_balance: I80F48,
    pub operator_quota: I80F48,
    pub total_delegated_balance: I80F48,
    pub effective_balance: I80F48,
    pub total_queued_balance: I80F48,
    pub pending_delegation_count: usize,
    pub pending_delegation_amount: I80F48,
    pub delegators: Vec<DelegatorSnapshot>,
    pub exit_queue: Vec<ExitEntrySnapshot>,
}

impl ValidatorAccount {
    pub fn snapshot(&self) -> DelegationResult<AccountSnapshot> {
        Ok(AccountSnapshot {
            operator_balance: self.operator_balance(),
            operator_quota: self.operator_quota(),
            total_delegated_balance: self.total_delegated_balance(),
            effective_balance: self.effective_balance()?,
            total_queued_balance: self.total_queued_balance()?,
            pending_delegation_count: self.pending_delegations.len(),
            pending_delegation_amount: self.pending_delegations.iter().try_fold(
                I80F48::ZERO,
                |sum, pending| {
                    sum.checked_add(pending.amount.into())
                        .ok_or_else(math_error!())
                },
            )?,
            delegators: self
                .delegators()
                .map(|(index, delegator)| DelegatorSnapshot {
                    delegator_index: *index,
                    delegated_balance: delegator.delegated_balance.into(),
                    quota: delegator.quota.into(),
                    fee_ledger: delegator.fee_ledger.into(),
                    liquid_balance: delegator.liquid_balance.into(),
                })
                .collect(),
            exit_queue: self
                .exit_queue()
                .map(|entry| ExitEntrySnapshot {
                    exit_id: entry.exit_id,
                    delegator_index: entry.delegator_index,
                    exit_epoch: entry.exit_epoch,
                    undelegated_amount: entry.remaining(),
                    total_effective_balance_at_exit: entry.total_effective_balance_at_exit.into(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use eodstypecrate::types::DelegationConfig;
    use fixed_macro::types::I80F48;
    use pretty_assertions::assert_eq;

    use crate::prelude::*;

    #[test]
    fn snapshot_lists_delegators_in_index_order() {
        let mut account = ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
        account.delegate(5, I80F48!(8)).unwrap();
        account.delegate(2, I80F48!(24)).unwrap();
        account.request_undelegation(2, I80F48!(4), 3).unwrap();

        let snapshot = account.snapshot().unwrap();

        assert_eq!(
            snapshot
                .delegators
                .iter()
                .map(|d| d.delegator_index)
                .collect::<Vec<_>>(),
            vec![2, 5]
        );
        assert_eq!(snapshot.effective_balance, I80F48!(60));
        assert_eq!(snapshot.total_queued_balance, I80F48!(4));
        assert_eq!(snapshot.exit_queue.len(), 1);
    }
}
