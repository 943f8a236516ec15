use bytemuck::Zeroable;
use eodstypecrate::types::{Delegator, DelegatorIndex, Epoch, PendingDelegation};
use fixed::types::I80F48;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    check, math_error,
    prelude::{DelegationError, DelegationResult, ValidatorAccount},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PendingDelegationReport {
    /// Number of queued delegations credited
    pub applied: usize,
    pub applied_amount: I80F48,
    /// Number of eligible delegations left waiting for churn
    pub deferred: usize,
    /// Unused churn carried into the next processing epoch
    pub carried_over: I80F48,
}

impl ValidatorAccount {
    /// Credits `amount` to a delegator's active stake right away, creating the delegator
    /// on first use, and recomputes quotas.
    pub fn delegate(&mut self, delegator_index: DelegatorIndex, amount: I80F48) -> DelegationResult {
        self.check_delegation_amount(amount)?;

        self.transact(|account| {
            account.credit_delegation(delegator_index, amount)?;
            account.recompute_quotas_internal()?;

            debug!("Delegator {} delegated {}", delegator_index, amount);

            Ok(())
        })
    }

    /// Queues a delegation to be credited by [`ValidatorAccount::process_pending_delegations`]
    /// once `queued_epoch` is reached and churn allows it.
    pub fn queue_delegation(
        &mut self,
        delegator_index: DelegatorIndex,
        amount: I80F48,
        queued_epoch: Epoch,
    ) -> DelegationResult {
        self.check_delegation_amount(amount)?;

        self.pending_delegations.push_back(PendingDelegation {
            delegator_index,
            queued_epoch,
            amount: amount.into(),
        });

        debug!(
            "Delegator {} queued {} at epoch {}",
            delegator_index, amount, queued_epoch
        );

        Ok(())
    }

    pub fn pending_delegations(&self) -> impl Iterator<Item = &PendingDelegation> {
        self.pending_delegations.iter()
    }

    /// Credits queued delegations in arrival order, up to the churn limit plus whatever
    /// churn was left unused while the queue was blocked. Stops at the first delegation that
    /// is not yet eligible or does not fit; the unused churn is carried over only in the
    /// latter case.
    pub fn process_pending_delegations(
        &mut self,
        current_epoch: Epoch,
    ) -> DelegationResult<PendingDelegationReport> {
        self.transact(|account| {
            let churn_limit: I80F48 = account.config.delegation_churn_limit.into();
            let available = churn_limit
                .checked_add(account.ledger.deposit_balance_to_consume.into())
                .ok_or_else(math_error!())?;

            let mut report = PendingDelegationReport::default();
            let mut churn_limit_reached = false;

            while let Some(pending) = account.pending_delegations.front().copied() {
                if pending.queued_epoch > current_epoch {
                    break;
                }

                let amount: I80F48 = pending.amount.into();
                let processed = report
                    .applied_amount
                    .checked_add(amount)
                    .ok_or_else(math_error!())?;
                if processed > available {
                    churn_limit_reached = true;
                    break;
                }

                account.pending_delegations.pop_front();
                account.credit_delegation(pending.delegator_index, amount)?;

                report.applied += 1;
                report.applied_amount = processed;
            }

            if churn_limit_reached {
                report.carried_over = available
                    .checked_sub(report.applied_amount)
                    .ok_or_else(math_error!())?;
                report.deferred = account
                    .pending_delegations
                    .iter()
                    .filter(|pending| pending.queued_epoch <= current_epoch)
                    .count();
            }
            account.ledger.deposit_balance_to_consume = report.carried_over.into();

            if report.applied > 0 {
                account.recompute_quotas_internal()?;
            }

            info!(
                "Processed pending delegations at epoch {}, applied: {}, amount: {}, deferred: {}",
                current_epoch, report.applied, report.applied_amount, report.deferred
            );

            Ok(report)
        })
    }

    fn check_delegation_amount(&self, amount: I80F48) -> DelegationResult {
        check!(
            amount > I80F48::ZERO,
            DelegationError::InvalidAmount,
            "Delegation amount: {}",
            amount
        );
        check!(
            amount >= I80F48::from(self.config.min_delegation_amount),
            DelegationError::BelowMinimumDelegation,
            "Delegation amount: {}, minimum: {}",
            amount,
            self.config.min_delegation_amount
        );

        Ok(())
    }

    fn credit_delegation(&mut self, delegator_index: DelegatorIndex, amount: I80F48) -> DelegationResult {
        let delegator = self
            .delegators
            .entry(delegator_index)
            .or_insert_with(Delegator::zeroed);

        let delegated_balance: I80F48 = delegator.delegated_balance.into();
        delegator.delegated_balance = delegated_balance
            .checked_add(amount)
            .ok_or_else(math_error!())?
            .into();

        self.change_total_delegated_balance(amount)
    }
}
