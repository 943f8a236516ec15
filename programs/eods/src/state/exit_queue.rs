use eodstypecrate::types::{
    DelegationConfig, DelegatorIndex, Epoch, ExitId, UndelegationExitEntry,
};
use fixed::types::I80F48;
use tracing::debug;

use crate::{
    check, math_error,
    prelude::{DelegationError, DelegationResult, ValidatorAccount},
    utils::mul_div,
};

/// Decides the epoch at which a new undelegation may leave the exit queue.
pub trait ExitEpochScheduler {
    fn exit_epoch(&self, current_epoch: Epoch) -> Epoch;
}

/// Exits become available a fixed number of epochs after they were requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelayScheduler {
    pub delay_epochs: u64,
}

impl FixedDelayScheduler {
    pub fn new(delay_epochs: u64) -> Self {
        FixedDelayScheduler { delay_epochs }
    }
}

impl From<&DelegationConfig> for FixedDelayScheduler {
    fn from(config: &DelegationConfig) -> Self {
        FixedDelayScheduler::new(config.exit_delay_epochs)
    }
}

impl ExitEpochScheduler for FixedDelayScheduler {
    fn exit_epoch(&self, current_epoch: Epoch) -> Epoch {
        current_epoch.saturating_add(self.delay_epochs)
    }
}

impl ValidatorAccount {
    /// Moves `amount` of a delegator's stake out of active delegation into the exit queue.
    ///
    /// The matching share of the delegator's fee ledger leaves with the stake and is
    /// realized when the exit is settled. The entry records the validator's effective
    /// balance after the debit, which is the basis of its share in later slashes.
    pub fn request_undelegation(
        &mut self,
        delegator_index: DelegatorIndex,
        amount: I80F48,
        exit_epoch: Epoch,
    ) -> DelegationResult<ExitId> {
        check!(
            amount > I80F48::ZERO,
            DelegationError::InvalidAmount,
            "Undelegation amount: {}",
            amount
        );

        self.transact(|account| {
            let fee_quotient = account.fee_quotient();
            let delegator = account.get_delegator_mut(delegator_index)?;

            let delegated_balance: I80F48 = delegator.delegated_balance.into();
            check!(
                amount <= delegated_balance,
                DelegationError::InsufficientBalance {
                    requested: amount,
                    available: delegated_balance,
                }
            );

            let fee_ledger: I80F48 = delegator.fee_ledger.into();
            let fee_ledger_portion = mul_div(fee_ledger, amount, delegated_balance)?;

            delegator.fee_ledger = fee_ledger
                .checked_sub(fee_ledger_portion)
                .ok_or_else(math_error!())?
                .into();
            delegator.delegated_balance = delegated_balance
                .checked_sub(amount)
                .ok_or_else(math_error!())?
                .into();

            account.change_total_delegated_balance(-amount)?;

            let total_effective_balance_at_exit = account.effective_balance()?;
            let exit_id = account.ledger.next_exit_id;
            account.ledger.next_exit_id = exit_id.checked_add(1).ok_or_else(math_error!())?;

            account.exit_queue.push_back(UndelegationExitEntry {
                exit_id,
                delegator_index,
                exit_epoch,
                undelegated_amount: amount.into(),
                fee_quotient_snapshot: fee_quotient.into(),
                total_effective_balance_at_exit: total_effective_balance_at_exit.into(),
                fee_ledger_portion: fee_ledger_portion.into(),
            });

            account.recompute_quotas_internal()?;

            debug!(
                "Delegator {} undelegated {}, exit {} at epoch {}",
                delegator_index, amount, exit_id, exit_epoch
            );

            Ok(exit_id)
        })
    }

    /// Like [`ValidatorAccount::request_undelegation`], with the exit epoch chosen by
    /// `scheduler`.
    pub fn request_undelegation_scheduled(
        &mut self,
        delegator_index: DelegatorIndex,
        amount: I80F48,
        current_epoch: Epoch,
        scheduler: &impl ExitEpochScheduler,
    ) -> DelegationResult<ExitId> {
        let exit_epoch = scheduler.exit_epoch(current_epoch);
        self.request_undelegation(delegator_index, amount, exit_epoch)
    }

    /// Entries in the order they were appended.
    pub fn exit_queue(&self) -> impl Iterator<Item = &UndelegationExitEntry> {
        self.exit_queue.iter()
    }

    pub fn exit_entry(&self, exit_id: ExitId) -> Option<&UndelegationExitEntry> {
        self.exit_queue.iter().find(|entry| entry.exit_id == exit_id)
    }

    pub fn matured_exits(
        &self,
        current_epoch: Epoch,
    ) -> impl Iterator<Item = &UndelegationExitEntry> {
        self.exit_queue
            .iter()
            .filter(move |entry| entry.is_matured(current_epoch))
    }

    /// Sum of the outstanding amounts of all queued exits.
    pub fn total_queued_balance(&self) -> DelegationResult<I80F48> {
        self.exit_queue
            .iter()
            .try_fold(I80F48::ZERO, |sum, entry| sum.checked_add(entry.remaining()))
            .ok_or_else(math_error!())
    }

    pub(crate) fn take_exit_entry(
        &mut self,
        exit_id: ExitId,
    ) -> DelegationResult<UndelegationExitEntry> {
        let position = self
            .exit_queue
            .iter()
            .position(|entry| entry.exit_id == exit_id)
            .ok_or(DelegationError::ExitEntryNotFound(exit_id))?;

        self.exit_queue
            .remove(position)
            .ok_or(DelegationError::ExitEntryNotFound(exit_id))
    }
}
