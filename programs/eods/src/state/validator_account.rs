use std::collections::{BTreeMap, VecDeque};

use eodstypecrate::{
    constants::{CONSERVATION_TOLERANCE, QUOTA_TOLERANCE},
    types::{
        DelegationConfig, Delegator, DelegatorIndex, ExitId, PendingDelegation,
        UndelegationExitEntry, ValidatorLedger,
    },
};
use fixed::types::I80F48;
use tracing::debug;

use crate::{
    check, math_error,
    prelude::{DelegationError, DelegationResult},
    state::delegation_config::DelegationConfigImpl,
};

/// A delegated validator: the operator's stake, every delegator's stake, the undelegation
/// exit queue and the pending delegation queue.
///
/// The value is owned by the caller (the epoch driver), which is also responsible for
/// persisting it between invocations. All mutating operations are all-or-nothing: they run
/// against a staged copy that replaces `self` only when the whole operation succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorAccount {
    pub(crate) ledger: ValidatorLedger,
    pub(crate) config: DelegationConfig,
    pub(crate) delegators: BTreeMap<DelegatorIndex, Delegator>,
    pub(crate) exit_queue: VecDeque<UndelegationExitEntry>,
    pub(crate) pending_delegations: VecDeque<PendingDelegation>,
}

impl ValidatorAccount {
    pub fn new(operator_balance: I80F48, config: DelegationConfig) -> DelegationResult<Self> {
        check!(
            !operator_balance.is_negative(),
            DelegationError::InvalidAmount,
            "Operator balance must not be negative: {}",
            operator_balance
        );
        config.validate()?;

        debug!("New delegated validator, operator balance: {}", operator_balance);

        Ok(ValidatorAccount {
            ledger: ValidatorLedger::new(operator_balance),
            config,
            delegators: BTreeMap::new(),
            exit_queue: VecDeque::new(),
            pending_delegations: VecDeque::new(),
        })
    }

    /// Rebuilds an account from persisted records. The records must satisfy every account
    /// invariant.
    pub fn from_parts(
        ledger: ValidatorLedger,
        config: DelegationConfig,
        delegators: impl IntoIterator<Item = (DelegatorIndex, Delegator)>,
        exit_queue: impl IntoIterator<Item = UndelegationExitEntry>,
        pending_delegations: impl IntoIterator<Item = PendingDelegation>,
    ) -> DelegationResult<Self> {
        config.validate()?;

        let account = ValidatorAccount {
            ledger,
            config,
            delegators: delegators.into_iter().collect(),
            exit_queue: exit_queue.into_iter().collect(),
            pending_delegations: pending_delegations.into_iter().collect(),
        };
        account.check_invariants()?;

        Ok(account)
    }

    // ------------ Read accessors

    pub fn ledger(&self) -> &ValidatorLedger {
        &self.ledger
    }

    pub fn config(&self) -> &DelegationConfig {
        &self.config
    }

    pub fn operator_balance(&self) -> I80F48 {
        self.ledger.operator_balance.into()
    }

    pub fn operator_quota(&self) -> I80F48 {
        self.ledger.operator_quota.into()
    }

    pub fn total_delegated_balance(&self) -> I80F48 {
        self.ledger.total_delegated_balance.into()
    }

    pub fn fee_quotient(&self) -> I80F48 {
        self.config.fee_quotient.into()
    }

    /// `operator_balance + total_delegated_balance`
    pub fn effective_balance(&self) -> DelegationResult<I80F48> {
        self.ledger.effective_balance().ok_or_else(math_error!())
    }

    pub fn delegator(&self, delegator_index: DelegatorIndex) -> Option<&Delegator> {
        self.delegators.get(&delegator_index)
    }

    pub fn delegators(&self) -> impl Iterator<Item = (&DelegatorIndex, &Delegator)> {
        self.delegators.iter()
    }

    pub fn delegator_count(&self) -> usize {
        self.delegators.len()
    }

    // ------------ Internal state helpers

    pub(crate) fn get_delegator_mut(
        &mut self,
        delegator_index: DelegatorIndex,
    ) -> DelegationResult<&mut Delegator> {
        self.delegators
            .get_mut(&delegator_index)
            .ok_or(DelegationError::DelegatorNotFound(delegator_index))
    }

    pub(crate) fn change_operator_balance(&mut self, delta: I80F48) -> DelegationResult {
        let operator_balance: I80F48 = self.ledger.operator_balance.into();
        let operator_balance = operator_balance
            .checked_add(delta)
            .ok_or_else(math_error!())?;

        check!(
            !operator_balance.is_negative(),
            DelegationError::InvariantViolation("negative operator balance")
        );
        self.ledger.operator_balance = operator_balance.into();

        Ok(())
    }

    pub(crate) fn change_total_delegated_balance(&mut self, delta: I80F48) -> DelegationResult {
        let total_delegated_balance: I80F48 = self.ledger.total_delegated_balance.into();
        let total_delegated_balance = total_delegated_balance
            .checked_add(delta)
            .ok_or_else(math_error!())?;

        check!(
            !total_delegated_balance.is_negative(),
            DelegationError::InvariantViolation("negative total delegated balance")
        );
        self.ledger.total_delegated_balance = total_delegated_balance.into();

        Ok(())
    }

    /// Runs `op` against a staged copy of the account and commits it only if `op` succeeds.
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut ValidatorAccount) -> DelegationResult<T>,
    ) -> DelegationResult<T> {
        let mut staged = self.clone();
        let result = op(&mut staged)?;

        #[cfg(feature = "debug")]
        staged.check_invariants()?;

        *self = staged;

        Ok(result)
    }

    // ------------ Invariants

    /// Verifies non-negativity, conservation of the delegated total, quota normalization and
    /// the consistency of the exit queue.
    pub fn check_invariants(&self) -> DelegationResult {
        let operator_balance = self.operator_balance();
        let operator_quota = self.operator_quota();
        let total_delegated_balance = self.total_delegated_balance();

        check!(
            !operator_balance.is_negative(),
            DelegationError::InvariantViolation("negative operator balance")
        );
        check!(
            !total_delegated_balance.is_negative(),
            DelegationError::InvariantViolation("negative total delegated balance")
        );
        check!(
            operator_quota >= I80F48::ZERO && operator_quota <= I80F48::ONE,
            DelegationError::InvariantViolation("operator quota out of range")
        );

        let mut delegated_sum = I80F48::ZERO;
        let mut quota_sum = operator_quota;
        for (index, delegator) in self.delegators.iter() {
            let delegated_balance: I80F48 = delegator.delegated_balance.into();
            let quota: I80F48 = delegator.quota.into();

            check!(
                !delegated_balance.is_negative(),
                DelegationError::InvariantViolation("negative delegated balance"),
                "Delegator {} balance: {}",
                index,
                delegated_balance
            );
            check!(
                quota >= I80F48::ZERO && quota <= I80F48::ONE,
                DelegationError::InvariantViolation("delegator quota out of range")
            );

            delegated_sum = delegated_sum
                .checked_add(delegated_balance)
                .ok_or_else(math_error!())?;
            quota_sum = quota_sum.checked_add(quota).ok_or_else(math_error!())?;
        }

        check!(
            (delegated_sum - total_delegated_balance).abs() <= CONSERVATION_TOLERANCE,
            DelegationError::InvariantViolation("delegated total does not match delegators"),
            "Sum of delegators: {}, total delegated: {}",
            delegated_sum,
            total_delegated_balance
        );

        check!(
            (quota_sum - I80F48::ONE).abs() <= QUOTA_TOLERANCE,
            DelegationError::InvariantViolation("quotas do not sum to one"),
            "Quota sum: {}",
            quota_sum
        );

        if total_delegated_balance == I80F48::ZERO {
            check!(
                operator_quota == I80F48::ONE,
                DelegationError::InvariantViolation("operator quota must be one without delegation")
            );
        }

        // Exit ids are handed out in queue order and never reused.
        let mut exit_id_bound: Option<ExitId> = None;
        for entry in self.exit_queue.iter() {
            check!(
                !entry.remaining().is_negative(),
                DelegationError::InvariantViolation("negative exit entry amount"),
                "Exit entry {} amount: {}",
                entry.exit_id,
                entry.remaining()
            );
            check!(
                self.delegators.contains_key(&entry.delegator_index),
                DelegationError::InvariantViolation("exit entry for unknown delegator"),
                "Exit entry {} delegator: {}",
                entry.exit_id,
                entry.delegator_index
            );
            check!(
                exit_id_bound.map_or(true, |previous| entry.exit_id > previous)
                    && entry.exit_id < self.ledger.next_exit_id,
                DelegationError::InvariantViolation("exit ids out of order"),
                "Exit entry {}, next exit id: {}",
                entry.exit_id,
                self.ledger.next_exit_id
            );
            exit_id_bound = Some(entry.exit_id);
        }

        Ok(())
    }
}
