use anyhow::{bail, Result};
use arbitrary::{Arbitrary, Unstructured};
use eods::prelude::*;
use fixed::types::I80F48;
use fixed_macro::types::I80F48;

use crate::validator::ValidatorFixture;

pub const N_DELEGATORS: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DelegatorIdx(pub u8);

impl<'a> Arbitrary<'a> for DelegatorIdx {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(DelegatorIdx(u.int_in_range(0..=N_DELEGATORS - 1)?))
    }

    fn size_hint(_: usize) -> (usize, Option<usize>) {
        (1, Some(1))
    }
}

/// Amount in quarter units, from 0.25 to 64.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StakeAmount(pub u16);

impl StakeAmount {
    pub fn to_fixed(self) -> I80F48 {
        I80F48::from_num(self.0) / I80F48!(4)
    }
}

impl<'a> Arbitrary<'a> for StakeAmount {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(StakeAmount(u.int_in_range(1..=256)?))
    }

    fn size_hint(_: usize) -> (usize, Option<usize>) {
        (2, Some(2))
    }
}

#[derive(Debug, Clone, Copy, Arbitrary)]
pub enum Action {
    Delegate {
        delegator: DelegatorIdx,
        amount: StakeAmount,
    },
    QueueDelegation {
        delegator: DelegatorIdx,
        amount: StakeAmount,
    },
    ProcessPendingDelegations,
    Reward {
        amount: StakeAmount,
    },
    Penalty {
        amount: StakeAmount,
    },
    Undelegate {
        delegator: DelegatorIdx,
        amount: StakeAmount,
    },
    Withdraw {
        delegator: DelegatorIdx,
        amount: StakeAmount,
    },
    Slash {
        amount: StakeAmount,
    },
    AdvanceEpoch {
        epochs: u8,
    },
    ReleaseMaturedExits,
}

#[derive(Debug, Clone)]
pub struct ActionSequence(pub Vec<Action>);

impl<'a> Arbitrary<'a> for ActionSequence {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let n_actions = u.int_in_range(0..=200)?;
        let mut actions = Vec::with_capacity(n_actions);

        for _ in 0..n_actions {
            actions.push(Action::arbitrary(u)?);
        }

        Ok(ActionSequence(actions))
    }
}

/// Drives a validator account through arbitrary actions and tracks the value that must be
/// accounted for: everything delegated, rewarded, penalized and slashed so far.
pub struct DelegationModel {
    pub validator: ValidatorFixture,
    pub epoch: Epoch,
    pub expected_value: I80F48,
    pub tolerance: I80F48,
}

impl DelegationModel {
    pub fn new(operator_balance: I80F48, config: DelegationConfig) -> Result<Self> {
        let account = ValidatorAccount::new(operator_balance, config)?;

        Ok(DelegationModel {
            validator: ValidatorFixture::new(account),
            epoch: 0,
            expected_value: operator_balance,
            tolerance: I80F48!(0.000001),
        })
    }

    pub fn run(&mut self, actions: &ActionSequence) -> Result<()> {
        for action in actions.0.iter() {
            self.apply(action)?;
        }
        self.verify()
    }

    pub fn apply(&mut self, action: &Action) -> Result<()> {
        let before = self.validator.account().clone();
        let epoch = self.epoch;
        let account = self.validator.account_mut();

        let result: DelegationResult<I80F48> = match *action {
            Action::Delegate { delegator, amount } => account
                .delegate(delegator.0 as u64, amount.to_fixed())
                .map(|_| amount.to_fixed()),
            Action::QueueDelegation { delegator, amount } => account
                .queue_delegation(delegator.0 as u64, amount.to_fixed(), epoch)
                .map(|_| I80F48::ZERO),
            Action::ProcessPendingDelegations => account
                .process_pending_delegations(epoch)
                .map(|report| report.applied_amount),
            Action::Reward { amount } => account
                .apply_reward(amount.to_fixed())
                .map(|_| amount.to_fixed()),
            Action::Penalty { amount } => account
                .apply_penalty(amount.to_fixed())
                .map(|_| -amount.to_fixed()),
            Action::Undelegate { delegator, amount } => account
                .request_undelegation_scheduled(
                    delegator.0 as u64,
                    amount.to_fixed(),
                    epoch,
                    &FixedDelayScheduler::new(2),
                )
                .map(|_| I80F48::ZERO),
            Action::Withdraw { delegator, amount } => account
                .settle_withdrawal(delegator.0 as u64, amount.to_fixed())
                .map(|_| I80F48::ZERO),
            Action::Slash { amount } => account
                .slash(amount.to_fixed())
                .and_then(|outcome| outcome.total_applied())
                .map(|applied| -applied),
            Action::AdvanceEpoch { epochs } => {
                self.epoch = epoch.saturating_add(epochs as u64);
                Ok(I80F48::ZERO)
            }
            Action::ReleaseMaturedExits => account
                .release_matured_exits(epoch)
                .map(|_| I80F48::ZERO),
        };

        match result {
            Ok(value_change) => {
                self.expected_value += value_change;
            }
            Err(
                err @ (DelegationError::MathError
                | DelegationError::InvariantViolation(_)
                | DelegationError::InvalidConfig(_)),
            ) => {
                bail!("{:?} failed: {}", action, err);
            }
            Err(_) => {
                if self.validator.account() != &before {
                    bail!("{:?} failed but changed the account", action);
                }
            }
        }

        self.verify()
    }

    pub fn verify(&self) -> Result<()> {
        self.validator.check_invariants()?;

        let total_value = self.validator.total_value()?;
        if (total_value - self.expected_value).abs() > self.tolerance {
            bail!(
                "Accounted value {} drifted from expected {}",
                total_value,
                self.expected_value
            );
        }

        Ok(())
    }
}
