use eodstypecrate::types::ExitId;
use fixed::types::I80F48;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    check, math_error,
    prelude::{DelegationError, DelegationResult, ValidatorAccount},
    state::distribution::FeeAccrual,
    utils::{mul_div, saturating_debit},
};

/// Part of an exit entry's slash share that exceeded its remaining amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlashShortfall {
    pub exit_id: ExitId,
    pub shortfall: I80F48,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlashOutcome {
    pub slashed_from_queue: I80F48,
    pub slashed_from_operator: I80F48,
    pub slashed_from_delegators: I80F48,
    /// Part of the slash that neither the exit queue nor active stake could cover
    pub unabsorbed: I80F48,
    pub shortfalls: Vec<SlashShortfall>,
}

impl SlashOutcome {
    pub fn total_applied(&self) -> DelegationResult<I80F48> {
        self.slashed_from_queue
            .checked_add(self.slashed_from_operator)
            .and_then(|sum| sum.checked_add(self.slashed_from_delegators))
            .ok_or_else(math_error!())
    }

    pub fn is_fully_applied(&self) -> bool {
        self.unabsorbed == I80F48::ZERO
    }
}

impl ValidatorAccount {
    /// Applies a slash to the exit queue first, then to active stake.
    ///
    /// Each queued entry, oldest first, takes `amount / total_effective_balance_at_exit` of
    /// the slash, bounded by what the entry still holds. The rest is split between operator
    /// and delegators like a penalty, without touching fee ledgers. Quotas are recomputed
    /// afterwards.
    ///
    /// With strict slashing enabled, an entry that cannot cover its share or a slash larger
    /// than the stake at risk fails the whole operation instead of being recorded in the
    /// outcome.
    pub fn slash(&mut self, total_slash_amount: I80F48) -> DelegationResult<SlashOutcome> {
        check!(
            total_slash_amount > I80F48::ZERO,
            DelegationError::InvalidAmount,
            "Slash amount: {}",
            total_slash_amount
        );

        let strict = self.config.is_strict_slashing();

        self.transact(|account| {
            let mut outcome = SlashOutcome::default();
            let mut unassigned = total_slash_amount;

            for entry in account.exit_queue.iter_mut() {
                let total_effective_balance_at_exit: I80F48 =
                    entry.total_effective_balance_at_exit.into();
                check!(
                    total_effective_balance_at_exit > I80F48::ZERO,
                    DelegationError::InvalidWithdrawal("exit entry without effective balance"),
                    "Exit entry: {}",
                    entry.exit_id
                );

                let remaining = entry.remaining();
                let entry_slash = mul_div(
                    total_slash_amount,
                    remaining,
                    total_effective_balance_at_exit,
                )?
                .min(unassigned);

                let (new_remaining, shortfall) = saturating_debit(remaining, entry_slash)?;
                if shortfall > I80F48::ZERO {
                    check!(
                        !strict,
                        DelegationError::PartialSlashShortfall {
                            exit_id: entry.exit_id,
                            shortfall,
                        }
                    );

                    warn!(
                        "Exit entry {} could not cover its slash share, shortfall: {}",
                        entry.exit_id, shortfall
                    );
                    outcome.shortfalls.push(SlashShortfall {
                        exit_id: entry.exit_id,
                        shortfall,
                    });
                }

                let taken = remaining
                    .checked_sub(new_remaining)
                    .ok_or_else(math_error!())?;
                entry.undelegated_amount = new_remaining.into();

                unassigned = unassigned.checked_sub(taken).ok_or_else(math_error!())?;
                outcome.slashed_from_queue = outcome
                    .slashed_from_queue
                    .checked_add(taken)
                    .ok_or_else(math_error!())?;
            }

            if unassigned > I80F48::ZERO {
                let effective_balance = account.effective_balance()?;
                let debit = account.debit_active_stake(unassigned, FeeAccrual::Skip)?;

                if debit.unabsorbed > I80F48::ZERO {
                    check!(
                        !strict,
                        DelegationError::InsufficientBalance {
                            requested: unassigned,
                            available: effective_balance,
                        }
                    );

                    warn!(
                        "Slash exceeds the stake at risk, unabsorbed: {}",
                        debit.unabsorbed
                    );
                }

                outcome.slashed_from_operator = debit.operator;
                outcome.slashed_from_delegators = debit.delegators;
                outcome.unabsorbed = debit.unabsorbed;
            }

            account.recompute_quotas_internal()?;

            debug!(
                "Slash {} applied, from queue: {}, from operator: {}, from delegators: {}",
                total_slash_amount,
                outcome.slashed_from_queue,
                outcome.slashed_from_operator,
                outcome.slashed_from_delegators
            );

            Ok(outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use eodstypecrate::{constants::STRICT_SLASHING_FLAG, types::DelegationConfig};
    use fixed::types::I80F48;
    use fixed_macro::types::I80F48;
    use pretty_assertions::assert_eq;

    use crate::{assert_eq_with_tolerance, prelude::*};

    fn scenario_account(flags: u64) -> ValidatorAccount {
        let config = DelegationConfig {
            flags,
            ..DelegationConfig::default()
        };
        let mut account = ValidatorAccount::new(I80F48!(32), config).unwrap();
        account.delegate(0, I80F48!(20)).unwrap();
        account.delegate(1, I80F48!(20)).unwrap();
        account.request_undelegation(0, I80F48!(10), 5).unwrap();
        account
    }

    #[test]
    fn slash_hits_exit_queue_first() {
        let mut account = scenario_account(0);
        let effective_before = account.effective_balance().unwrap();

        let outcome = account.slash(I80F48!(8)).unwrap();

        assert_eq_with_tolerance!(outcome.slashed_from_queue, I80F48!(1.290322), I80F48!(0.000001));
        assert_eq_with_tolerance!(
            outcome
                .slashed_from_operator
                .checked_add(outcome.slashed_from_delegators)
                .unwrap(),
            I80F48!(6.709677),
            I80F48!(0.000001)
        );
        assert_eq_with_tolerance!(outcome.total_applied().unwrap(), I80F48!(8), I80F48!(0.000000001));
        assert!(outcome.is_fully_applied());
        assert!(outcome.shortfalls.is_empty());

        let entry = account.exit_queue().next().unwrap();
        assert_eq_with_tolerance!(entry.remaining(), I80F48!(8.709677), I80F48!(0.000001));
        assert_eq_with_tolerance!(
            account.effective_balance().unwrap(),
            effective_before - outcome.slashed_from_operator - outcome.slashed_from_delegators,
            I80F48!(0.000000001)
        );
        account.check_invariants().unwrap();
    }

    #[test]
    fn slash_leaves_fee_ledgers_alone() {
        let mut account = scenario_account(0);

        account.slash(I80F48!(8)).unwrap();

        for (_, delegator) in account.delegators() {
            assert_eq!(delegator.fee_ledger.to_fixed(), I80F48::ZERO);
        }
    }

    #[test]
    fn oversized_slash_is_reported_as_unabsorbed() {
        let mut account = scenario_account(0);

        let outcome = account.slash(I80F48!(200)).unwrap();

        assert!(!outcome.is_fully_applied());
        assert!(!outcome.shortfalls.is_empty());
        assert_eq!(account.exit_queue().next().unwrap().remaining(), I80F48::ZERO);
        assert_eq_with_tolerance!(
            account.effective_balance().unwrap(),
            I80F48::ZERO,
            I80F48!(0.000000001)
        );
        account.check_invariants().unwrap();
    }

    #[test]
    fn strict_slashing_rejects_shortfall() {
        let mut account = scenario_account(STRICT_SLASHING_FLAG);
        let before = account.clone();

        let result = account.slash(I80F48!(200));

        assert!(matches!(
            result,
            Err(DelegationError::PartialSlashShortfall { exit_id: 0, .. })
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn slash_without_queue_behaves_like_penalty_split() {
        let mut account = ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
        account.delegate(0, I80F48!(40)).unwrap();

        let outcome = account.slash(I80F48!(9)).unwrap();

        assert_eq!(outcome.slashed_from_queue, I80F48::ZERO);
        assert_eq_with_tolerance!(outcome.slashed_from_operator, I80F48!(4), I80F48!(0.000001));
        assert_eq_with_tolerance!(outcome.slashed_from_delegators, I80F48!(5), I80F48!(0.000001));
    }
}
