use anyhow::{Context, Result};
use eods::prelude::*;
use eodstypecrate::types::Delegator;
use fixed::types::I80F48;

pub struct ValidatorFixture {
    account: ValidatorAccount,
}

impl ValidatorFixture {
    pub fn new(account: ValidatorAccount) -> Self {
        ValidatorFixture { account }
    }

    pub fn account(&self) -> &ValidatorAccount {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut ValidatorAccount {
        &mut self.account
    }

    pub fn into_account(self) -> ValidatorAccount {
        self.account
    }

    pub fn delegator(&self, index: DelegatorIndex) -> Result<Delegator> {
        self.account
            .delegator(index)
            .copied()
            .with_context(|| format!("delegator {} not found", index))
    }

    pub fn delegated_balance(&self, index: DelegatorIndex) -> Result<I80F48> {
        Ok(self.delegator(index)?.delegated_balance.into())
    }

    pub fn quota(&self, index: DelegatorIndex) -> Result<I80F48> {
        Ok(self.delegator(index)?.quota.into())
    }

    pub fn fee_ledger(&self, index: DelegatorIndex) -> Result<I80F48> {
        Ok(self.delegator(index)?.fee_ledger.into())
    }

    pub fn liquid_balance(&self, index: DelegatorIndex) -> Result<I80F48> {
        Ok(self.delegator(index)?.liquid_balance.into())
    }

    /// Effective balance plus everything still waiting in the exit queue.
    pub fn stake_at_risk(&self) -> Result<I80F48> {
        let effective_balance = self.account.effective_balance()?;
        let queued = self.account.total_queued_balance()?;
        effective_balance
            .checked_add(queued)
            .context("stake at risk overflow")
    }

    /// Operator balance plus every delegator's active and liquid balance and the queue.
    pub fn total_value(&self) -> Result<I80F48> {
        let mut total = self.stake_at_risk()?;
        for (_, delegator) in self.account.delegators() {
            total = total
                .checked_add(delegator.liquid_balance.into())
                .context("total value overflow")?;
        }
        Ok(total)
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.account
            .check_invariants()
            .context("account invariants violated")
    }
}
