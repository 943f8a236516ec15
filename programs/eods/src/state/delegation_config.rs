use eodstypecrate::{
    constants::{CONFIG_FLAGS, STRICT_SLASHING_FLAG},
    types::DelegationConfig,
};
use fixed::types::I80F48;
use serde::{Deserialize, Serialize};

use crate::{
    check, set_if_some,
    prelude::{DelegationError, DelegationResult, ValidatorAccount},
};

pub trait DelegationConfigImpl {
    fn validate(&self) -> DelegationResult;
    fn update_flag(&mut self, value: bool, flag: u64);
    fn configure(&mut self, config: &DelegationConfigOpt) -> DelegationResult;
}

impl DelegationConfigImpl for DelegationConfig {
    fn validate(&self) -> DelegationResult {
        let fee_quotient = I80F48::from(self.fee_quotient);
        check!(
            fee_quotient >= I80F48::ZERO && fee_quotient <= I80F48::ONE,
            DelegationError::InvalidConfig("fee quotient must be within [0, 1]")
        );

        let min_delegation_amount = I80F48::from(self.min_delegation_amount);
        check!(
            min_delegation_amount > I80F48::ZERO,
            DelegationError::InvalidConfig("minimum delegation must be positive")
        );

        let delegation_churn_limit = I80F48::from(self.delegation_churn_limit);
        check!(
            delegation_churn_limit >= min_delegation_amount,
            DelegationError::InvalidConfig("churn limit below minimum delegation")
        );

        check!(
            self.flags & !CONFIG_FLAGS == 0,
            DelegationError::InvalidConfig("unknown config flags"),
            "Flags: {:#x}",
            self.flags
        );

        Ok(())
    }

    fn update_flag(&mut self, value: bool, flag: u64) {
        if value {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    fn configure(&mut self, config: &DelegationConfigOpt) -> DelegationResult {
        set_if_some!(self.fee_quotient, config.fee_quotient);
        set_if_some!(self.min_delegation_amount, config.min_delegation_amount);
        set_if_some!(self.delegation_churn_limit, config.delegation_churn_limit);
        set_if_some!(self.exit_delay_epochs, config.exit_delay_epochs);

        if let Some(flag) = config.strict_slashing {
            self.update_flag(flag, STRICT_SLASHING_FLAG);
        }

        self.validate()?;

        Ok(())
    }
}

/// Partial update of a [`DelegationConfig`]. `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DelegationConfigOpt {
    pub fee_quotient: Option<I80F48>,
    pub min_delegation_amount: Option<I80F48>,
    pub delegation_churn_limit: Option<I80F48>,
    pub exit_delay_epochs: Option<u64>,
    pub strict_slashing: Option<bool>,
}

impl ValidatorAccount {
    /// Applies a partial config update. A new fee quotient only affects fees accrued after
    /// the update, exit entries keep the quotient they were created with.
    pub fn configure(&mut self, config: &DelegationConfigOpt) -> DelegationResult {
        self.transact(|account| account.config.configure(config))
    }
}
