use anyhow::Result;
use eods::prelude::*;
use fixed::types::I80F48;
use fixed_macro::types::I80F48;

use crate::{utils::init_tracing, validator::ValidatorFixture};

#[derive(Debug, Clone, Copy)]
pub struct TestDelegatorSetting {
    pub index: DelegatorIndex,
    pub amount: I80F48,
}

#[derive(Debug, Clone)]
pub struct TestSettings {
    pub operator_balance: I80F48,
    pub config: DelegationConfig,
    pub delegators: Vec<TestDelegatorSetting>,
}

impl Default for TestSettings {
    fn default() -> Self {
        TestSettings {
            operator_balance: I80F48!(32),
            config: DelegationConfig::default(),
            delegators: vec![],
        }
    }
}

impl TestSettings {
    /// Operator with 32 and two delegators with 20 each.
    pub fn two_equal_delegators() -> Self {
        TestSettings {
            delegators: vec![
                TestDelegatorSetting {
                    index: 0,
                    amount: I80F48!(20),
                },
                TestDelegatorSetting {
                    index: 1,
                    amount: I80F48!(20),
                },
            ],
            ..TestSettings::default()
        }
    }

    pub fn with_config(mut self, config: &DelegationConfigOpt) -> Result<Self> {
        self.config.configure(config)?;
        Ok(self)
    }
}

pub struct TestFixture {
    pub validator: ValidatorFixture,
}

impl TestFixture {
    pub fn new(settings: Option<TestSettings>) -> Result<TestFixture> {
        init_tracing();

        let settings = settings.unwrap_or_default();
        let mut account = ValidatorAccount::new(settings.operator_balance, settings.config)?;
        for delegator in settings.delegators.iter() {
            account.delegate(delegator.index, delegator.amount)?;
        }

        Ok(TestFixture {
            validator: ValidatorFixture::new(account),
        })
    }
}
