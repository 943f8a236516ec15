use std::{collections::BTreeMap, sync::Arc};

use fixed::types::I80F48;
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::prelude::{
    AccountSnapshot, DelegationError, DelegationResult, SlashOutcome, ValidatorAccount,
};

pub type ValidatorIndex = u64;

/// Validator accounts keyed by index, each behind its own lock so operations on different
/// validators do not contend.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    accounts: RwLock<BTreeMap<ValidatorIndex, Arc<Mutex<ValidatorAccount>>>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `account`, returning the account previously registered under `index`.
    pub fn insert(
        &self,
        index: ValidatorIndex,
        account: ValidatorAccount,
    ) -> Option<ValidatorAccount> {
        let previous = self
            .accounts
            .write()
            .insert(index, Arc::new(Mutex::new(account)));

        info!("Validator {} registered", index);

        previous.map(|previous| previous.lock().clone())
    }

    pub fn remove(&self, index: ValidatorIndex) -> Option<ValidatorAccount> {
        self.accounts
            .write()
            .remove(&index)
            .map(|account| account.lock().clone())
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    pub fn indices(&self) -> Vec<ValidatorIndex> {
        self.accounts.read().keys().copied().collect()
    }

    /// Runs `op` with exclusive access to one validator's account.
    pub fn with_account<T>(
        &self,
        index: ValidatorIndex,
        op: impl FnOnce(&mut ValidatorAccount) -> DelegationResult<T>,
    ) -> DelegationResult<T> {
        let account = self
            .accounts
            .read()
            .get(&index)
            .cloned()
            .ok_or(DelegationError::ValidatorNotFound(index))?;

        let mut account = account.lock();
        op(&mut account)
    }

    pub fn snapshot(&self, index: ValidatorIndex) -> DelegationResult<AccountSnapshot> {
        self.with_account(index, |account| account.snapshot())
    }

    /// Applies one slash per validator. Each slash stands on its own: a failure leaves that
    /// validator untouched and does not affect the others.
    pub fn slash_many(
        &self,
        slashes: &[(ValidatorIndex, I80F48)],
    ) -> Vec<(ValidatorIndex, DelegationResult<SlashOutcome>)> {
        slashes
            .iter()
            .map(|(index, amount)| {
                let result = self.with_account(*index, |account| account.slash(*amount));
                if let Err(err) = &result {
                    warn!("Slash of validator {} failed: {}", index, err);
                }
                (*index, result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use eodstypecrate::types::DelegationConfig;
    use fixed_macro::types::I80F48;
    use pretty_assertions::assert_eq;

    use super::*;

    fn registry_with(indices: &[ValidatorIndex]) -> ValidatorRegistry {
        let registry = ValidatorRegistry::new();
        for index in indices {
            let mut account =
                ValidatorAccount::new(I80F48!(32), DelegationConfig::default()).unwrap();
            account.delegate(0, I80F48!(40)).unwrap();
            registry.insert(*index, account);
        }
        registry
    }

    #[test]
    fn unknown_validator_is_reported() {
        let registry = registry_with(&[1]);

        assert_eq!(
            registry.snapshot(2).map(|_| ()),
            Err(DelegationError::ValidatorNotFound(2))
        );
    }

    #[test]
    fn slash_many_isolates_failures() {
        let registry = registry_with(&[1, 2]);

        let results = registry.slash_many(&[(1, I80F48!(9)), (3, I80F48!(1)), (2, I80F48::ZERO)]);

        assert!(results[0].1.is_ok());
        assert_eq!(results[1].1, Err(DelegationError::ValidatorNotFound(3)));
        assert_eq!(results[2].1, Err(DelegationError::InvalidAmount));
        assert_eq!(
            registry.snapshot(2).unwrap().effective_balance,
            I80F48!(72)
        );
        assert_eq!(
            registry.snapshot(1).unwrap().effective_balance,
            I80F48!(63)
        );
    }

    #[test]
    fn accounts_are_usable_across_threads() {
        let registry = registry_with(&[1, 2, 3, 4]);

        std::thread::scope(|scope| {
            for index in registry.indices() {
                let registry = &registry;
                scope.spawn(move || {
                    for _ in 0..10 {
                        registry
                            .with_account(index, |account| account.apply_reward(I80F48!(1)))
                            .unwrap();
                    }
                });
            }
        });

        for index in registry.indices() {
            assert_eq!(registry.snapshot(index).unwrap().effective_balance, I80F48!(82));
        }
    }
}
