use std::sync::Arc;

use fixed::types::I80F48;
use fixed_macro::types::I80F48;
use fixtures::{assert_eq_noise, prelude::*};
use pretty_assertions::assert_eq;

fn registry(n_validators: u64) -> anyhow::Result<Arc<ValidatorRegistry>> {
    let registry = ValidatorRegistry::new();
    for index in 0..n_validators {
        let test_f = TestFixture::new(Some(TestSettings::two_equal_delegators()))?;
        registry.insert(index, test_f.validator.into_account());
    }
    Ok(Arc::new(registry))
}

#[test]
fn epoch_processing_runs_per_validator_in_parallel() -> anyhow::Result<()> {
    let registry = registry(8)?;

    let handles: Vec<_> = registry
        .indices()
        .into_iter()
        .map(|index| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                registry.with_account(index, |account| {
                    account.apply_reward(I80F48!(7.2))?;
                    account.request_undelegation(0, I80F48!(5), 2)?;
                    account.apply_penalty(I80F48!(1))
                })
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("epoch worker panicked"))??;
    }

    for index in registry.indices() {
        let snapshot = registry.snapshot(index)?;
        assert_eq_noise!(
            snapshot.effective_balance + snapshot.total_queued_balance,
            I80F48!(78.2),
            I80F48!(0.000000001)
        );
    }

    Ok(())
}

#[test]
fn slash_many_reports_each_validator() -> anyhow::Result<()> {
    let registry = registry(3)?;

    let results = registry.slash_many(&[(0, I80F48!(8)), (1, I80F48!(100)), (9, I80F48!(1))]);

    assert_eq!(results.len(), 3);
    assert!(results[0].1.as_ref().map(|o| o.is_fully_applied()).unwrap_or(false));
    assert!(results[1].1.as_ref().map(|o| !o.is_fully_applied()).unwrap_or(false));
    assert_eq!(results[2].1, Err(DelegationError::ValidatorNotFound(9)));
    assert_eq!(registry.snapshot(2)?.effective_balance, I80F48!(72));

    Ok(())
}

#[test]
fn replaced_account_is_returned() -> anyhow::Result<()> {
    let registry = registry(1)?;
    let fresh = TestFixture::new(None)?.validator.into_account();

    let previous = registry.insert(0, fresh);

    assert_eq!(
        previous.map(|account| account.total_delegated_balance()),
        Some(I80F48!(40))
    );
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.snapshot(0)?.total_delegated_balance, I80F48::ZERO);

    Ok(())
}
