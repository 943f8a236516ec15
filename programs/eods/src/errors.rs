use eodstypecrate::types::{DelegatorIndex, Epoch, ExitId};
use fixed::types::I80F48;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegationError {
    #[error("Math error")]
    MathError,
    #[error("Amount must be positive")]
    InvalidAmount,
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: I80F48,
        available: I80F48,
    },
    #[error("Invalid withdrawal: {0}")]
    InvalidWithdrawal(&'static str),
    #[error("Slash overdraws exit entry {exit_id} by {shortfall}")]
    PartialSlashShortfall { exit_id: ExitId, shortfall: I80F48 },
    #[error("Delegator {0} not found")]
    DelegatorNotFound(DelegatorIndex),
    #[error("Delegation amount below minimum")]
    BelowMinimumDelegation,
    #[error("Exit entry {0} not found")]
    ExitEntryNotFound(ExitId),
    #[error("Exit entry matures at epoch {exit_epoch}, current epoch is {current_epoch}")]
    ExitNotMatured { exit_epoch: Epoch, current_epoch: Epoch },
    #[error("Invalid delegation config: {0}")]
    InvalidConfig(&'static str),
    #[error("Account invariant violated: {0}")]
    InvariantViolation(&'static str),
    #[error("Validator {0} not found")]
    ValidatorNotFound(u64),
}
