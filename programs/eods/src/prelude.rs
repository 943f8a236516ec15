pub type DelegationResult<G = ()> = Result<G, DelegationError>;

pub use crate::{
    errors::DelegationError,
    macros::*,
    state::{
        delegation_config::{DelegationConfigImpl, DelegationConfigOpt},
        deposit_queue::PendingDelegationReport,
        exit_queue::{ExitEpochScheduler, FixedDelayScheduler},
        registry::{ValidatorIndex, ValidatorRegistry},
        slashing::{SlashOutcome, SlashShortfall},
        snapshot::{AccountSnapshot, DelegatorSnapshot, ExitEntrySnapshot},
        validator_account::ValidatorAccount,
        withdrawal::WithdrawalReceipt,
    },
};
pub use eodstypecrate::types::{DelegationConfig, DelegatorIndex, Epoch, ExitId};
