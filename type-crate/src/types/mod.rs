pub mod delegation_config;
pub mod delegator;
pub mod exit_entry;
pub mod pending_delegation;
pub mod validator_ledger;
pub mod wrapped_i80f48;

pub use delegation_config::*;
pub use delegator::*;
pub use exit_entry::*;
pub use pending_delegation::*;
pub use validator_ledger::*;
pub use wrapped_i80f48::*;

/// Stable key of a delegator under a delegated validator.
pub type DelegatorIndex = u64;

pub type Epoch = u64;

pub type ExitId = u64;
