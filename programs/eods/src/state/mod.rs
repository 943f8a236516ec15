pub mod delegation_config;
pub mod deposit_queue;
pub mod distribution;
pub mod exit_queue;
pub mod quota;
pub mod registry;
pub mod slashing;
pub mod snapshot;
pub mod validator_account;
pub mod withdrawal;
