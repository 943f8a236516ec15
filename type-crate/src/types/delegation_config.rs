use bytemuck::{Pod, Zeroable};

use crate::{
    assert_struct_align, assert_struct_size,
    constants::{
        DEFAULT_DELEGATION_CHURN_LIMIT, DEFAULT_EXIT_DELAY_EPOCHS, DEFAULT_FEE_QUOTIENT,
        MIN_DEPOSIT_TO_DELEGATE_AMOUNT, STRICT_SLASHING_FLAG,
    },
};

use super::WrappedI80F48;

assert_struct_size!(DelegationConfig, 64);
assert_struct_align!(DelegationConfig, 8);
/// Per-validator delegation parameters.
#[repr(C)]
#[derive(Debug, PartialEq, Pod, Zeroable, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelegationConfig {
    /// Operator's service fee rate on delegator rewards, in [0, 1]
    pub fee_quotient: WrappedI80F48,
    /// Smallest accepted delegation, for new delegators and top-ups alike
    pub min_delegation_amount: WrappedI80F48,
    /// Maximum amount of pending delegation applied per processing epoch
    pub delegation_churn_limit: WrappedI80F48,
    pub exit_delay_epochs: u64,
    /// Config Flags
    ///
    /// - STRICT_SLASHING_FLAG: 1
    ///
    pub flags: u64,
}

impl DelegationConfig {
    pub const LEN: usize = std::mem::size_of::<DelegationConfig>();

    pub fn get_flag(&self, flag: u64) -> bool {
        (self.flags & flag) == flag
    }

    pub fn is_strict_slashing(&self) -> bool {
        self.get_flag(STRICT_SLASHING_FLAG)
    }

    pub fn from_bytes(v: &[u8]) -> &Self {
        bytemuck::from_bytes(v)
    }
}

impl Default for DelegationConfig {
    fn default() -> Self {
        DelegationConfig {
            fee_quotient: DEFAULT_FEE_QUOTIENT.into(),
            min_delegation_amount: MIN_DEPOSIT_TO_DELEGATE_AMOUNT.into(),
            delegation_churn_limit: DEFAULT_DELEGATION_CHURN_LIMIT.into(),
            exit_delay_epochs: DEFAULT_EXIT_DELAY_EPOCHS,
            flags: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixed::types::I80F48;

    #[test]
    fn default_config_round_trips_through_bytes() {
        let config = DelegationConfig::default();
        let bytes = bytemuck::bytes_of(&config);
        assert_eq!(bytes.len(), DelegationConfig::LEN);

        let loaded = DelegationConfig::from_bytes(bytes);
        assert_eq!(I80F48::from(loaded.fee_quotient), DEFAULT_FEE_QUOTIENT);
        assert_eq!(loaded.exit_delay_epochs, DEFAULT_EXIT_DELAY_EPOCHS);
    }
}
