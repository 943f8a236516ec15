use bytemuck::{Pod, Zeroable};
use fixed::types::I80F48;

use crate::{assert_struct_align, assert_struct_size};

use super::WrappedI80F48;

assert_struct_size!(Delegator, 64);
assert_struct_align!(Delegator, 8);
#[repr(C)]
#[derive(Debug, PartialEq, Pod, Zeroable, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delegator {
    /// Amount currently staked on the delegator's behalf, part of the validator's
    /// `total_delegated_balance`
    pub delegated_balance: WrappedI80F48,
    /// Share of the validator's effective balance at the last recompute
    pub quota: WrappedI80F48,
    /// Accrued management fee owed to the operator. Signed: penalties accrue negatively.
    /// Only realized when stake is withdrawn.
    pub fee_ledger: WrappedI80F48,
    /// Released to the delegator after withdrawal settlement, outside of staking
    pub liquid_balance: WrappedI80F48,
}

impl Delegator {
    pub const LEN: usize = std::mem::size_of::<Delegator>();

    pub fn new(delegated_balance: I80F48) -> Self {
        Delegator {
            delegated_balance: delegated_balance.into(),
            ..Delegator::zeroed()
        }
    }
}
