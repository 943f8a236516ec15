use bytemuck::{Pod, Zeroable};
use fixed::types::I80F48;

use crate::{assert_struct_align, assert_struct_size};

use super::WrappedI80F48;

assert_struct_size!(ValidatorLedger, 72);
assert_struct_align!(ValidatorLedger, 8);
/// Scalar state of a delegated validator. One per validator, lives as long as the validator.
#[repr(C)]
#[derive(Debug, PartialEq, Pod, Zeroable, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidatorLedger {
    /// Amount owned outright by the operator
    pub operator_balance: WrappedI80F48,
    /// Fraction of the effective balance attributed to the operator at the last recompute
    pub operator_quota: WrappedI80F48,
    /// Sum of all `Delegator::delegated_balance`
    pub total_delegated_balance: WrappedI80F48,
    /// Unused churn carried over by the pending delegation queue
    pub deposit_balance_to_consume: WrappedI80F48,
    pub next_exit_id: u64,
}

impl ValidatorLedger {
    pub const LEN: usize = std::mem::size_of::<ValidatorLedger>();

    pub fn new(operator_balance: I80F48) -> Self {
        ValidatorLedger {
            operator_balance: operator_balance.into(),
            operator_quota: I80F48::ONE.into(),
            total_delegated_balance: I80F48::ZERO.into(),
            deposit_balance_to_consume: I80F48::ZERO.into(),
            next_exit_id: 0,
        }
    }

    /// `operator_balance + total_delegated_balance`, the amount exposed to rewards,
    /// penalties and slashing.
    pub fn effective_balance(&self) -> Option<I80F48> {
        I80F48::from(self.operator_balance).checked_add(self.total_delegated_balance.into())
    }

    pub fn from_bytes(v: &[u8]) -> &Self {
        bytemuck::from_bytes(v)
    }

    pub fn from_bytes_mut(v: &mut [u8]) -> &mut Self {
        bytemuck::from_bytes_mut(v)
    }
}
