use bytemuck::{Pod, Zeroable};
use fixed::types::I80F48;

use crate::{assert_struct_align, assert_struct_size};

use super::{DelegatorIndex, Epoch, ExitId, WrappedI80F48};

assert_struct_size!(UndelegationExitEntry, 88);
assert_struct_align!(UndelegationExitEntry, 8);
/// Stake that left active delegation and waits in the exit queue until `exit_epoch`.
/// Still liable to slashing until it is settled.
#[repr(C)]
#[derive(Debug, PartialEq, Pod, Zeroable, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UndelegationExitEntry {
    pub exit_id: ExitId,
    pub delegator_index: DelegatorIndex,
    /// Set by the epoch scheduling collaborator, stored as is
    pub exit_epoch: Epoch,
    /// Outstanding amount, reduced by slashing
    pub undelegated_amount: WrappedI80F48,
    pub fee_quotient_snapshot: WrappedI80F48,
    /// `total_delegated_balance + operator_balance` when the entry was appended. Basis for
    /// the entry's share of a later slash.
    pub total_effective_balance_at_exit: WrappedI80F48,
    /// Part of the delegator's fee ledger that left active stake with this entry
    pub fee_ledger_portion: WrappedI80F48,
}

impl UndelegationExitEntry {
    pub const LEN: usize = std::mem::size_of::<UndelegationExitEntry>();

    pub fn is_matured(&self, current_epoch: Epoch) -> bool {
        self.exit_epoch <= current_epoch
    }

    pub fn remaining(&self) -> I80F48 {
        self.undelegated_amount.into()
    }
}
