use bytemuck::{Pod, Zeroable};

use crate::{assert_struct_align, assert_struct_size};

use super::{DelegatorIndex, Epoch, WrappedI80F48};

assert_struct_size!(PendingDelegation, 32);
assert_struct_align!(PendingDelegation, 8);
/// A validated deposit-to-delegate request waiting for churn.
#[repr(C)]
#[derive(Debug, PartialEq, Pod, Zeroable, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingDelegation {
    pub delegator_index: DelegatorIndex,
    pub queued_epoch: Epoch,
    pub amount: WrappedI80F48,
}
