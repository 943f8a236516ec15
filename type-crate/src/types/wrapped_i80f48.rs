use bytemuck::{Pod, Zeroable};
use fixed::types::I80F48;
use std::fmt::{Debug, Display, Formatter};

/// `I80F48` stored as its 16 little-endian bytes so that records holding it stay `Pod`.
#[repr(C, align(8))]
#[derive(Default, Clone, Copy, Pod, Zeroable)]
pub struct WrappedI80F48 {
    pub value: [u8; 16],
}

impl WrappedI80F48 {
    pub const ZERO: Self = Self { value: [0; 16] };

    pub fn to_fixed(self) -> I80F48 {
        I80F48::from_le_bytes(self.value)
    }
}

impl Debug for WrappedI80F48 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", I80F48::from_le_bytes(self.value))
    }
}

impl Display for WrappedI80F48 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&I80F48::from_le_bytes(self.value), f)
    }
}

impl From<I80F48> for WrappedI80F48 {
    fn from(i: I80F48) -> Self {
        Self {
            value: i.to_le_bytes(),
        }
    }
}

impl From<WrappedI80F48> for I80F48 {
    fn from(w: WrappedI80F48) -> Self {
        Self::from_le_bytes(w.value)
    }
}

impl PartialEq for WrappedI80F48 {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for WrappedI80F48 {}

#[cfg(feature = "serde")]
impl serde::Serialize for WrappedI80F48 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        I80F48::from(*self).serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for WrappedI80F48 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        I80F48::deserialize(deserializer).map(Self::from)
    }
}
