pub use crate::actions::*;
pub use crate::test::*;
pub use crate::utils::*;
pub use crate::validator::*;

pub use eods::prelude::*;
