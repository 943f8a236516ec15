pub mod errors;
pub mod macros;
pub mod prelude;
pub mod state;
pub mod utils;

pub use prelude::*;
