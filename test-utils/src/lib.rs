pub mod actions;
pub mod prelude;
pub mod test;
pub mod utils;
pub mod validator;
