//! Validation and execution of generated SQL.

pub mod executor;
pub mod validator;

pub use executor::execute;
pub use validator::{check_rules, validate};
