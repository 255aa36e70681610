//! Turns plain-language automation rules ("Format Python files with black
//! after editing") into hook configuration entries and merges them into an
//! existing hooks document without ever overwriting a different command.

pub mod builders;
pub mod core;
pub mod utils;

#[cfg(test)]
mod tests;
