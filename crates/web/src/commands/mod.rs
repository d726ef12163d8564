//! Command implementations.

pub mod check;
pub mod migrate;
pub mod serve;
