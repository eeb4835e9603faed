//! Subcommand implementations.

pub mod check;
pub mod price;
pub mod scan;
