//! Subcommand implementations.

pub mod ask;
pub mod catalog;
pub mod order;
pub mod tools;
