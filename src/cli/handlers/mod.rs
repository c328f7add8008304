//! CLI command handlers.

pub mod drama;
pub mod learn;
pub mod maintenance;
pub mod retrieve;
