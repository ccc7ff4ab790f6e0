//! Command handlers for droptree CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod inject;
pub mod inspect;
pub mod rebalance;
pub mod tables;
