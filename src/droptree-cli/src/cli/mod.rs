//! CLI argument definitions for droptree
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod batch;
mod core;

pub use batch::BatchArgs;
pub use core::{Cli, Commands};
