//! Tooling
//!
//! The `agentbook` command-line interface and its text formatters.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, CommandOutput, Commands};
