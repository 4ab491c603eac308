//! CLI argument parsing module.

mod args;
mod commands;

pub use args::{Cli, Commands, KeyArgs, ServeArgs};
pub use commands::execute;
