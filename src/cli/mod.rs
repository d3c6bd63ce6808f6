//! Command-line interface module
//!
//! Provides option descriptors, the command contract, prompt helpers and
//! the manager that dispatches subcommands.

pub mod args;
pub mod command;
pub mod manager;
pub mod option;
pub mod prompt;

pub use args::ParsedArgs;
pub use command::{Command, FnCommand, build_parser};
pub use manager::{Invocation, Manager};
pub use option::{CommandOption, Nargs, OptionAction, ValueKind};
