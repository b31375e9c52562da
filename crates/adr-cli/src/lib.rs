//! # adr-cli
//!
//! The `adr` command line: run a recipe by name, list recipes, and manage
//! the configuration file.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod logging;

pub use cli::{Cli, Command, ConfigAction};
