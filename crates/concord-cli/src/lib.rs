//! Concord CLI library.
//!
//! Configuration loading, argument parsing and the `prepare`, `infer` and
//! `resolve` commands behind the `concord` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command};
pub use config::ConcordConfig;
pub use error::{CliError, Result};
