//! Mailprobe CLI library
//!
//! Argument definitions, output and command implementations behind the
//! `mailprobe` binary.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{CleanArgs, Cli, ColorArg, Commands, LoginArgs, ReportFormat, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{outcome_line, summary_line, ProgressReporter};
