//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mailprobe: end-to-end checks for the webmail folders and labels screen
#[derive(Parser, Debug)]
#[command(name = "mailprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Suite configuration file (YAML)
    #[arg(short, long, global = true, env = "MAILPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in once and save the browser session
    ///
    /// Reads MAILPROBE_USERNAME and MAILPROBE_PASSWORD.
    Login(LoginArgs),

    /// Run the folders and labels scenarios
    Run(RunArgs),

    /// Delete every folder and label on the test account
    Clean(CleanArgs),

    /// Show the effective configuration
    Config,
}

/// Arguments for the login command
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Where to write the session (overrides the configured path)
    #[arg(short, long)]
    pub session: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Only run scenarios whose name contains this
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run against the in-process simulated app instead of a browser
    #[arg(long)]
    pub sim: bool,

    /// List scenario names and exit
    #[arg(long)]
    pub list: bool,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Clean a seeded simulated account instead of the live one
    #[arg(long)]
    pub sim: bool,
}

/// Report format for the run command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON report on stdout
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "mailprobe", "-v", "run", "--filter", "sort", "--fail-fast", "--format", "json", "--sim",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.filter.as_deref(), Some("sort"));
                assert!(args.fail_fast && args.sim);
                assert_eq!(args.format, ReportFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_login_session_path() {
        let cli = Cli::try_parse_from(["mailprobe", "login", "--session", "s.json"]).unwrap();
        match cli.command {
            Commands::Login(args) => assert_eq!(args.session, Some(PathBuf::from("s.json"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["mailprobe", "clean", "--sim", "--config", "suite.yaml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("suite.yaml")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["mailprobe"]).is_err());
    }
}
