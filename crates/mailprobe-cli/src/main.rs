//! Mailprobe CLI
//!
//! ## Usage
//!
//! ```bash
//! mailprobe login                  # Sign in once, save the session
//! mailprobe run                    # Run every scenario in Chromium
//! mailprobe run --filter sort      # Only the sort scenarios
//! mailprobe run --sim              # Against the simulated app
//! mailprobe clean                  # Delete all folders and labels
//! ```

use clap::Parser;
use mailprobe::{init_logging, SuiteConfig};
use mailprobe_cli::{
    handlers, CleanArgs, Cli, CliConfig, CliError, CliResult, Commands, LoginArgs,
    ProgressReporter, ReportFormat, RunArgs, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into());

    let mut suite = SuiteConfig::load(cli.config.as_deref())?;
    if let Some(level) = config.verbosity.log_level() {
        suite.logging = suite.logging.with_level(level);
    }
    init_logging(&suite.logging)?;

    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    match cli.command {
        Commands::Config => {
            print!("{}", suite.to_yaml()?);
            Ok(())
        }
        Commands::Login(args) => block_on(run_login(suite, &args, &reporter)),
        Commands::Run(args) => block_on(run_scenarios(&suite, &args, &mut reporter)),
        Commands::Clean(args) => block_on(run_clean(&suite, &args, &mut reporter)),
    }
}

fn block_on<F: std::future::Future<Output = CliResult<()>>>(future: F) -> CliResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;
    rt.block_on(future)
}

async fn run_login(
    mut suite: SuiteConfig,
    args: &LoginArgs,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    if let Some(path) = &args.session {
        suite.session_path.clone_from(path);
    }
    let path = handlers::login(&suite).await?;
    reporter.success(&format!("session saved to {}", path.display()));
    Ok(())
}

async fn run_scenarios(
    suite: &SuiteConfig,
    args: &RunArgs,
    reporter: &mut ProgressReporter,
) -> CliResult<()> {
    if args.list {
        for name in handlers::scenario_names(args.filter.as_deref()) {
            println!("{name}");
        }
        return Ok(());
    }

    reporter.start_spinner(if args.sim {
        "running scenarios (simulated)"
    } else {
        "running scenarios"
    });
    let result = handlers::run_suite(suite, args).await;
    reporter.finish();
    let report = result?;

    let json = report.to_json()?;
    if let Some(path) = &args.output {
        std::fs::write(path, &json)?;
    }
    match args.format {
        ReportFormat::Json => println!("{json}"),
        ReportFormat::Text => reporter.report(&report),
    }

    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::SuiteFailed {
            failed: report.failed_count(),
            total: report.outcomes.len(),
        })
    }
}

async fn run_clean(
    suite: &SuiteConfig,
    args: &CleanArgs,
    reporter: &mut ProgressReporter,
) -> CliResult<()> {
    reporter.start_spinner("deleting folders and labels");
    let result = handlers::clean(suite, args).await;
    reporter.finish();
    let (folders, labels) = result?;
    reporter.success(&format!("removed {folders} folders and {labels} labels"));
    Ok(())
}
