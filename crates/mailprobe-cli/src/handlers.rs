//! Command implementations, independent of terminal output

use crate::commands::{CleanArgs, RunArgs};
use crate::error::{CliError, CliResult};
use mailprobe::sim::SIM_BASE_URL;
use mailprobe::{
    builtin_scenarios, clean_slate, Folder, FoldersLabelsPage, LabelColor, Page, PageFactory,
    PageObject, RunOptions, ScenarioRunner, SimDriver, SimState, SuiteConfig, SuiteReport,
};
use std::sync::Arc;
use tracing::info;

/// Names of the scenarios `run` would execute with `filter`
#[must_use]
pub fn scenario_names(filter: Option<&str>) -> Vec<String> {
    builtin_scenarios()
        .iter()
        .map(|s| s.name().to_string())
        .filter(|name| {
            filter.map_or(true, |f| name.to_lowercase().contains(&f.to_lowercase()))
        })
        .collect()
}

/// Account contents `clean --sim` starts from
#[must_use]
pub fn seeded_sim_state() -> SimState {
    SimState::default()
        .with_folder(Folder::new("Important"))
        .with_folder(Folder::new("Child Folder").with_parent("Important"))
        .with_folder(Folder::new("Junk"))
        .with_label("Label", LabelColor::Pacific)
        .with_label("Copper", LabelColor::Copper)
}

fn sim_factory(driver: Arc<SimDriver>, config: &SuiteConfig) -> impl PageFactory {
    let options = config.wait_options();
    let user_index = config.user_index;
    let bound = config.max_bulk_deletions;
    move || {
        let page = Page::new(driver.clone(), SIM_BASE_URL, options);
        std::future::ready(Ok(
            FoldersLabelsPage::new(page, user_index).with_max_bulk_deletions(bound)
        ))
    }
}

#[cfg(feature = "browser")]
fn browser_factory(config: &SuiteConfig) -> CliResult<impl PageFactory> {
    use mailprobe::SessionStore;

    let session = SessionStore::new(&config.session_path)
        .load()
        .map_err(|e| CliError::config(format!("{e}; run `mailprobe login` first")))?;
    let config = config.clone();
    Ok(move || {
        let config = config.clone();
        let session = session.clone();
        async move { mailprobe::open_settings(&config, &session).await }
    })
}

fn run_options(config: &SuiteConfig, args: &RunArgs) -> RunOptions {
    let mut options = RunOptions::new()
        .with_fail_fast(args.fail_fast)
        .with_artifacts_dir(config.artifacts_dir.clone());
    if let Some(filter) = &args.filter {
        options = options.with_filter(filter.clone());
    }
    options
}

/// Run the built-in scenarios
///
/// # Errors
///
/// Returns an error when no page can be provided at all; scenario failures
/// are reported in the returned [`SuiteReport`].
pub async fn run_suite(config: &SuiteConfig, args: &RunArgs) -> CliResult<SuiteReport> {
    let options = run_options(config, args);
    let scenarios = builtin_scenarios();
    if args.sim {
        let driver = Arc::new(SimDriver::authenticated(SimState::default()));
        let runner = ScenarioRunner::new(sim_factory(driver, config), options);
        return Ok(runner.run(&scenarios).await);
    }
    #[cfg(feature = "browser")]
    {
        let runner = ScenarioRunner::new(browser_factory(config)?, options);
        Ok(runner.run(&scenarios).await)
    }
    #[cfg(not(feature = "browser"))]
    {
        Err(CliError::BrowserUnavailable { command: "run" })
    }
}

/// Delete every folder and label; returns `(folders, labels)` removed
///
/// # Errors
///
/// Returns session, navigation and bulk deletion errors.
pub async fn clean(config: &SuiteConfig, args: &CleanArgs) -> CliResult<(usize, usize)> {
    let page = if args.sim {
        let driver = Arc::new(SimDriver::authenticated(seeded_sim_state()));
        sim_factory(driver, config).create().await?
    } else {
        browser_page(config).await?
    };
    let removed = clean_slate(&page).await;
    page.page().driver().close().await?;
    let (folders, labels) = removed?;
    info!(folders, labels, "account cleaned");
    Ok((folders, labels))
}

#[cfg(feature = "browser")]
async fn browser_page(config: &SuiteConfig) -> CliResult<FoldersLabelsPage> {
    Ok(browser_factory(config)?.create().await?)
}

#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
async fn browser_page(_config: &SuiteConfig) -> CliResult<FoldersLabelsPage> {
    Err(CliError::BrowserUnavailable { command: "clean" })
}

/// Sign in and write the session artifact; returns where it was written
///
/// # Errors
///
/// Returns [`mailprobe::ProbeError::MissingCredentials`] when the credential
/// variables are unset, then launch and login errors.
#[cfg(feature = "browser")]
pub async fn login(config: &SuiteConfig) -> CliResult<std::path::PathBuf> {
    let credentials = mailprobe::Credentials::from_env()?;
    mailprobe::login_and_save(config, &credentials).await?;
    Ok(config.session_path.clone())
}

/// Sign in and write the session artifact
///
/// # Errors
///
/// Always [`CliError::BrowserUnavailable`] in this build.
#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
pub async fn login(_config: &SuiteConfig) -> CliResult<std::path::PathBuf> {
    Err(CliError::BrowserUnavailable { command: "login" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::commands::ReportFormat;

    fn run_args(filter: Option<&str>) -> RunArgs {
        RunArgs {
            filter: filter.map(str::to_string),
            fail_fast: false,
            format: ReportFormat::Text,
            output: None,
            sim: true,
            list: false,
        }
    }

    fn quick_config(dir: &std::path::Path) -> SuiteConfig {
        let mut config = SuiteConfig::default();
        config.timeouts.action_ms = 500;
        config.timeouts.network_ms = 500;
        config.timeouts.poll_ms = 5;
        config.artifacts_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_scenario_names_filter() {
        assert_eq!(scenario_names(None).len(), 11);
        assert_eq!(scenario_names(Some("SORT")), vec!["sort folders", "sort labels"]);
        assert!(scenario_names(Some("nothing matches")).is_empty());
    }

    #[tokio::test]
    async fn test_sim_suite_passes() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_suite(&quick_config(dir.path()), &run_args(None))
            .await
            .unwrap();
        assert_eq!(report.outcomes.len(), 11);
        assert!(report.all_passed(), "{:?}", report.failures());
    }

    #[tokio::test]
    async fn test_sim_suite_filter() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_suite(&quick_config(dir.path()), &run_args(Some("label")))
            .await
            .unwrap();
        assert!(report.outcomes.iter().all(|o| o.name.contains("label")));
        assert_eq!(report.outcomes.len(), 5);
    }

    #[tokio::test]
    async fn test_clean_sim_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let removed = clean(&quick_config(dir.path()), &CleanArgs { sim: true })
            .await
            .unwrap();
        assert_eq!(removed, (3, 2));
    }
}
