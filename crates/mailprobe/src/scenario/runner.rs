//! Sequential scenario runner

use super::report::{ScenarioOutcome, SuiteReport};
use super::{PageFactory, Scenario};
use crate::page_object::PageObject;
use crate::pages::FoldersLabelsPage;
use crate::result::ProbeResult;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Runner options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only run scenarios whose name contains this (case-insensitive)
    pub filter: Option<String>,
    /// Skip the remaining scenarios after the first failure
    pub fail_fast: bool,
    /// Directory for failure screenshots; none are written when unset
    pub artifacts_dir: Option<PathBuf>,
}

impl RunOptions {
    /// Default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set filter
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    fn selects(&self, name: &str) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |f| name.to_lowercase().contains(&f.to_lowercase()))
    }
}

/// Runs scenarios one after another, each with its own page
pub struct ScenarioRunner<F> {
    factory: F,
    options: RunOptions,
}

impl<F> std::fmt::Debug for ScenarioRunner<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

impl<F: PageFactory> ScenarioRunner<F> {
    /// Runner over `factory`
    #[must_use]
    pub const fn new(factory: F, options: RunOptions) -> Self {
        Self { factory, options }
    }

    /// Run every selected scenario and collect the report
    pub async fn run(&self, scenarios: &[Box<dyn Scenario>]) -> SuiteReport {
        let mut report = SuiteReport::start(Uuid::new_v4());
        info!(run_id = %report.run_id, scenarios = scenarios.len(), "suite started");
        let mut stop = false;
        for scenario in scenarios.iter().filter(|s| self.options.selects(s.name())) {
            if stop {
                report.outcomes.push(ScenarioOutcome::skipped(scenario.name()));
                continue;
            }
            let outcome = self.run_one(scenario.as_ref(), report.run_id).await;
            stop = self.options.fail_fast && outcome.status.is_failed();
            report.outcomes.push(outcome);
        }
        report.finish();
        info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            skipped = report.skipped_count(),
            "suite finished"
        );
        report
    }

    /// Run one scenario: setup, run, then teardown regardless of the result
    pub async fn run_one(&self, scenario: &dyn Scenario, run_id: Uuid) -> ScenarioOutcome {
        let name = scenario.name();
        let start = Instant::now();
        info!(scenario = name, "scenario started");

        let page = match self.factory.create().await {
            Ok(page) => page,
            Err(err) => return ScenarioOutcome::failed(name, start.elapsed(), err.to_string()),
        };

        let body = Self::body(scenario, &page).await;
        let screenshot = match &body {
            Err(_) => self.save_screenshot(&page, name, run_id).await,
            Ok(()) => None,
        };

        info!(scenario = name, "teardown");
        let teardown = scenario.teardown(&page).await;
        if let Err(err) = page.page().driver().close().await {
            warn!(scenario = name, error = %err, "closing the page failed");
        }

        let mut outcome = match body {
            Ok(()) => ScenarioOutcome::passed(name, start.elapsed()),
            Err(err) => {
                warn!(scenario = name, error = %err, "scenario failed");
                ScenarioOutcome::failed(name, start.elapsed(), err.to_string())
            }
        };
        outcome.screenshot = screenshot;
        if let Err(err) = teardown {
            warn!(scenario = name, error = %err, "teardown failed");
            outcome.teardown_error = Some(err.to_string());
        }
        info!(scenario = name, status = %outcome.status, "scenario finished");
        outcome
    }

    async fn body(scenario: &dyn Scenario, page: &FoldersLabelsPage) -> ProbeResult<()> {
        page.goto().await?;
        info!(scenario = scenario.name(), "setup");
        scenario.setup(page).await?;
        info!(scenario = scenario.name(), "run");
        scenario.run(page).await
    }

    async fn save_screenshot(
        &self,
        page: &FoldersLabelsPage,
        name: &str,
        run_id: Uuid,
    ) -> Option<PathBuf> {
        let dir = self.options.artifacts_dir.as_deref()?;
        match page.page().screenshot().await {
            Ok(Some(shot)) => {
                let path = dir.join(format!("{run_id}-{}.{}", slug(name), shot.format));
                match write_artifact(dir, &path, &shot.data).await {
                    Ok(()) => Some(path),
                    Err(err) => {
                        warn!(error = %err, "could not write screenshot");
                        None
                    }
                }
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "screenshot failed");
                None
            }
        }
    }
}

async fn write_artifact(dir: &Path, path: &Path, data: &[u8]) -> ProbeResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, data).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::result::ProbeError;
    use crate::sim::{SimDriver, SimState, SIM_BASE_URL};
    use crate::wait::WaitOptions;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sim_factory() -> impl PageFactory {
        || async {
            let driver = Arc::new(SimDriver::authenticated(SimState::default()));
            let options = WaitOptions::new()
                .with_timeout(200)
                .with_network_timeout(200)
                .with_poll_interval(5);
            Ok(FoldersLabelsPage::new(Page::new(driver, SIM_BASE_URL, options), 0))
        }
    }

    #[derive(Debug, Default)]
    struct Probe {
        fail_run: bool,
        fail_teardown: bool,
        teardowns: AtomicUsize,
    }

    #[async_trait]
    impl Scenario for Probe {
        fn name(&self) -> &str {
            "probe scenario"
        }

        async fn run(&self, _page: &FoldersLabelsPage) -> ProbeResult<()> {
            if self.fail_run {
                Err(ProbeError::assertion("run failed"))
            } else {
                Ok(())
            }
        }

        async fn teardown(&self, _page: &FoldersLabelsPage) -> ProbeResult<()> {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
            if self.fail_teardown {
                Err(ProbeError::assertion("teardown failed"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("add child folder"), "add-child-folder");
        assert_eq!(slug("  Sort / Labels!"), "sort-labels");
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let options = RunOptions::new().with_filter("SORT");
        assert!(options.selects("sort labels"));
        assert!(!options.selects("add label"));
        assert!(RunOptions::new().selects("anything"));
    }

    #[tokio::test]
    async fn test_teardown_runs_after_failure() {
        let runner = ScenarioRunner::new(sim_factory(), RunOptions::new());
        let probe = Probe {
            fail_run: true,
            ..Probe::default()
        };
        let outcome = runner.run_one(&probe, Uuid::new_v4()).await;
        assert!(outcome.status.is_failed());
        assert_eq!(probe.teardowns.load(Ordering::SeqCst), 1);
        assert!(outcome.error.unwrap().contains("run failed"));
    }

    #[tokio::test]
    async fn test_teardown_error_does_not_mask_body_error() {
        let runner = ScenarioRunner::new(sim_factory(), RunOptions::new());
        let probe = Probe {
            fail_run: true,
            fail_teardown: true,
            ..Probe::default()
        };
        let outcome = runner.run_one(&probe, Uuid::new_v4()).await;
        assert!(outcome.error.unwrap().contains("run failed"));
        assert!(outcome.teardown_error.unwrap().contains("teardown failed"));
    }

    #[tokio::test]
    async fn test_fail_fast_skips_rest() {
        let runner = ScenarioRunner::new(sim_factory(), RunOptions::new().with_fail_fast(true));
        let scenarios: Vec<Box<dyn Scenario>> = vec![
            Box::new(Probe {
                fail_run: true,
                ..Probe::default()
            }),
            Box::new(Probe::default()),
        ];
        let report = runner.run(&scenarios).await;
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
    }

    #[tokio::test]
    async fn test_factory_error_is_a_failure() {
        let runner = ScenarioRunner::new(
            || async {
                Err::<FoldersLabelsPage, _>(ProbeError::BrowserLaunch {
                    message: "no chromium".to_string(),
                })
            },
            RunOptions::new(),
        );
        let outcome = runner.run_one(&Probe::default(), Uuid::new_v4()).await;
        assert!(outcome.error.unwrap().contains("no chromium"));
    }
}
