//! Scenarios against the folders and labels screen
//!
//! A [`Scenario`] has three phases. [`ScenarioRunner`] builds a fresh
//! [`FoldersLabelsPage`] for every scenario through a [`PageFactory`], runs
//! setup and run, and always runs teardown afterwards.

mod builtin;
mod report;
mod runner;

pub use builtin::builtin_scenarios;
pub use report::{ScenarioOutcome, ScenarioStatus, SuiteReport};
pub use runner::{RunOptions, ScenarioRunner};

use crate::page_object::PageObject;
use crate::pages::FoldersLabelsPage;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::future::Future;
use tracing::info;

/// One end-to-end scenario
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Name used for filtering and reporting
    fn name(&self) -> &str;

    /// Preconditions
    async fn setup(&self, _page: &FoldersLabelsPage) -> ProbeResult<()> {
        Ok(())
    }

    /// Actions and assertions
    async fn run(&self, page: &FoldersLabelsPage) -> ProbeResult<()>;

    /// Cleanup; runs even when setup or run failed
    async fn teardown(&self, page: &FoldersLabelsPage) -> ProbeResult<()> {
        clean_slate(page).await.map(|_| ())
    }
}

/// Produces the page context for one scenario
#[async_trait]
pub trait PageFactory: Send + Sync {
    /// Build a fresh page; the runner navigates it
    async fn create(&self) -> ProbeResult<FoldersLabelsPage>;
}

#[async_trait]
impl<F, Fut> PageFactory for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ProbeResult<FoldersLabelsPage>> + Send + 'static,
{
    async fn create(&self) -> ProbeResult<FoldersLabelsPage> {
        self().await
    }
}

/// Reload the screen, then delete every folder and label. Returns
/// `(folders, labels)` removed.
///
/// # Errors
///
/// Returns navigation and bulk deletion errors.
pub async fn clean_slate(page: &FoldersLabelsPage) -> ProbeResult<(usize, usize)> {
    page.goto().await?;
    let folders = page.delete_all_folders().await?;
    let labels = page.delete_all_labels().await?;
    info!(folders, labels, "clean slate");
    Ok((folders, labels))
}

/// Fail with an assertion error unless `condition` holds
///
/// # Errors
///
/// [`ProbeError::AssertionFailed`] carrying `message`.
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message()))
    }
}
