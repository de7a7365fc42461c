//! Page handle with auto-waiting actions and network synchronization.
//!
//! [`Page`] wraps a shared [`Driver`] together with the base URL and wait
//! options of the run. Every element action re-resolves its locator and is
//! retried while the failure is transient, so page objects never sleep.

use crate::driver::{Driver, Screenshot};
use crate::locator::Locator;
use crate::network::{NetworkLog, SyncPlan};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, retry, ElementState, WaitOptions};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Handle to one browser page
#[derive(Debug, Clone)]
pub struct Page {
    driver: Arc<dyn Driver>,
    base_url: String,
    options: WaitOptions,
}

impl Page {
    /// Create a page handle
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, base_url: impl Into<String>, options: WaitOptions) -> Self {
        Self {
            driver,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options,
        }
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Base URL relative paths resolve against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Resolve a path against the base URL; absolute URLs pass through
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Navigate to a path or absolute URL
    pub async fn goto(&self, path: &str) -> ProbeResult<()> {
        let url = self.url_for(path);
        info!(%url, "navigate");
        self.driver.navigate(&url).await
    }

    /// Current URL
    pub async fn url(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }

    /// CSS locator
    #[must_use]
    pub fn locator(&self, css: &str) -> Locator {
        Locator::css(css)
    }

    /// `data-testid` locator
    #[must_use]
    pub fn get_by_test_id(&self, id: &str) -> Locator {
        Locator::test_id(id)
    }

    /// Exact title locator
    #[must_use]
    pub fn get_by_title(&self, title: &str) -> Locator {
        Locator::title(title)
    }

    /// Text locator
    #[must_use]
    pub fn get_by_text(&self, text: &str) -> Locator {
        Locator::text(text)
    }

    /// Exact placeholder locator
    #[must_use]
    pub fn get_by_placeholder(&self, placeholder: &str) -> Locator {
        Locator::placeholder(placeholder)
    }

    fn timeout_for(&self, locator: &Locator) -> Duration {
        locator.timeout().unwrap_or_else(|| self.options.timeout())
    }

    /// Click the single match, waiting until it is actionable
    pub async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        debug!(%locator, "click");
        retry(
            self.timeout_for(locator),
            self.options.poll_interval(),
            || format!("{locator} to be clickable"),
            || self.driver.click(locator),
        )
        .await
    }

    /// Fill the single matching input, waiting until it is actionable
    pub async fn fill(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        debug!(%locator, len = value.len(), "fill");
        retry(
            self.timeout_for(locator),
            self.options.poll_interval(),
            || format!("{locator} to be editable"),
            || self.driver.fill(locator, value),
        )
        .await
    }

    /// Checked state of the single match
    pub async fn is_checked(&self, locator: &Locator) -> ProbeResult<bool> {
        retry(
            self.timeout_for(locator),
            self.options.poll_interval(),
            || format!("{locator} to be attached"),
            || self.driver.is_checked(locator),
        )
        .await
    }

    /// Attribute of the single match
    pub async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        retry(
            self.timeout_for(locator),
            self.options.poll_interval(),
            || format!("{locator} to be attached"),
            || self.driver.attribute(locator, name),
        )
        .await
    }

    /// Computed CSS property of the single match
    pub async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<String> {
        retry(
            self.timeout_for(locator),
            self.options.poll_interval(),
            || format!("{locator} to be attached"),
            || self.driver.computed_style(locator, property),
        )
        .await
    }

    /// Current match count, without waiting
    pub async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        self.driver.count(locator).await
    }

    /// Whether any match is visible right now
    pub async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        self.driver.is_visible(locator).await
    }

    /// Present values of an attribute across all matches, in document order
    pub async fn all_attributes(&self, locator: &Locator, name: &str) -> ProbeResult<Vec<String>> {
        let values = self.driver.attributes(locator, name).await?;
        Ok(values.into_iter().flatten().collect())
    }

    /// Wait until the locator reaches a state
    pub async fn wait_for(&self, locator: &Locator, state: ElementState) -> ProbeResult<()> {
        let driver = &self.driver;
        poll_until(
            self.timeout_for(locator),
            self.options.poll_interval(),
            || format!("{locator} to be {state}"),
            || async move {
                Ok(match state {
                    ElementState::Visible => driver.is_visible(locator).await?,
                    ElementState::Hidden => !driver.is_visible(locator).await?,
                    ElementState::Attached => driver.count(locator).await? > 0,
                    ElementState::Detached => driver.count(locator).await? == 0,
                })
            },
        )
        .await
    }

    /// Wait until the match count satisfies `predicate`
    pub async fn wait_for_count(
        &self,
        locator: &Locator,
        description: &str,
        predicate: impl Fn(usize) -> bool + Sync,
    ) -> ProbeResult<usize> {
        let driver = &self.driver;
        let predicate = &predicate;
        let last = AtomicUsize::new(0);
        let last_ref = &last;
        poll_until(
            self.timeout_for(locator),
            self.options.poll_interval(),
            || format!("{locator} count {description}"),
            || async move {
                let count = driver.count(locator).await?;
                last_ref.store(count, Ordering::SeqCst);
                Ok(predicate(count))
            },
        )
        .await?;
        Ok(last.load(Ordering::SeqCst))
    }

    /// Start an auto-waiting assertion
    #[must_use]
    pub fn expect(&self, locator: &Locator) -> Expect<'_> {
        Expect {
            page: self,
            locator: locator.clone(),
        }
    }

    /// Run `action` while waiting for `plan`; the plan is armed first so
    /// events triggered by the action cannot be missed.
    ///
    /// # Errors
    ///
    /// The first error of either side. A failed action cancels the wait.
    pub async fn synchronized<T, F, Fut>(&self, plan: &SyncPlan, action: F) -> ProbeResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProbeResult<T>>,
    {
        let armed = plan.arm(self.driver.subscribe_network());
        let (value, events) =
            tokio::try_join!(action(), armed.wait(self.options.network_timeout()))?;
        info!(plan = plan.name(), events = events.len(), "network synchronized");
        Ok(value)
    }

    /// Click and block until `plan` is satisfied
    pub async fn click_synchronized(&self, locator: &Locator, plan: &SyncPlan) -> ProbeResult<()> {
        self.synchronized(plan, || self.click(locator)).await
    }

    /// Start recording network events
    #[must_use]
    pub fn network_log(&self) -> NetworkLog {
        NetworkLog::new(self.driver.subscribe_network())
    }

    /// Capture the viewport if the driver supports it
    pub async fn screenshot(&self) -> ProbeResult<Option<Screenshot>> {
        self.driver.screenshot().await
    }
}

/// Auto-waiting assertion on a locator
#[derive(Debug)]
pub struct Expect<'a> {
    page: &'a Page,
    locator: Locator,
}

impl Expect<'_> {
    fn failed(&self, expected: &str, err: ProbeError) -> ProbeError {
        match err {
            ProbeError::Timeout { ms, .. } => {
                ProbeError::assertion(format!("expected {} {expected} within {ms}ms", self.locator))
            }
            other => other,
        }
    }

    /// At least one match becomes visible
    pub async fn to_be_visible(&self) -> ProbeResult<()> {
        self.page
            .wait_for(&self.locator, ElementState::Visible)
            .await
            .map_err(|e| self.failed("to be visible", e))
    }

    /// No match is visible
    pub async fn to_be_hidden(&self) -> ProbeResult<()> {
        self.page
            .wait_for(&self.locator, ElementState::Hidden)
            .await
            .map_err(|e| self.failed("to be hidden", e))
    }

    /// Exactly `count` matches
    pub async fn to_have_count(&self, count: usize) -> ProbeResult<()> {
        let description = format!("== {count}");
        self.page
            .wait_for_count(&self.locator, &description, |n| n == count)
            .await
            .map(|_| ())
            .map_err(|e| self.failed(&format!("to have {count} matches"), e))
    }

    /// At least `count` matches
    pub async fn to_have_count_at_least(&self, count: usize) -> ProbeResult<()> {
        let description = format!(">= {count}");
        self.page
            .wait_for_count(&self.locator, &description, |n| n >= count)
            .await
            .map(|_| ())
            .map_err(|e| self.failed(&format!("to have at least {count} matches"), e))
    }
}
