//! Page Object support
//!
//! A page object owns a [`Page`] handle plus the locators for one screen.
//! Locators live in plain structs; behaviour lives in `async` methods on the
//! page object. Shared controls are composed in, never inherited.

use crate::locator::Locator;
use crate::page::Page;
use crate::result::ProbeResult;
use crate::wait::ElementState;
use async_trait::async_trait;
use tracing::info;

/// A screen reachable by URL
///
/// # Example
///
/// ```ignore
/// struct InboxPage { page: Page }
///
/// impl PageObject for InboxPage {
///     fn page(&self) -> &Page { &self.page }
///     fn url(&self) -> String { self.page.url_for("/u/0/mail/inbox") }
///     fn ready_marker(&self) -> Locator { Locator::css("main h1") }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Page handle the object acts through
    fn page(&self) -> &Page;

    /// Absolute URL of the screen
    fn url(&self) -> String;

    /// Element whose visibility means the screen is ready
    fn ready_marker(&self) -> Locator;

    /// Name for logs and reports
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Navigate and wait until the ready marker is visible
    async fn goto(&self) -> ProbeResult<()> {
        let url = self.url();
        info!(page = self.page_name(), %url, "open page");
        self.page().goto(&url).await?;
        self.page()
            .wait_for(&self.ready_marker(), ElementState::Visible)
            .await
    }

    /// Whether the ready marker is currently visible, without waiting
    async fn is_loaded(&self) -> ProbeResult<bool> {
        self.page().is_visible(&self.ready_marker()).await
    }
}
