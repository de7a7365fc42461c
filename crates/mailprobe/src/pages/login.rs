//! Identity provider login screen

use crate::config::Credentials;
use crate::locator::Locator;
use crate::page::Page;
use crate::page_object::PageObject;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::poll_until;
use tracing::info;

/// Login form on the account origin
#[derive(Debug, Clone)]
pub struct LoginPage {
    page: Page,
    account_url: String,
    /// Email or username input
    pub username: Locator,
    /// Password input
    pub password: Locator,
    /// "Keep me signed in" checkbox
    pub stay_signed_in: Locator,
    /// Submit button
    pub submit: Locator,
    /// Rejection message
    pub error: Locator,
    /// Account menu shown once the mail app has loaded
    pub signed_in: Locator,
}

impl LoginPage {
    /// Login page object for `account_url`
    #[must_use]
    pub fn new(page: Page, account_url: impl Into<String>) -> Self {
        Self {
            page,
            account_url: account_url.into().trim_end_matches('/').to_string(),
            username: Locator::css("#username"),
            password: Locator::css("#password"),
            stay_signed_in: Locator::css("#staySignedIn"),
            submit: Locator::css("button[type=\"submit\"]"),
            error: Locator::css("form [role=\"alert\"]"),
            signed_in: Locator::css("button[data-testid=\"heading:userdropdown\"]"),
        }
    }

    /// Sign in and wait for the mail app.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Session`] when the identity provider rejects the
    /// credentials; timeouts and driver errors otherwise.
    pub async fn login(&self, credentials: &Credentials) -> ProbeResult<()> {
        self.goto().await?;
        info!(username = %credentials.username, "signing in");
        self.page.fill(&self.username, &credentials.username).await?;
        self.page
            .fill(&self.password, credentials.password.expose())
            .await?;
        if !self.page.is_checked(&self.stay_signed_in).await? {
            self.page.click(&self.stay_signed_in).await?;
        }
        self.page.click(&self.submit).await?;

        let page = &self.page;
        let (signed_in, error) = (&self.signed_in, &self.error);
        poll_until(
            page.options().network_timeout(),
            page.options().poll_interval(),
            || format!("{signed_in} or {error}"),
            || async move { Ok(page.is_visible(signed_in).await? || page.is_visible(error).await?) },
        )
        .await?;

        if self.page.is_visible(&self.error).await? {
            return Err(ProbeError::Session {
                message: format!("login rejected for {}", credentials.username),
            });
        }
        info!("signed in");
        Ok(())
    }
}

impl PageObject for LoginPage {
    fn page(&self) -> &Page {
        &self.page
    }

    fn url(&self) -> String {
        format!("{}/login", self.account_url)
    }

    fn ready_marker(&self) -> Locator {
        self.username.clone()
    }

    fn page_name(&self) -> &str {
        "login"
    }
}
