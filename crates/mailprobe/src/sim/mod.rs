//! In-process simulated webmail.
//!
//! [`SimDriver`] implements [`Driver`] over a model of the login page and the
//! folders/labels settings screen, publishing the backend traffic the live
//! app produces. Page objects and scenarios run against it unchanged, which
//! is how they are exercised without a browser or an account.

mod app;
pub mod dom;
pub mod selector;

pub use app::{Action, Field, Item, SimState, SIM_ACCOUNT_URL, SIM_AUTH_COOKIE, SIM_BASE_URL};

use crate::driver::Driver;
use crate::locator::Locator;
use crate::network::{NetworkEvent, NETWORK_CHANNEL_CAPACITY};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Cookie;
use app::App;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Driver backed by the simulated webmail
#[derive(Debug)]
pub struct SimDriver {
    app: Mutex<App>,
    events: broadcast::Sender<NetworkEvent>,
    base_url: String,
    account_url: String,
}

impl SimDriver {
    /// Fresh browser with no session
    #[must_use]
    pub fn new(state: SimState) -> Self {
        let (events, _) = broadcast::channel(NETWORK_CHANNEL_CAPACITY);
        let base_url = state.base_url().to_string();
        let account_url = state.account_url().to_string();
        Self {
            app: Mutex::new(App::new(state)),
            events,
            base_url,
            account_url,
        }
    }

    /// Browser that already holds a valid session cookie
    #[must_use]
    pub fn authenticated(state: SimState) -> Self {
        let driver = Self::new(state);
        if let Ok(mut app) = driver.app.lock() {
            let cookie = app.auth_cookie();
            app.set_cookies(&[cookie]);
        }
        driver
    }

    /// Mail app origin
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Identity provider origin
    #[must_use]
    pub fn account_url(&self) -> &str {
        &self.account_url
    }

    /// Backend view of folder display names, bypassing the UI
    pub fn folder_names(&self) -> ProbeResult<Vec<String>> {
        self.with_app(|app, _| Ok(app.folder_names()))
    }

    /// Backend view of label names, bypassing the UI
    pub fn label_names(&self) -> ProbeResult<Vec<String>> {
        self.with_app(|app, _| Ok(app.label_names()))
    }

    fn with_app<T>(
        &self,
        f: impl FnOnce(&mut App, &mut Vec<NetworkEvent>) -> ProbeResult<T>,
    ) -> ProbeResult<T> {
        let mut events = Vec::new();
        let result = {
            let mut app = self
                .app
                .lock()
                .map_err(|_| ProbeError::page("simulated app state poisoned"))?;
            f(&mut app, &mut events)
        };
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
        result
    }

    /// Like [`Self::with_app`], advancing UI timers first as a real page would
    fn step<T>(
        &self,
        f: impl FnOnce(&mut App, &mut Vec<NetworkEvent>) -> ProbeResult<T>,
    ) -> ProbeResult<T> {
        self.with_app(|app, events| {
            app.tick();
            f(app, events)
        })
    }
}

#[async_trait]
impl Driver for SimDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.with_app(|app, events| app.navigate(url, events))
    }

    async fn current_url(&self) -> ProbeResult<String> {
        self.with_app(|app, _| Ok(app.current_url().to_string()))
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        self.step(|app, _| Ok(app.render().resolve(locator)?.len()))
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        self.step(|app, _| {
            let dom = app.render();
            Ok(dom.resolve(locator)?.into_iter().any(|n| dom.is_visible(n)))
        })
    }

    async fn attributes(&self, locator: &Locator, name: &str) -> ProbeResult<Vec<Option<String>>> {
        self.step(|app, _| {
            let dom = app.render();
            Ok(dom
                .resolve(locator)?
                .into_iter()
                .map(|n| dom.node(n).attr(name).map(ToString::to_string))
                .collect())
        })
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.step(|app, events| app.click(locator, events))
    }

    async fn fill(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        self.step(|app, _| app.fill(locator, value))
    }

    async fn is_checked(&self, locator: &Locator) -> ProbeResult<bool> {
        self.step(|app, _| {
            let dom = app.render();
            Ok(dom.node(dom.single(locator)?).checked)
        })
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        self.step(|app, _| {
            let dom = app.render();
            Ok(dom.node(dom.single(locator)?).attr(name).map(ToString::to_string))
        })
    }

    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<String> {
        self.step(|app, _| {
            let dom = app.render();
            let node = dom.node(dom.single(locator)?);
            Ok(node.styles.get(property).cloned().unwrap_or_default())
        })
    }

    fn subscribe_network(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }

    async fn cookies(&self) -> ProbeResult<Vec<Cookie>> {
        self.with_app(|app, _| Ok(app.cookies()))
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> ProbeResult<()> {
        self.with_app(|app, _| {
            app.set_cookies(cookies);
            Ok(())
        })
    }

    async fn local_storage(&self) -> ProbeResult<HashMap<String, String>> {
        self.with_app(|app, _| Ok(app.local_storage()))
    }

    async fn set_local_storage(&self, entries: &HashMap<String, String>) -> ProbeResult<()> {
        self.with_app(|app, _| {
            app.set_local_storage(entries);
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::model::Folder;
    use crate::network::{HttpMethod, NetworkLog, UrlPattern, LABELS_API};

    #[tokio::test]
    async fn test_navigation_publishes_document_request() {
        let driver = SimDriver::authenticated(SimState::default());
        let mut log = NetworkLog::new(driver.subscribe_network());
        driver
            .navigate(&format!("{SIM_BASE_URL}/u/0/mail/folders-labels"))
            .await
            .unwrap();
        assert_eq!(log.events().len(), 2);
    }

    #[tokio::test]
    async fn test_row_menu_delete_flow() {
        let driver = SimDriver::authenticated(SimState::default().with_folder(Folder::new("Junk")));
        driver
            .navigate(&format!("{SIM_BASE_URL}/u/0/mail/folders-labels"))
            .await
            .unwrap();
        let mut log = NetworkLog::new(driver.subscribe_network());

        driver.click(&Locator::test_id("dropdown:open")).await.unwrap();
        driver
            .click(&Locator::test_id("folders/labels:item-delete"))
            .await
            .unwrap();
        driver
            .click(&Locator::css(".alert-modal-footer button").with_text("Delete"))
            .await
            .unwrap();

        assert!(driver.folder_names().unwrap().is_empty());
        assert_eq!(
            log.count_requests(&UrlPattern::contains(LABELS_API), HttpMethod::Delete),
            1
        );
        assert!(driver.is_visible(&Locator::css("[role=\"alert\"]")).await.unwrap());
    }

    #[tokio::test]
    async fn test_fill_requires_input() {
        let driver = SimDriver::authenticated(SimState::default());
        driver
            .navigate(&format!("{SIM_BASE_URL}/u/0/mail/folders-labels"))
            .await
            .unwrap();
        let err = driver
            .fill(&Locator::css("button").with_text("Add folder"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::NotActionable { .. }));
    }

    #[tokio::test]
    async fn test_cookies_round_trip() {
        let driver = SimDriver::new(SimState::default());
        assert!(driver.cookies().await.unwrap().is_empty());
        let cookie = Cookie::new(SIM_AUTH_COOKIE, "restored", "mail.sim.test");
        driver.set_cookies(&[cookie]).await.unwrap();
        driver
            .navigate(&format!("{SIM_BASE_URL}/u/0/mail/folders-labels"))
            .await
            .unwrap();
        assert_eq!(
            driver.current_url().await.unwrap(),
            format!("{SIM_BASE_URL}/u/0/mail/folders-labels")
        );
    }
}
