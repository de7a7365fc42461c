//! Chromium over the `DevTools` Protocol.
//!
//! [`CdpDriver`] launches one Chromium per instance through chromiumoxide and
//! implements [`Driver`] for its single page. Locators are compiled to
//! JavaScript with [`Locator::to_js`] and evaluated in the page; clicks and
//! typing go through CDP input so the app receives trusted events. Network
//! traffic is forwarded from the `Network` domain into the broadcast channel
//! that synchronization plans subscribe to.

use crate::config::{BrowserSettings, Credentials, SuiteConfig};
use crate::driver::{Driver, Screenshot};
use crate::locator::{js_str, Locator};
use crate::network::{HttpMethod, NetworkEvent, NETWORK_CHANNEL_CAPACITY};
use crate::page::Page;
use crate::pages::FoldersLabelsPage;
use crate::result::{ProbeError, ProbeResult};
use crate::session::{bootstrap, restore, Cookie, SameSite, SessionStore, StorageState};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::network::{
    self as cdp_network, CookieParam, CookieSameSite, EventRequestWillBeSent,
    EventResponseReceived, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const VISIBLE_JS: &str = r"  const __visible = e => {
    const r = e.getBoundingClientRect();
    const s = getComputedStyle(e);
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
  };
";

/// Outcome of resolving a locator to exactly one element in the page
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Resolved<T> {
    Ok { value: T },
    None,
    Many { count: usize },
    Hidden,
    Unfillable,
}

impl<T> Resolved<T> {
    fn into_result(self, locator: &Locator) -> ProbeResult<T> {
        match self {
            Self::Ok { value } => Ok(value),
            Self::None => Err(ProbeError::ElementNotFound {
                locator: locator.to_string(),
            }),
            Self::Many { count } => Err(ProbeError::StrictModeViolation {
                locator: locator.to_string(),
                count,
            }),
            Self::Hidden => Err(ProbeError::NotActionable {
                locator: locator.to_string(),
                reason: "element is not visible".to_string(),
            }),
            Self::Unfillable => Err(ProbeError::NotActionable {
                locator: locator.to_string(),
                reason: "element is not an <input>, <textarea> or editable".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Center {
    x: f64,
    y: f64,
}

fn single_js(locator: &Locator, require_visible: bool, body: &str) -> String {
    let visible_check = if require_visible {
        "  if (!__visible(el)) return { status: 'hidden' };\n"
    } else {
        ""
    };
    format!(
        "(() => {{\n{VISIBLE_JS}  const els = {};\n  if (els.length === 0) return {{ status: 'none' }};\n  if (els.length > 1) return {{ status: 'many', count: els.length }};\n  const el = els[0];\n{visible_check}{body}\n}})()",
        locator.to_js()
    )
}

fn page_error(err: impl ToString) -> ProbeError {
    ProbeError::page(err)
}

fn to_cdp_same_site(same_site: SameSite) -> CookieSameSite {
    match same_site {
        SameSite::Strict => CookieSameSite::Strict,
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::None => CookieSameSite::None,
    }
}

/// Driver for a real Chromium page
#[derive(Debug)]
pub struct CdpDriver {
    browser: Mutex<Option<CdpBrowser>>,
    page: CdpPage,
    events: broadcast::Sender<NetworkEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl CdpDriver {
    /// Launch Chromium and open a blank page with network capture enabled
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::BrowserLaunch`] if Chromium cannot start, or a
    /// page error if the page or its event listeners cannot be set up.
    pub async fn launch(settings: &BrowserSettings) -> ProbeResult<Self> {
        let mut builder =
            CdpConfig::builder().window_size(settings.viewport_width, settings.viewport_height);
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|message| ProbeError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(config)
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(page_error)?;
        let (events, _) = broadcast::channel(NETWORK_CHANNEL_CAPACITY);
        let network_task = Self::forward_network(&page, events.clone()).await?;
        info!(headless = settings.headless, "chromium launched");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            events,
            tasks: vec![handler_task, network_task],
        })
    }

    async fn forward_network(
        page: &CdpPage,
        events: broadcast::Sender<NetworkEvent>,
    ) -> ProbeResult<JoinHandle<()>> {
        page.execute(cdp_network::EnableParams::default())
            .await
            .map_err(page_error)?;
        let requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(page_error)?
            .map(|e| {
                NetworkEvent::request(HttpMethod::from_str(&e.request.method), e.request.url.clone())
            });
        let responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(page_error)?
            .map(|e| {
                NetworkEvent::response(
                    e.response.url.clone(),
                    u16::try_from(e.response.status).unwrap_or_default(),
                )
            });
        let mut merged = futures::stream::select(requests, responses);
        Ok(tokio::spawn(async move {
            while let Some(event) = merged.next().await {
                // No subscribers is fine
                let _ = events.send(event);
            }
        }))
    }

    async fn eval<T: DeserializeOwned>(&self, js: String) -> ProbeResult<T> {
        self.page
            .evaluate(js)
            .await
            .map_err(page_error)?
            .into_value()
            .map_err(page_error)
    }

    async fn single<T: DeserializeOwned>(
        &self,
        locator: &Locator,
        require_visible: bool,
        body: &str,
    ) -> ProbeResult<T> {
        let resolved: Resolved<T> = self
            .eval(single_js(locator, require_visible, body))
            .await?;
        resolved.into_result(locator)
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        debug!(url, "goto");
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(page_error)?
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        self.eval(format!("{}.length", locator.to_js())).await
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        self.eval(format!(
            "(() => {{\n{VISIBLE_JS}  return {}.some(__visible);\n}})()",
            locator.to_js()
        ))
        .await
    }

    async fn attributes(&self, locator: &Locator, name: &str) -> ProbeResult<Vec<Option<String>>> {
        self.eval(format!(
            "{}.map(e => e.getAttribute({}))",
            locator.to_js(),
            js_str(name)
        ))
        .await
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        let center: Center = self
            .single(
                locator,
                true,
                "  el.scrollIntoView({ block: 'center', inline: 'center' });\n  const r = el.getBoundingClientRect();\n  return { status: 'ok', value: { x: r.left + r.width / 2, y: r.top + r.height / 2 } };",
            )
            .await?;
        debug!(%locator, x = center.x, y = center.y, "click");
        self.page
            .click(Point::new(center.x, center.y))
            .await
            .map_err(page_error)?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let () = self
            .single(
                locator,
                true,
                "  const editable = el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement;\n  if (!editable && !el.isContentEditable) return { status: 'unfillable' };\n  el.focus();\n  if (editable) { el.value = ''; } else { el.textContent = ''; }\n  el.dispatchEvent(new Event('input', { bubbles: true }));\n  return { status: 'ok', value: null };",
            )
            .await?;
        if !value.is_empty() {
            self.page
                .execute(InsertTextParams::new(value))
                .await
                .map_err(page_error)?;
        }
        debug!(%locator, "fill");
        Ok(())
    }

    async fn is_checked(&self, locator: &Locator) -> ProbeResult<bool> {
        self.single(
            locator,
            false,
            "  return { status: 'ok', value: !!el.checked || el.getAttribute('aria-checked') === 'true' };",
        )
        .await
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let body = format!(
            "  return {{ status: 'ok', value: el.getAttribute({}) }};",
            js_str(name)
        );
        self.single(locator, false, &body).await
    }

    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<String> {
        let body = format!(
            "  return {{ status: 'ok', value: getComputedStyle(el).getPropertyValue({}) }};",
            js_str(property)
        );
        self.single(locator, false, &body).await
    }

    fn subscribe_network(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }

    async fn cookies(&self) -> ProbeResult<Vec<Cookie>> {
        let cookies = self.page.get_cookies().await.map_err(page_error)?;
        Ok(cookies
            .into_iter()
            .map(|c| {
                let same_site = match c.same_site {
                    Some(CookieSameSite::Strict) => SameSite::Strict,
                    Some(CookieSameSite::None) => SameSite::None,
                    _ => SameSite::Lax,
                };
                #[allow(clippy::cast_possible_truncation)]
                let expires = (!c.session).then_some(c.expires as i64);
                Cookie {
                    name: c.name,
                    value: c.value,
                    domain: c.domain,
                    path: c.path,
                    expires,
                    http_only: c.http_only,
                    secure: c.secure,
                    same_site,
                }
            })
            .collect())
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> ProbeResult<()> {
        let mut params = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .http_only(cookie.http_only)
                .same_site(to_cdp_same_site(cookie.same_site));
            if let Some(expires) = cookie.expires {
                #[allow(clippy::cast_precision_loss)]
                let at = TimeSinceEpoch::new(expires as f64);
                builder = builder.expires(at);
            }
            params.push(builder.build().map_err(page_error)?);
        }
        self.page.set_cookies(params).await.map_err(page_error)?;
        Ok(())
    }

    async fn local_storage(&self) -> ProbeResult<HashMap<String, String>> {
        self.eval("Object.fromEntries(Object.entries(window.localStorage))".to_string())
            .await
    }

    async fn set_local_storage(&self, entries: &HashMap<String, String>) -> ProbeResult<()> {
        let json = serde_json::to_string(entries)?;
        let () = self
            .eval(format!(
                "(entries => {{ for (const [k, v] of Object.entries(entries)) window.localStorage.setItem(k, v); return null; }})({json})"
            ))
            .await?;
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Option<Screenshot>> {
        use base64::Engine;

        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(page_error)?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(page_error)?;
        Ok(Some(Screenshot::png(data)))
    }

    async fn close(&self) -> ProbeResult<()> {
        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            browser.close().await.map_err(|e| ProbeError::BrowserLaunch {
                message: e.to_string(),
            })?;
            let _ = browser.wait().await;
        }
        for task in &self.tasks {
            task.abort();
        }
        info!("chromium closed");
        Ok(())
    }
}

/// Launch Chromium with the saved session loaded and wrap it in the
/// settings page object
///
/// # Errors
///
/// Returns launch and driver errors.
pub async fn open_settings(
    config: &SuiteConfig,
    session: &StorageState,
) -> ProbeResult<FoldersLabelsPage> {
    let driver = Arc::new(CdpDriver::launch(&config.browser).await?);
    let page = Page::new(driver, config.base_url.clone(), config.wait_options());
    restore(&page, session).await?;
    Ok(FoldersLabelsPage::new(page, config.user_index)
        .with_max_bulk_deletions(config.max_bulk_deletions))
}

/// Sign in with a fresh browser and write the session artifact
///
/// # Errors
///
/// Returns launch, login and I/O errors.
pub async fn login_and_save(
    config: &SuiteConfig,
    credentials: &Credentials,
) -> ProbeResult<StorageState> {
    let driver = Arc::new(CdpDriver::launch(&config.browser).await?);
    let page = Page::new(driver.clone(), config.base_url.clone(), config.wait_options());
    let result = bootstrap(&page, &config.account_url, credentials).await;
    let closed = driver.close().await;
    let state = result?;
    closed?;
    SessionStore::new(&config.session_path).save(&state)?;
    info!(path = %config.session_path.display(), "session saved");
    Ok(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_single_js_shape() {
        let js = single_js(&Locator::css("#folder"), true, "  return { status: 'ok', value: 1 };");
        assert!(js.starts_with("(() => {"));
        assert!(js.contains("status: 'hidden'"));
        assert!(js.contains("status: 'many'"));
        assert!(js.ends_with("})()"));
        let lenient = single_js(&Locator::css("#folder"), false, "");
        assert!(!lenient.contains("status: 'hidden'"));
    }

    #[test]
    fn test_resolved_maps_to_errors() {
        let locator = Locator::css("li");
        let none: Resolved<bool> = serde_json::from_str(r#"{"status":"none"}"#).unwrap();
        assert!(matches!(
            none.into_result(&locator),
            Err(ProbeError::ElementNotFound { .. })
        ));
        let many: Resolved<bool> =
            serde_json::from_str(r#"{"status":"many","count":3}"#).unwrap();
        assert!(matches!(
            many.into_result(&locator),
            Err(ProbeError::StrictModeViolation { count: 3, .. })
        ));
        let ok: Resolved<bool> =
            serde_json::from_str(r#"{"status":"ok","value":true}"#).unwrap();
        assert!(ok.into_result(&locator).unwrap());
    }
}
