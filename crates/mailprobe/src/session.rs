//! Session bootstrap and the persisted session artifact.
//!
//! Logging in through the identity provider is slow and rate limited, so it
//! happens once: [`bootstrap`] signs in and [`capture`]s cookies plus local
//! storage into a [`StorageState`], [`SessionStore`] writes it as JSON, and
//! every later run [`restore`]s it into a fresh browser before navigating.

use crate::config::Credentials;
use crate::page::Page;
use crate::pages::LoginPage;
use crate::result::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Same site cookie setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// Strict same site
    Strict,
    /// Lax same site
    #[default]
    Lax,
    /// No same site restriction
    None,
}

/// A browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain
    pub domain: String,
    /// Path
    pub path: String,
    /// Expiration timestamp (seconds since epoch); `None` for session cookies
    pub expires: Option<i64>,
    /// HTTP only flag
    pub http_only: bool,
    /// Secure flag
    pub secure: bool,
    /// Same site setting
    #[serde(default)]
    pub same_site: SameSite,
}

impl Cookie {
    /// Create a session cookie on `/`
    #[must_use]
    pub fn new(name: &str, value: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            expires: None,
            http_only: false,
            secure: false,
            same_site: SameSite::Lax,
        }
    }

    /// Set path
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Set expiration
    #[must_use]
    pub const fn with_expires(mut self, expires: i64) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set HTTP only
    #[must_use]
    pub const fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    /// Set secure
    #[must_use]
    pub const fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Set same site
    #[must_use]
    pub const fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Whether the cookie has expired at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now.timestamp())
    }
}

/// Persisted authenticated session
///
/// Local storage is keyed by origin. [`capture`] only sees the origin the
/// browser is on; [`bootstrap`] adds the identity provider's origin through
/// [`capture_origin`]. Any other origin the app relies on must be added the
/// same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageState {
    /// Origin the session was captured on
    #[serde(default)]
    pub origin: Option<String>,
    /// Cookies
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    /// Local storage per origin
    #[serde(default)]
    pub local_storage: HashMap<String, HashMap<String, String>>,
    /// Capture time
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl StorageState {
    /// Create empty storage state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add local storage item
    #[must_use]
    pub fn with_local_storage(mut self, origin: &str, key: &str, value: &str) -> Self {
        self.local_storage
            .entry(origin.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Check if storage is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.local_storage.is_empty()
    }

    /// Drop cookies that expired before `now`
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.cookies.len();
        self.cookies.retain(|c| !c.is_expired(now));
        before - self.cookies.len()
    }
}

/// JSON file holding a [`StorageState`]
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Artifact location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an artifact has been written
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the artifact, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an I/O or JSON error.
    pub fn save(&self, state: &StorageState) -> ProbeResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), cookies = state.cookies.len(), "session saved");
        Ok(())
    }

    /// Read the artifact
    ///
    /// # Errors
    ///
    /// [`ProbeError::Session`] when the file is missing or holds no
    /// cookies; JSON errors when it does not parse.
    pub fn load(&self) -> ProbeResult<StorageState> {
        if !self.exists() {
            return Err(ProbeError::Session {
                message: format!(
                    "no session artifact at {}; run `mailprobe login` first",
                    self.path.display()
                ),
            });
        }
        let text = std::fs::read_to_string(&self.path)?;
        let mut state: StorageState = serde_json::from_str(&text)?;
        let pruned = state.prune_expired(Utc::now());
        if pruned > 0 {
            debug!(pruned, "dropped expired cookies");
        }
        if state.cookies.is_empty() {
            return Err(ProbeError::Session {
                message: format!("session artifact {} has no live cookies", self.path.display()),
            });
        }
        Ok(state)
    }
}

fn origin_of(url: &str) -> Option<String> {
    let scheme_end = url.find("://")? + 3;
    let end = url[scheme_end..]
        .find('/')
        .map_or(url.len(), |i| scheme_end + i);
    Some(url[..end].to_string())
}

/// Snapshot cookies and the current origin's local storage
///
/// # Errors
///
/// Returns driver errors.
pub async fn capture(page: &Page) -> ProbeResult<StorageState> {
    let driver = page.driver();
    let url = driver.current_url().await?;
    let origin = origin_of(&url);
    let cookies = driver.cookies().await?;
    let mut local_storage = HashMap::new();
    if let Some(origin) = &origin {
        let entries = driver.local_storage().await?;
        if !entries.is_empty() {
            local_storage.insert(origin.clone(), entries);
        }
    }
    Ok(StorageState {
        origin,
        cookies,
        local_storage,
        saved_at: Some(Utc::now()),
    })
}

/// Add the local storage of `url`'s origin to `state`, then return to the
/// page the browser was on. Origins already captured are skipped.
///
/// # Errors
///
/// Returns driver errors.
pub async fn capture_origin(page: &Page, url: &str, state: &mut StorageState) -> ProbeResult<()> {
    let Some(origin) = origin_of(url) else {
        return Ok(());
    };
    if state.origin.as_deref() == Some(origin.as_str()) || state.local_storage.contains_key(&origin) {
        return Ok(());
    }
    let driver = page.driver();
    let back = driver.current_url().await?;
    driver.navigate(&origin).await?;
    let entries = driver.local_storage().await?;
    if !entries.is_empty() {
        debug!(origin = %origin, keys = entries.len(), "captured local storage");
        state.local_storage.insert(origin, entries);
    }
    driver.navigate(&back).await?;
    Ok(())
}

/// Load a captured session into the browser. Local storage is origin
/// scoped, so each origin is visited before its entries are written.
///
/// # Errors
///
/// Returns driver errors.
pub async fn restore(page: &Page, state: &StorageState) -> ProbeResult<()> {
    let driver = page.driver();
    driver.set_cookies(&state.cookies).await?;
    for (origin, entries) in &state.local_storage {
        driver.navigate(origin).await?;
        driver.set_local_storage(entries).await?;
    }
    debug!(
        cookies = state.cookies.len(),
        origins = state.local_storage.len(),
        "session restored"
    );
    Ok(())
}

/// Sign in once and return the session to persist
///
/// # Errors
///
/// Returns login and driver errors.
pub async fn bootstrap(
    page: &Page,
    account_url: &str,
    credentials: &Credentials,
) -> ProbeResult<StorageState> {
    LoginPage::new(page.clone(), account_url)
        .login(credentials)
        .await?;
    let mut state = capture(page).await?;
    if state.cookies.is_empty() {
        return Err(ProbeError::Session {
            message: "login finished but the browser holds no cookies".to_string(),
        });
    }
    capture_origin(page, account_url, &mut state).await?;
    Ok(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cookie_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let cookie = Cookie::new("AUTH", "abc", "mail.example.test")
                .secure()
                .http_only()
                .with_path("/api")
                .with_same_site(SameSite::Strict);
            assert!(cookie.secure && cookie.http_only);
            assert_eq!(cookie.path, "/api");
            assert_eq!(cookie.same_site, SameSite::Strict);
        }

        #[test]
        fn test_expiry() {
            let now = Utc::now();
            let session = Cookie::new("a", "b", "c");
            assert!(!session.is_expired(now));
            let stale = Cookie::new("a", "b", "c").with_expires(now.timestamp() - 1);
            assert!(stale.is_expired(now));
        }
    }

    mod storage_state_tests {
        use super::*;

        #[test]
        fn test_prune_expired() {
            let now = Utc::now();
            let mut state = StorageState::new()
                .with_cookie(Cookie::new("live", "1", "d"))
                .with_cookie(Cookie::new("dead", "1", "d").with_expires(now.timestamp() - 60));
            assert_eq!(state.prune_expired(now), 1);
            assert_eq!(state.cookies[0].name, "live");
        }

        #[test]
        fn test_json_tolerates_missing_fields() {
            let state: StorageState = serde_json::from_str(
                r#"{"cookies":[{"name":"a","value":"b","domain":"d","path":"/","expires":null,"http_only":false,"secure":true}]}"#,
            )
            .unwrap();
            assert_eq!(state.cookies[0].same_site, SameSite::Lax);
            assert!(state.local_storage.is_empty());
        }

        #[test]
        fn test_origin_of() {
            assert_eq!(
                origin_of("https://mail.example.test/u/0/inbox").as_deref(),
                Some("https://mail.example.test")
            );
            assert_eq!(origin_of("https://mail.example.test").as_deref(), Some("https://mail.example.test"));
            assert_eq!(origin_of("about:blank"), None);
        }
    }

    mod store_tests {
        use super::*;

        #[test]
        fn test_save_and_load() {
            let dir = tempfile::tempdir().unwrap();
            let store = SessionStore::new(dir.path().join("nested/storageState.json"));
            assert!(!store.exists());
            let state = StorageState::new()
                .with_cookie(Cookie::new("AUTH", "abc", "mail.example.test"))
                .with_local_storage("https://mail.example.test", "ps-0", "{}");
            store.save(&state).unwrap();
            assert!(store.exists());
            assert_eq!(store.load().unwrap(), state);
        }

        #[test]
        fn test_load_missing_is_session_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = SessionStore::new(dir.path().join("none.json")).load().unwrap_err();
            assert!(matches!(err, ProbeError::Session { .. }));
            assert!(err.to_string().contains("mailprobe login"));
        }

        #[test]
        fn test_load_rejects_cookieless_artifact() {
            let dir = tempfile::tempdir().unwrap();
            let store = SessionStore::new(dir.path().join("s.json"));
            store.save(&StorageState::new()).unwrap();
            assert!(matches!(store.load().unwrap_err(), ProbeError::Session { .. }));
        }
    }
}
