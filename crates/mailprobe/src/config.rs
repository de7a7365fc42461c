//! Suite configuration
//!
//! Loaded from an optional YAML file, then overridden from the environment.
//! Credentials are deliberately absent: see [`Credentials`].

use crate::logging::{LogFormat, LoggingConfig};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{
    WaitOptions, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_NETWORK_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the login name
pub const USERNAME_ENV: &str = "MAILPROBE_USERNAME";

/// Environment variable holding the login password
pub const PASSWORD_ENV: &str = "MAILPROBE_PASSWORD";

/// Default mail app origin
pub const DEFAULT_BASE_URL: &str = "https://mail.proton.me";

/// Default identity provider origin
pub const DEFAULT_ACCOUNT_URL: &str = "https://account.proton.me";

/// Default session artifact location
pub const DEFAULT_SESSION_PATH: &str = "storageState.json";

/// Default upper bound for bulk deletion loops
pub const DEFAULT_MAX_BULK_DELETIONS: usize = 100;

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Chromium executable; auto-detected when unset
    pub chromium_path: Option<PathBuf>,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
    /// Window width in pixels
    pub viewport_width: u32,
    /// Window height in pixels
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Auto-wait budget for element actions and assertions
    pub action_ms: u64,
    /// Budget for a network synchronization plan
    pub network_ms: u64,
    /// Poll interval for auto-wait
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: DEFAULT_ACTION_TIMEOUT_MS,
            network_ms: DEFAULT_NETWORK_TIMEOUT_MS,
            poll_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Everything a run needs apart from credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Mail app origin
    pub base_url: String,
    /// Identity provider origin
    pub account_url: String,
    /// Account slot in `/u/{n}/...` paths
    pub user_index: u32,
    /// Session artifact written by `login` and read by every run
    pub session_path: PathBuf,
    /// Browser launch settings
    pub browser: BrowserSettings,
    /// Wait budgets
    pub timeouts: Timeouts,
    /// Iteration bound for delete-all loops
    pub max_bulk_deletions: usize,
    /// Where reports and failure screenshots go
    pub artifacts_dir: PathBuf,
    /// Logger settings
    pub logging: LoggingConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            account_url: DEFAULT_ACCOUNT_URL.to_string(),
            user_index: 0,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            max_bulk_deletions: DEFAULT_MAX_BULK_DELETIONS,
            artifacts_dir: PathBuf::from("target/mailprobe"),
            logging: LoggingConfig::default(),
        }
    }
}

fn parse_bool(variable: &str, value: &str) -> ProbeResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ProbeError::Config {
            message: format!("{variable}: expected a boolean, got {other:?}"),
        }),
    }
}

fn config_error(message: impl Into<String>) -> ProbeError {
    ProbeError::Config {
        message: message.into(),
    }
}

impl SuiteConfig {
    /// Load from `path` (or defaults), apply process environment, validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an override is
    /// malformed, or the result fails [`Self::validate`].
    pub fn load(path: Option<&Path>) -> ProbeResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML file
    ///
    /// # Errors
    ///
    /// Returns an I/O or YAML error.
    pub fn from_file(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns a YAML error.
    pub fn from_yaml(text: &str) -> ProbeResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// Returns a YAML error.
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply overrides from an environment-like lookup
    ///
    /// # Errors
    ///
    /// Returns a config error when a variable holds an unparsable value.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ProbeResult<()> {
        if let Some(value) = lookup("MAILPROBE_BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = lookup("MAILPROBE_ACCOUNT_URL") {
            self.account_url = value;
        }
        if let Some(value) = lookup("MAILPROBE_USER_INDEX") {
            self.user_index = value.trim().parse().map_err(|_| {
                config_error(format!("MAILPROBE_USER_INDEX: not a number: {value:?}"))
            })?;
        }
        if let Some(value) = lookup("MAILPROBE_SESSION_PATH") {
            self.session_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("MAILPROBE_HEADLESS") {
            self.browser.headless = parse_bool("MAILPROBE_HEADLESS", &value)?;
        }
        if let Some(value) = lookup("CHROMIUM_PATH") {
            self.browser.chromium_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("MAILPROBE_NO_SANDBOX") {
            self.browser.sandbox = !parse_bool("MAILPROBE_NO_SANDBOX", &value)?;
        }
        if let Some(value) = lookup("MAILPROBE_ARTIFACTS_DIR") {
            self.artifacts_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("MAILPROBE_LOG_FORMAT") {
            self.logging.format = LogFormat::from_str(&value).ok_or_else(|| {
                config_error(format!("MAILPROBE_LOG_FORMAT: unknown format {value:?}"))
            })?;
        }
        Ok(())
    }

    /// Check internal consistency
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first problem found.
    pub fn validate(&self) -> ProbeResult<()> {
        for (field, url) in [("base_url", &self.base_url), ("account_url", &self.account_url)] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(config_error(format!("{field} must be an http(s) origin, got {url:?}")));
            }
        }
        let t = &self.timeouts;
        if t.action_ms == 0 || t.network_ms == 0 || t.poll_ms == 0 {
            return Err(config_error("timeouts must be greater than zero"));
        }
        if t.poll_ms > t.action_ms {
            return Err(config_error("timeouts.poll_ms exceeds timeouts.action_ms"));
        }
        if self.max_bulk_deletions == 0 {
            return Err(config_error("max_bulk_deletions must be at least 1"));
        }
        Ok(())
    }

    /// Auto-wait settings for pages built from this config
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.timeouts.action_ms,
            poll_interval_ms: self.timeouts.poll_ms,
            network_timeout_ms: self.timeouts.network_ms,
        }
    }

    /// Path of the folders and labels settings screen
    #[must_use]
    pub fn settings_path(&self) -> String {
        format!("/u/{}/mail/folders-labels", self.user_index)
    }

    /// Base and account URLs without trailing slashes
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self.account_url = self.account_url.trim_end_matches('/').to_string();
        self
    }
}

/// A string that never prints itself
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wrapped value. Only call this where the value is typed into a page.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Login credentials, sourced only from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Email or username
    pub username: String,
    /// Password
    pub password: Secret,
}

impl Credentials {
    /// Build from explicit values
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password),
        }
    }

    /// Read [`USERNAME_ENV`] and [`PASSWORD_ENV`]
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::MissingCredentials`] naming the first unset or
    /// empty variable.
    pub fn from_env() -> ProbeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] over an arbitrary lookup
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::MissingCredentials`] naming the first unset or
    /// empty variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ProbeResult<Self> {
        let read = |variable: &str| {
            lookup(variable)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ProbeError::MissingCredentials {
                    variable: variable.to_string(),
                })
        };
        let username = read(USERNAME_ENV)?;
        let password = read(PASSWORD_ENV)?;
        Ok(Self::new(username, password))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod suite_config_tests {
        use super::*;

        #[test]
        fn test_defaults_validate() {
            let config = SuiteConfig::default();
            config.validate().unwrap();
            assert_eq!(config.settings_path(), "/u/0/mail/folders-labels");
            assert_eq!(config.max_bulk_deletions, 100);
            assert!(config.browser.headless);
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = SuiteConfig::from_yaml(
                "base_url: https://mail.example.test\ntimeouts:\n  action_ms: 1000\n",
            )
            .unwrap();
            assert_eq!(config.base_url, "https://mail.example.test");
            assert_eq!(config.timeouts.action_ms, 1000);
            assert_eq!(config.timeouts.network_ms, DEFAULT_NETWORK_TIMEOUT_MS);
            assert_eq!(config.account_url, DEFAULT_ACCOUNT_URL);
        }

        #[test]
        fn test_empty_yaml_is_default() {
            assert_eq!(SuiteConfig::from_yaml("  \n").unwrap(), SuiteConfig::default());
        }

        #[test]
        fn test_yaml_round_trip_through_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("mailprobe.yaml");
            let mut config = SuiteConfig::default();
            config.user_index = 2;
            std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
            assert_eq!(SuiteConfig::from_file(&path).unwrap(), config);
        }

        #[test]
        fn test_env_overrides() {
            let mut config = SuiteConfig::default();
            config
                .apply_env_from(env(&[
                    ("MAILPROBE_BASE_URL", "http://localhost:8080"),
                    ("MAILPROBE_USER_INDEX", "3"),
                    ("MAILPROBE_HEADLESS", "false"),
                    ("MAILPROBE_NO_SANDBOX", "1"),
                    ("CHROMIUM_PATH", "/usr/bin/chromium"),
                    ("MAILPROBE_LOG_FORMAT", "json"),
                ]))
                .unwrap();
            assert_eq!(config.base_url, "http://localhost:8080");
            assert_eq!(config.settings_path(), "/u/3/mail/folders-labels");
            assert!(!config.browser.headless);
            assert!(!config.browser.sandbox);
            assert_eq!(config.browser.chromium_path, Some(PathBuf::from("/usr/bin/chromium")));
            assert_eq!(config.logging.format, LogFormat::Json);
        }

        #[test]
        fn test_env_rejects_garbage() {
            let mut config = SuiteConfig::default();
            let err = config
                .apply_env_from(env(&[("MAILPROBE_HEADLESS", "maybe")]))
                .unwrap_err();
            assert!(err.to_string().contains("MAILPROBE_HEADLESS"));
            assert!(config
                .apply_env_from(env(&[("MAILPROBE_USER_INDEX", "first")]))
                .is_err());
        }

        #[test]
        fn test_validate_rejects_bad_values() {
            let mut config = SuiteConfig::default();
            config.base_url = "mail.example.test".to_string();
            assert!(config.validate().is_err());

            let mut config = SuiteConfig::default();
            config.timeouts.poll_ms = 10_000;
            assert!(config.validate().is_err());

            let mut config = SuiteConfig::default();
            config.max_bulk_deletions = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_wait_options_follow_timeouts() {
            let mut config = SuiteConfig::default();
            config.timeouts.action_ms = 250;
            let options = config.wait_options();
            assert_eq!(options.timeout_ms, 250);
            assert_eq!(options.network_timeout_ms, DEFAULT_NETWORK_TIMEOUT_MS);
        }

        #[test]
        fn test_normalized_strips_slash() {
            let mut config = SuiteConfig::default();
            config.base_url = "https://mail.example.test/".to_string();
            assert_eq!(config.normalized().base_url, "https://mail.example.test");
        }
    }

    mod credentials_tests {
        use super::*;

        #[test]
        fn test_from_lookup() {
            let creds = Credentials::from_lookup(env(&[
                (USERNAME_ENV, "tester@example.test"),
                (PASSWORD_ENV, "hunter2"),
            ]))
            .unwrap();
            assert_eq!(creds.username, "tester@example.test");
            assert_eq!(creds.password.expose(), "hunter2");
        }

        #[test]
        fn test_missing_variable_is_named() {
            let err = Credentials::from_lookup(env(&[(USERNAME_ENV, "tester")])).unwrap_err();
            match err {
                ProbeError::MissingCredentials { variable } => assert_eq!(variable, PASSWORD_ENV),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_empty_counts_as_missing() {
            let err =
                Credentials::from_lookup(env(&[(USERNAME_ENV, ""), (PASSWORD_ENV, "x")])).unwrap_err();
            assert!(matches!(err, ProbeError::MissingCredentials { .. }));
        }

        #[test]
        fn test_password_redacted() {
            let creds = Credentials::new("tester", "hunter2");
            assert!(!format!("{creds:?}").contains("hunter2"));
            assert_eq!(creds.password.to_string(), "***");
        }
    }
}
