//! Auto-wait and polling.
//!
//! Element actions are retried while the failure is transient
//! ([`ProbeError::is_retryable`]) until the action timeout elapses. Network
//! synchronization has its own, longer timeout.

use crate::result::{ProbeError, ProbeResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default auto-wait timeout for element actions (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for network synchronization plans (30 seconds)
pub const DEFAULT_NETWORK_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Auto-wait timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Network plan timeout in milliseconds
    pub network_timeout_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            network_timeout_ms: DEFAULT_NETWORK_TIMEOUT_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set network plan timeout in milliseconds
    #[must_use]
    pub const fn with_network_timeout(mut self, network_timeout_ms: u64) -> Self {
        self.network_timeout_ms = network_timeout_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get network timeout as Duration
    #[must_use]
    pub const fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }
}

/// Element states that can be waited for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// At least one match is visible
    Visible,
    /// No match is visible (including no match at all)
    Hidden,
    /// At least one match exists
    Attached,
    /// No match exists
    Detached,
}

impl std::fmt::Display for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Attached => "attached",
            Self::Detached => "detached",
        };
        f.write_str(s)
    }
}

/// Retry `action` while it fails with a retryable error.
///
/// # Errors
///
/// Non-retryable errors are returned immediately. When `timeout` elapses the
/// last retryable error is converted into [`ProbeError::Timeout`].
pub async fn retry<T, F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    waiting_for: impl Fn() -> String,
    mut action: F,
) -> ProbeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match action().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if Instant::now() >= deadline {
                    tracing::debug!(error = %err, "auto-wait exhausted");
                    return Err(ProbeError::Timeout {
                        waiting_for: format!("{} ({err})", waiting_for()),
                        ms: timeout.as_millis() as u64,
                    });
                }
                tokio::time::sleep(poll_interval).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Poll `check` until it yields `true`.
///
/// # Errors
///
/// [`ProbeError::Timeout`] when `timeout` elapses; errors from `check` are
/// returned as-is.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    waiting_for: impl Fn() -> String,
    mut check: F,
) -> ProbeResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ProbeError::Timeout {
                waiting_for: waiting_for(),
                ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}
