//! Result and error types for Mailprobe.

use thiserror::Error;

/// Result type for Mailprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the settings screen
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level protocol error
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched a locator that must match exactly one
    #[error("No element matches {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// More than one element matched a locator that must match exactly one
    #[error("Strict mode violation: {locator} resolved to {count} elements")]
    StrictModeViolation {
        /// Locator description
        locator: String,
        /// Number of matches
        count: usize,
    },

    /// The element exists but cannot receive the action yet (hidden, disabled)
    #[error("Element {locator} is not actionable: {reason}")]
    NotActionable {
        /// Locator description
        locator: String,
        /// Why the action was refused
        reason: String,
    },

    /// Auto-wait gave up
    #[error("Timed out after {ms}ms waiting for {waiting_for}")]
    Timeout {
        /// What was being waited for
        waiting_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A synchronization plan was not satisfied in time
    #[error("Network sync timed out after {ms}ms; still waiting for {expectation}")]
    NetworkTimeout {
        /// First unmet expectation
        expectation: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The driver stopped publishing network events
    #[error("Network event stream closed")]
    NetworkClosed,

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Bulk deletion reached its iteration bound with rows remaining
    #[error("Bulk delete of {collection} stopped after {bound} deletions with {remaining} rows left")]
    BulkDeleteBound {
        /// Which collection was being emptied
        collection: String,
        /// Iteration bound
        bound: usize,
        /// Rows still present
        remaining: usize,
    },

    /// A deletion completed its network cycle but the row count did not shrink
    #[error("Deleting from {collection} did not reduce the row count ({count} rows)")]
    DeletionStalled {
        /// Which collection was being emptied
        collection: String,
        /// Rows counted before and after
        count: usize,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Login credentials were not provided
    #[error("Missing credentials: set {variable}")]
    MissingCredentials {
        /// Environment variable that is unset
        variable: String,
    },

    /// Session artifact could not be used
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Whether auto-wait should try the operation again
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::NotActionable { .. }
        )
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl ToString) -> Self {
        Self::Page {
            message: message.to_string(),
        }
    }
}
