//! Driver - abstract browser capability.
//!
//! The page action layer only ever talks to a [`Driver`]. Two implementations
//! exist:
//!
//! ```text
//! ┌────────────────────────────┐   ┌────────────────────────────┐
//! │  CdpDriver (`browser`)     │   │  SimDriver                 │
//! │  Chromium over CDP via     │   │  in-process webmail model  │
//! │  chromiumoxide             │   │  for offline test runs     │
//! └────────────────────────────┘   └────────────────────────────┘
//! ```
//!
//! Primitives are one-shot: they resolve the locator once and either act or
//! fail. Auto-waiting is layered on top by [`crate::page::Page`].
//!
//! Element actions follow strict resolution: zero matches is
//! [`ProbeError::ElementNotFound`](crate::ProbeError::ElementNotFound), more
//! than one is
//! [`ProbeError::StrictModeViolation`](crate::ProbeError::StrictModeViolation),
//! a hidden match is
//! [`ProbeError::NotActionable`](crate::ProbeError::NotActionable).

use crate::locator::Locator;
use crate::network::NetworkEvent;
use crate::result::ProbeResult;
use crate::session::Cookie;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Screenshot captured from the driver
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// File extension matching the encoding
    pub format: &'static str,
    /// Capture time
    pub taken_at: DateTime<Utc>,
}

impl Screenshot {
    /// Create a PNG screenshot taken now
    #[must_use]
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            data,
            format: "png",
            taken_at: Utc::now(),
        }
    }
}

/// Abstract browser capability
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Navigate to an absolute URL and wait for the load to finish
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Number of elements the locator resolves to
    async fn count(&self, locator: &Locator) -> ProbeResult<usize>;

    /// Whether any match is visible
    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool>;

    /// Attribute of every match, in document order
    async fn attributes(&self, locator: &Locator, name: &str) -> ProbeResult<Vec<Option<String>>>;

    /// Click the single match
    async fn click(&self, locator: &Locator) -> ProbeResult<()>;

    /// Replace the value of the single matching input
    async fn fill(&self, locator: &Locator, value: &str) -> ProbeResult<()>;

    /// Checked state of the single matching checkbox or toggle
    async fn is_checked(&self, locator: &Locator) -> ProbeResult<bool>;

    /// Attribute of the single match
    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>>;

    /// Computed CSS property of the single match
    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<String>;

    /// Subscribe to network events published from now on
    fn subscribe_network(&self) -> broadcast::Receiver<NetworkEvent>;

    /// All cookies visible to the browser
    async fn cookies(&self) -> ProbeResult<Vec<Cookie>>;

    /// Install cookies
    async fn set_cookies(&self, cookies: &[Cookie]) -> ProbeResult<()>;

    /// Local storage of the current origin
    async fn local_storage(&self) -> ProbeResult<HashMap<String, String>>;

    /// Write entries into local storage of the current origin
    async fn set_local_storage(&self, entries: &HashMap<String, String>) -> ProbeResult<()>;

    /// Capture the viewport, when the driver can
    async fn screenshot(&self) -> ProbeResult<Option<Screenshot>> {
        Ok(None)
    }

    /// Release browser resources
    async fn close(&self) -> ProbeResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_screenshot() {
        let shot = Screenshot::png(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(shot.format, "png");
        assert_eq!(shot.data.len(), 4);
        assert!(shot.taken_at <= Utc::now());
    }
}
