//! Mailprobe: end-to-end checks for the webmail folders and labels screen
//!
//! Page objects drive the settings UI through a [`Driver`] and block on the
//! backend traffic each action triggers, so scenarios never sleep.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   ┌────────────┐    ┌──────────────────┐    ┌────────────────┐  │
//! │   │ Scenario   │───►│ FoldersLabelsPage│───►│ Page           │  │
//! │   │ setup/run/ │    │ (locators +      │    │ (auto-wait +   │  │
//! │   │ teardown   │    │  actions)        │    │  SyncPlan)     │  │
//! │   └────────────┘    └──────────────────┘    └───────┬────────┘  │
//! │                                                     ▼           │
//! │                              ┌────────────┐   ┌────────────┐    │
//! │                              │ CdpDriver  │ / │ SimDriver  │    │
//! │                              │ (chromium) │   │ (in-proc)  │    │
//! │                              └────────────┘   └────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A session is bootstrapped once with [`session::bootstrap`] and restored
//! into every fresh browser with [`session::restore`].

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Chromium driver (requires the `browser` feature)
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod browser;
pub mod config;
pub mod driver;
pub mod locator;
pub mod logging;
pub mod model;
pub mod network;
#[allow(clippy::missing_errors_doc)]
pub mod page;
pub mod page_object;
#[allow(clippy::missing_errors_doc)]
pub mod pages;
pub mod result;
pub mod scenario;
pub mod session;
pub mod sim;
pub mod wait;

#[cfg(feature = "browser")]
pub use browser::{login_and_save, open_settings, CdpDriver};
pub use config::{BrowserSettings, Credentials, Secret, SuiteConfig, Timeouts};
pub use driver::{Driver, Screenshot};
pub use locator::{Locator, Selector, Step};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use model::{Folder, FolderEdit, Label, LabelColor, LabelEdit};
pub use network::{
    Expectation, HttpMethod, NetworkEvent, NetworkLog, SyncPlan, UrlPattern,
};
pub use page::{Expect, Page};
pub use page_object::PageObject;
pub use pages::{CommonControls, FoldersLabelsPage, LoginPage};
pub use result::{ProbeError, ProbeResult};
pub use scenario::{
    builtin_scenarios, clean_slate, PageFactory, RunOptions, Scenario, ScenarioOutcome,
    ScenarioRunner, ScenarioStatus, SuiteReport,
};
pub use session::{Cookie, SameSite, SessionStore, StorageState};
pub use sim::{SimDriver, SimState};
pub use wait::{ElementState, WaitOptions};
