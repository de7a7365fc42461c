//! Network synchronization contract.
//!
//! Drivers publish every request and response they observe on a
//! [`tokio::sync::broadcast`] channel. A [`SyncPlan`] describes the ordered
//! request/response sequence a UI action triggers; it is armed (subscribed)
//! before the click and awaited alongside it, so no event can slip past.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Capacity of the per-driver network event channel
pub const NETWORK_CHANNEL_CAPACITY: usize = 1024;

/// Backend path that every mutating folder/label call targets
pub const LABELS_API: &str = "/api/v4/labels";

/// Backend path polled for model updates after a mutation
pub const EVENTS_API: &str = "/api/v4/events";

/// HTTP methods for request matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
    /// PATCH request
    Patch,
    /// HEAD request
    Head,
    /// OPTIONS request (CORS preflight)
    Options,
    /// Any other observed method
    Other,
    /// Any method; only meaningful in an expectation
    Any,
}

impl HttpMethod {
    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => Self::Other,
        }
    }

    /// Convert to string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Other => "OTHER",
            Self::Any => "*",
        }
    }

    /// Whether an observed method satisfies this expected one. Only the
    /// expectation side may be a wildcard, and `Other` never matches a
    /// concrete method.
    #[must_use]
    pub fn matches(&self, observed: &Self) -> bool {
        match self {
            Self::Any => true,
            Self::Other => false,
            expected => expected == observed,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL pattern for matching observed traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Shorthand for [`UrlPattern::Contains`]
    #[must_use]
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern),
            Self::Contains(pattern) => url.contains(pattern),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::Any => true,
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "{p}"),
            Self::Prefix(p) => write!(f, "{p}*"),
            Self::Contains(p) => write!(f, "*{p}*"),
            Self::Regex(p) => write!(f, "/{p}/"),
            Self::Any => write!(f, "*"),
        }
    }
}

/// One observed network event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkEvent {
    /// A request was sent
    Request {
        /// Request URL
        url: String,
        /// HTTP method
        method: HttpMethod,
    },
    /// A response was received
    Response {
        /// Response URL
        url: String,
        /// HTTP status code
        status: u16,
    },
}

impl NetworkEvent {
    /// Create a request event
    #[must_use]
    pub fn request(method: HttpMethod, url: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            method,
        }
    }

    /// Create a response event
    #[must_use]
    pub fn response(url: impl Into<String>, status: u16) -> Self {
        Self::Response {
            url: url.into(),
            status,
        }
    }

    /// URL of the event
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. } | Self::Response { url, .. } => url,
        }
    }
}

impl fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { url, method } => write!(f, "--> {method} {url}"),
            Self::Response { url, status } => write!(f, "<-- {status} {url}"),
        }
    }
}

/// A single step of a [`SyncPlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// A request whose URL and method match
    Request {
        /// URL pattern
        pattern: UrlPattern,
        /// Expected method
        method: HttpMethod,
    },
    /// A response whose URL and status match
    Response {
        /// URL pattern
        pattern: UrlPattern,
        /// Expected status
        status: u16,
    },
}

impl Expectation {
    /// Whether an event satisfies this expectation
    #[must_use]
    pub fn matches(&self, event: &NetworkEvent) -> bool {
        match (self, event) {
            (
                Self::Request { pattern, method },
                NetworkEvent::Request {
                    url,
                    method: observed,
                },
            ) => pattern.matches(url) && method.matches(observed),
            (
                Self::Response { pattern, status },
                NetworkEvent::Response {
                    url,
                    status: observed,
                },
            ) => pattern.matches(url) && status == observed,
            _ => false,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { pattern, method } => write!(f, "request {method} {pattern}"),
            Self::Response { pattern, status } => write!(f, "response {status} {pattern}"),
        }
    }
}

/// Ordered request/response sequence that marks a UI action as complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    name: String,
    expectations: Vec<Expectation>,
}

impl SyncPlan {
    /// Create an empty plan
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expectations: Vec::new(),
        }
    }

    /// Append a request expectation
    #[must_use]
    pub fn expect_request(mut self, pattern: UrlPattern, method: HttpMethod) -> Self {
        self.expectations
            .push(Expectation::Request { pattern, method });
        self
    }

    /// Append a response expectation
    #[must_use]
    pub fn expect_response(mut self, pattern: UrlPattern, status: u16) -> Self {
        self.expectations
            .push(Expectation::Response { pattern, status });
        self
    }

    /// Sort button: `PUT */order` then the events refresh
    #[must_use]
    pub fn sort() -> Self {
        Self::new("sort")
            .expect_request(UrlPattern::contains("/order"), HttpMethod::Put)
            .expect_response(UrlPattern::contains(EVENTS_API), 200)
    }

    /// Delete confirmation: `DELETE` then a full events round trip
    #[must_use]
    pub fn delete() -> Self {
        Self::new("delete")
            .expect_request(UrlPattern::contains(LABELS_API), HttpMethod::Delete)
            .expect_response(UrlPattern::contains(EVENTS_API), 200)
            .expect_request(UrlPattern::contains(EVENTS_API), HttpMethod::Get)
            .expect_response(UrlPattern::contains(EVENTS_API), 200)
    }

    /// Create form submit: `POST` then the events refresh
    #[must_use]
    pub fn save_create() -> Self {
        Self::new("create")
            .expect_request(UrlPattern::contains(LABELS_API), HttpMethod::Post)
            .expect_response(UrlPattern::contains(EVENTS_API), 200)
    }

    /// Edit form submit: `PUT` then the events refresh
    #[must_use]
    pub fn save_edit() -> Self {
        Self::new("edit")
            .expect_request(UrlPattern::contains(LABELS_API), HttpMethod::Put)
            .expect_response(UrlPattern::contains(EVENTS_API), 200)
    }

    /// "Use folder colors" toggle: settings `PUT` then the events refresh
    #[must_use]
    pub fn folder_colors() -> Self {
        Self::new("folder-colors")
            .expect_request(UrlPattern::contains("/settings/folder-colors"), HttpMethod::Put)
            .expect_response(UrlPattern::contains(EVENTS_API), 200)
    }

    /// Plan name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expectations in order
    #[must_use]
    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    /// Subscribe the plan to an event stream. Only events published after
    /// this call can satisfy it.
    #[must_use]
    pub fn arm(&self, events: broadcast::Receiver<NetworkEvent>) -> ArmedPlan {
        ArmedPlan {
            plan: self.clone(),
            events,
        }
    }
}

/// A plan subscribed to a driver's event stream
#[derive(Debug)]
pub struct ArmedPlan {
    plan: SyncPlan,
    events: broadcast::Receiver<NetworkEvent>,
}

impl ArmedPlan {
    /// Wait until every expectation is met in order, returning the matching
    /// events.
    ///
    /// # Errors
    ///
    /// `NetworkTimeout` naming the first unmet expectation when `timeout`
    /// elapses, `NetworkClosed` when the driver drops its sender.
    pub async fn wait(mut self, timeout: Duration) -> ProbeResult<Vec<NetworkEvent>> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut matched = Vec::with_capacity(self.plan.expectations.len());

        for expectation in &self.plan.expectations {
            loop {
                let event = match tokio::time::timeout_at(deadline, self.events.recv()).await {
                    Err(_) => {
                        return Err(ProbeError::NetworkTimeout {
                            expectation: expectation.to_string(),
                            ms: timeout.as_millis() as u64,
                        })
                    }
                    Ok(Ok(event)) => event,
                    Ok(Err(RecvError::Lagged(skipped))) => {
                        tracing::warn!(plan = %self.plan.name, skipped, "network stream lagged");
                        continue;
                    }
                    Ok(Err(RecvError::Closed)) => return Err(ProbeError::NetworkClosed),
                };
                if expectation.matches(&event) {
                    tracing::debug!(plan = %self.plan.name, %event, "expectation met");
                    matched.push(event);
                    break;
                }
            }
        }

        Ok(matched)
    }
}

/// Records every event a driver publishes after the log was created
#[derive(Debug)]
pub struct NetworkLog {
    events: broadcast::Receiver<NetworkEvent>,
    seen: Vec<NetworkEvent>,
}

impl NetworkLog {
    /// Start recording from a subscription
    #[must_use]
    pub const fn new(events: broadcast::Receiver<NetworkEvent>) -> Self {
        Self {
            events,
            seen: Vec::new(),
        }
    }

    /// Pull everything published so far into the log
    pub fn refresh(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.seen.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "network log lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// All recorded events
    pub fn events(&mut self) -> &[NetworkEvent] {
        self.refresh();
        &self.seen
    }

    /// Number of recorded requests matching the pattern and method
    pub fn count_requests(&mut self, pattern: &UrlPattern, method: HttpMethod) -> usize {
        let expectation = Expectation::Request {
            pattern: pattern.clone(),
            method,
        };
        self.events()
            .iter()
            .filter(|event| expectation.matches(event))
            .count()
    }

    /// Forget recorded events
    pub fn clear(&mut self) {
        self.refresh();
        self.seen.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod http_method_tests {
        use super::*;

        #[test]
        fn test_from_str() {
            assert_eq!(HttpMethod::from_str("GET"), HttpMethod::Get);
            assert_eq!(HttpMethod::from_str("post"), HttpMethod::Post);
            assert_eq!(HttpMethod::from_str("DELETE"), HttpMethod::Delete);
            assert_eq!(HttpMethod::from_str("options"), HttpMethod::Options);
            assert_eq!(HttpMethod::from_str("HEAD"), HttpMethod::Head);
            assert_eq!(HttpMethod::from_str("PROPFIND"), HttpMethod::Other);
        }

        #[test]
        fn test_matches() {
            assert!(HttpMethod::Put.matches(&HttpMethod::Put));
            assert!(HttpMethod::Any.matches(&HttpMethod::Get));
            assert!(HttpMethod::Any.matches(&HttpMethod::Options));
            assert!(!HttpMethod::Get.matches(&HttpMethod::Post));
        }

        #[test]
        fn test_observed_method_is_never_a_wildcard() {
            for observed in ["OPTIONS", "HEAD", "PROPFIND", "*"] {
                let observed = HttpMethod::from_str(observed);
                assert_ne!(observed, HttpMethod::Any);
                for expected in [HttpMethod::Delete, HttpMethod::Put, HttpMethod::Post] {
                    assert!(!expected.matches(&observed), "{observed} satisfied {expected}");
                }
            }
            assert!(!HttpMethod::Other.matches(&HttpMethod::Other));
        }
    }

    mod url_pattern_tests {
        use super::*;

        #[test]
        fn test_contains() {
            let pattern = UrlPattern::contains("/order");
            assert!(pattern.matches("https://mail.proton.me/api/v4/labels/order"));
            assert!(!pattern.matches("https://mail.proton.me/api/v4/labels"));
        }

        #[test]
        fn test_exact_prefix_regex() {
            assert!(UrlPattern::Exact("/a".to_string()).matches("/a"));
            assert!(UrlPattern::Prefix("https://".to_string()).matches("https://x"));
            assert!(UrlPattern::Regex(r"/labels/\d+$".to_string()).matches("/api/v4/labels/42"));
            assert!(!UrlPattern::Regex("(".to_string()).matches("("));
            assert!(UrlPattern::Any.matches(""));
        }

        #[test]
        fn test_display() {
            assert_eq!(UrlPattern::contains("/order").to_string(), "*/order*");
        }
    }

    mod expectation_tests {
        use super::*;

        #[test]
        fn test_request_matching() {
            let exp = Expectation::Request {
                pattern: UrlPattern::contains(LABELS_API),
                method: HttpMethod::Delete,
            };
            assert!(exp.matches(&NetworkEvent::request(
                HttpMethod::Delete,
                "https://x/api/v4/labels/abc"
            )));
            assert!(!exp.matches(&NetworkEvent::request(
                HttpMethod::Put,
                "https://x/api/v4/labels/abc"
            )));
            assert!(!exp.matches(&NetworkEvent::response("https://x/api/v4/labels/abc", 200)));
        }

        #[test]
        fn test_preflight_does_not_satisfy_delete() {
            let exp = Expectation::Request {
                pattern: UrlPattern::contains(LABELS_API),
                method: HttpMethod::Delete,
            };
            let preflight = NetworkEvent::request(
                HttpMethod::from_str("OPTIONS"),
                "https://x/api/v4/labels/1",
            );
            assert!(!exp.matches(&preflight));
        }

        #[test]
        fn test_response_matching() {
            let exp = Expectation::Response {
                pattern: UrlPattern::contains(EVENTS_API),
                status: 200,
            };
            assert!(exp.matches(&NetworkEvent::response("https://x/api/v4/events/1", 200)));
            assert!(!exp.matches(&NetworkEvent::response("https://x/api/v4/events/1", 500)));
        }
    }

    mod plan_tests {
        use super::*;

        #[test]
        fn test_sort_plan_shape() {
            let plan = SyncPlan::sort();
            assert_eq!(plan.expectations().len(), 2);
            assert_eq!(
                plan.expectations()[0],
                Expectation::Request {
                    pattern: UrlPattern::contains("/order"),
                    method: HttpMethod::Put
                }
            );
        }

        #[test]
        fn test_delete_plan_shape() {
            let plan = SyncPlan::delete();
            let kinds: Vec<_> = plan.expectations().iter().map(ToString::to_string).collect();
            assert_eq!(
                kinds,
                vec![
                    "request DELETE */api/v4/labels*",
                    "response 200 */api/v4/events*",
                    "request GET */api/v4/events*",
                    "response 200 */api/v4/events*",
                ]
            );
        }

        #[tokio::test]
        async fn test_wait_in_order() {
            let (tx, rx) = broadcast::channel(16);
            let armed = SyncPlan::sort().arm(rx);
            // A response before the request does not count
            tx.send(NetworkEvent::response("/api/v4/events/1", 200)).unwrap();
            tx.send(NetworkEvent::request(HttpMethod::Put, "/api/v4/labels/order"))
                .unwrap();
            tx.send(NetworkEvent::response("/api/v4/labels/order", 200))
                .unwrap();
            tx.send(NetworkEvent::response("/api/v4/events/2", 200)).unwrap();

            let matched = armed.wait(Duration::from_secs(1)).await.unwrap();
            assert_eq!(matched.len(), 2);
            assert_eq!(matched[1].url(), "/api/v4/events/2");
        }

        #[tokio::test]
        async fn test_wait_times_out_on_first_unmet() {
            let (tx, rx) = broadcast::channel(16);
            let armed = SyncPlan::sort().arm(rx);
            tx.send(NetworkEvent::request(HttpMethod::Put, "/api/v4/labels/order"))
                .unwrap();

            let err = armed.wait(Duration::from_millis(50)).await.unwrap_err();
            match err {
                ProbeError::NetworkTimeout { expectation, ms } => {
                    assert_eq!(expectation, "response 200 */api/v4/events*");
                    assert_eq!(ms, 50);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_events_before_arming_are_ignored() {
            let (tx, _keep) = broadcast::channel(16);
            tx.send(NetworkEvent::request(HttpMethod::Put, "/order")).unwrap();
            tx.send(NetworkEvent::response("/api/v4/events", 200)).unwrap();
            let armed = SyncPlan::sort().arm(tx.subscribe());
            assert!(armed.wait(Duration::from_millis(20)).await.is_err());
        }

        #[tokio::test]
        async fn test_closed_stream() {
            let (tx, rx) = broadcast::channel::<NetworkEvent>(4);
            let armed = SyncPlan::delete().arm(rx);
            drop(tx);
            let err = armed.wait(Duration::from_secs(1)).await.unwrap_err();
            assert!(matches!(err, ProbeError::NetworkClosed));
        }

        #[tokio::test]
        async fn test_preflight_leaves_delete_plan_waiting() {
            let (tx, rx) = broadcast::channel(16);
            let armed = SyncPlan::delete().arm(rx);
            tx.send(NetworkEvent::request(
                HttpMethod::from_str("OPTIONS"),
                "https://x/api/v4/labels/1",
            ))
            .unwrap();
            tx.send(NetworkEvent::response("https://x/api/v4/events/1", 200))
                .unwrap();
            let err = armed.wait(Duration::from_millis(30)).await.unwrap_err();
            match err {
                ProbeError::NetworkTimeout { expectation, .. } => {
                    assert_eq!(expectation, "request DELETE */api/v4/labels*");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    mod log_tests {
        use super::*;

        #[test]
        fn test_log_counts_requests() {
            let (tx, rx) = broadcast::channel(16);
            let mut log = NetworkLog::new(rx);
            tx.send(NetworkEvent::request(HttpMethod::Post, "/api/v4/labels"))
                .unwrap();
            tx.send(NetworkEvent::response("/api/v4/labels", 200)).unwrap();
            assert_eq!(log.events().len(), 2);
            assert_eq!(
                log.count_requests(&UrlPattern::contains(LABELS_API), HttpMethod::Post),
                1
            );
            log.clear();
            assert!(log.events().is_empty());
        }
    }
}
