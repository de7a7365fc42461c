//! Scenario outcomes and the suite report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Scenario result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// All phases succeeded
    Passed,
    /// Setup or run failed
    Failed,
    /// Not run because an earlier scenario failed under fail-fast
    Skipped,
}

impl ScenarioStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub name: String,
    /// Status
    pub status: ScenarioStatus,
    /// Wall time of all phases
    pub duration: Duration,
    /// Setup or run error
    pub error: Option<String>,
    /// Teardown error, reported alongside and never instead of `error`
    pub teardown_error: Option<String>,
    /// Failure screenshot written to the artifacts directory
    pub screenshot: Option<PathBuf>,
}

impl ScenarioOutcome {
    /// A passing outcome
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Passed,
            duration,
            error: None,
            teardown_error: None,
            screenshot: None,
        }
    }

    /// A failing outcome
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Failed,
            duration,
            error: Some(error.into()),
            teardown_error: None,
            screenshot: None,
        }
    }

    /// A skipped outcome
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Skipped,
            duration: Duration::ZERO,
            error: None,
            teardown_error: None,
            screenshot: None,
        }
    }
}

/// Report of one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run id, also used to name artifacts
    pub run_id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Finish time
    pub finished_at: DateTime<Utc>,
    /// Outcomes in execution order
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// Empty report starting now
    #[must_use]
    pub fn start(run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
        }
    }

    /// Stamp the finish time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(ScenarioStatus::Passed)
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(ScenarioStatus::Failed)
    }

    /// Count skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(ScenarioStatus::Skipped)
    }

    fn count(&self, status: ScenarioStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// No failures (skips count as failures of the run)
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_passed())
    }

    /// Failed outcomes
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failed()).collect()
    }

    /// Outcomes whose teardown failed
    #[must_use]
    pub fn teardown_failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.teardown_error.is_some())
            .collect()
    }

    /// Pretty JSON
    ///
    /// # Errors
    ///
    /// Returns a JSON error.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
