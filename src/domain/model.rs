use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::utils::error::{ErrorCategory, ReaperError};

/// One published portfolio, keyed by its artifact (repository) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioRecord {
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

impl PortfolioRecord {
    pub fn new(key: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            expires_at,
        }
    }
}

/// The three ordered steps of a teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownStep {
    DeleteArtifact,
    DeleteRecord,
    DeleteAnalytics,
}

impl TeardownStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeardownStep::DeleteArtifact => "delete_artifact",
            TeardownStep::DeleteRecord => "delete_record",
            TeardownStep::DeleteAnalytics => "delete_analytics",
        }
    }
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure classification used for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    StoreUnavailable,
    NotAuthorized,
    RateLimited,
    HostingFailure,
    Network,
    Timeout,
    Other,
}

impl FailureKind {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::StoreUnavailable
                | FailureKind::RateLimited
                | FailureKind::Network
                | FailureKind::Timeout
        )
    }
}

impl From<&ReaperError> for FailureKind {
    fn from(err: &ReaperError) -> Self {
        match err {
            ReaperError::StoreUnavailable { .. } => FailureKind::StoreUnavailable,
            ReaperError::HostingNotAuthorized { .. } => FailureKind::NotAuthorized,
            ReaperError::HostingRateLimited { .. } => FailureKind::RateLimited,
            ReaperError::HostingFailure { .. } => FailureKind::HostingFailure,
            ReaperError::Timeout { .. } => FailureKind::Timeout,
            other if other.category() == ErrorCategory::Network => FailureKind::Network,
            _ => FailureKind::Other,
        }
    }
}

/// A teardown that stopped at `step`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownFailure {
    pub key: String,
    pub step: TeardownStep,
    pub kind: FailureKind,
    pub message: String,
}

impl TeardownFailure {
    pub fn from_error(key: &str, step: TeardownStep, err: &ReaperError) -> Self {
        Self {
            key: key.to_string(),
            step,
            kind: FailureKind::from(err),
            message: err.to_string(),
        }
    }
}

pub type TeardownOutcome = std::result::Result<String, TeardownFailure>;

/// Aggregate of one reaper run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub listed: usize,
    pub dry_run: bool,
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<TeardownFailure>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            listed: 0,
            dry_run,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: TeardownOutcome) {
        match outcome {
            Ok(key) => self.succeeded.push(key),
            Err(failure) => self.failures.push(failure),
        }
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// 0 = clean, 2 = only transient failures, 1 = at least one permanent failure.
    pub fn exit_code(&self) -> i32 {
        if self.failures.is_empty() {
            0
        } else if self.failures.iter().all(|f| f.kind.is_transient()) {
            2
        } else {
            1
        }
    }
}
