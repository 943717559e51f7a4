use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaperError {
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Hosting provider rejected credentials for '{key}': {message}")]
    HostingNotAuthorized { key: String, message: String },

    #[error("Hosting provider rate limited request for '{key}'")]
    HostingRateLimited {
        key: String,
        retry_after: Option<Duration>,
    },

    #[error("Hosting provider failed for '{key}': {message}")]
    HostingFailure { key: String, message: String },

    #[error("Hosting provider unreachable for '{key}': {message}")]
    HostingUnavailable { key: String, message: String },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Store,
    Hosting,
    Configuration,
    Network,
    Io,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ReaperError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReaperError::StoreUnavailable { .. } => ErrorCategory::Store,
            ReaperError::HostingNotAuthorized { .. }
            | ReaperError::HostingRateLimited { .. }
            | ReaperError::HostingFailure { .. } => ErrorCategory::Hosting,
            ReaperError::Timeout { .. } => ErrorCategory::Timeout,
            ReaperError::HttpError(_) | ReaperError::HostingUnavailable { .. } => {
                ErrorCategory::Network
            }
            ReaperError::IoError(_) => ErrorCategory::Io,
            ReaperError::ConfigError { .. }
            | ReaperError::MissingConfigError { .. }
            | ReaperError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReaperError::HostingRateLimited { .. } | ReaperError::Timeout { .. } => {
                ErrorSeverity::Medium
            }
            ReaperError::HttpError(_) | ReaperError::HostingUnavailable { .. } => {
                ErrorSeverity::Medium
            }
            ReaperError::HostingNotAuthorized { .. }
            | ReaperError::HostingFailure { .. }
            | ReaperError::IoError(_) => ErrorSeverity::High,
            ReaperError::StoreUnavailable { .. }
            | ReaperError::ConfigError { .. }
            | ReaperError::MissingConfigError { .. }
            | ReaperError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 下一次排程執行可能自行恢復的錯誤
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReaperError::StoreUnavailable { .. }
                | ReaperError::HostingRateLimited { .. }
                | ReaperError::Timeout { .. }
                | ReaperError::HttpError(_)
                | ReaperError::HostingUnavailable { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Store => "Check SUPABASE_URL / SUPABASE_KEY and that the store is reachable",
            ErrorCategory::Hosting => match self {
                ReaperError::HostingNotAuthorized { .. } => {
                    "Check that the hosting token is valid and allowed to delete repositories"
                }
                ReaperError::HostingRateLimited { .. } => {
                    "Wait for the rate limit window to reset; the next run will retry"
                }
                _ => "Inspect the hosting provider response; the next run will retry",
            },
            ErrorCategory::Configuration => "Fix the configuration file or environment variables",
            ErrorCategory::Network => "Check network connectivity; the next run will retry",
            ErrorCategory::Io => "Check file permissions and the static directory root",
            ErrorCategory::Timeout => "Increase reaper.call_timeout_secs or check upstream latency",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Store => format!("Could not reach the portfolio store: {}", self),
            ErrorCategory::Hosting => format!("Hosting provider error: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Network => format!("Network error: {}", self),
            ErrorCategory::Io => format!("Local I/O error: {}", self),
            ErrorCategory::Timeout => format!("Operation timed out: {}", self),
        }
    }

    /// 依嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReaperError>;
