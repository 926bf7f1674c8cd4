//! Execution log records.
//!
//! Every staged invocation produces exactly one log record: installs from
//! captured process output, payload builds and exchanges from the log file
//! the package leaves behind. Records are immutable once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which operation produced a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogCategory {
    Install,
    PayloadBuild,
    MessageExchange,
}

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// A captured text blob tied to one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub category: LogCategory,
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// The user who triggered the operation, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Correlating task id assigned by the caller's task queue, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    /// The endpoint the operation ran against, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Uuid>,
    pub data: String,
}

impl ExecutionLog {
    /// A new info-level record stamped with the current time.
    #[must_use]
    pub fn new(category: LogCategory, data: String) -> Self {
        Self {
            category,
            level: LogLevel::Info,
            timestamp: Utc::now(),
            user: None,
            task_id: None,
            endpoint: None,
            data,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    #[must_use]
    pub fn with_task(mut self, task_id: Option<Uuid>) -> Self {
        self.task_id = task_id;
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Uuid) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}
