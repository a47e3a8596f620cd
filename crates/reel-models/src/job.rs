//! Job records and their lifecycle.
//!
//! A job starts in [`JobStatus::Processing`] and leaves it exactly once,
//! either to `Completed` (with a file path) or to `Failed` (with an error
//! message). All state changes go through [`Job::apply`].

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Pipeline is running
    #[default]
    Processing,
    /// Video rendered and published
    Completed,
    /// A stage failed
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested change to a job record.
#[derive(Debug, Clone, PartialEq)]
pub enum JobMutation {
    /// Report stage progress (0-100)
    Progress(u8),
    /// Mark the job completed with the rendered video path
    Complete(PathBuf),
    /// Mark the job failed with a human-readable message
    Fail(String),
}

impl JobMutation {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            JobMutation::Progress(_) => "progress",
            JobMutation::Complete(_) => "complete",
            JobMutation::Fail(_) => "fail",
        }
    }
}

/// A mutation was rejected because the job already reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("job is already {status}, ignoring {mutation}")]
pub struct TransitionError {
    pub status: JobStatus,
    pub mutation: &'static str,
}

/// One end-to-end query-to-video request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job identifier
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Rendered video, set only once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Failure reason, set only once failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a fresh processing job at 0%.
    pub fn new(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Processing,
            progress: 0,
            file_path: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a mutation.
    ///
    /// Terminal states are write-once: any mutation on a completed or failed
    /// job is rejected and leaves the record untouched. Progress never moves
    /// backwards and is capped at 100.
    pub fn apply(&mut self, mutation: JobMutation) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError {
                status: self.status,
                mutation: mutation.name(),
            });
        }

        match mutation {
            JobMutation::Progress(progress) => {
                self.progress = self.progress.max(progress.min(100));
            }
            JobMutation::Complete(path) => {
                self.status = JobStatus::Completed;
                self.progress = 100;
                self.file_path = Some(path);
            }
            JobMutation::Fail(message) => {
                self.status = JobStatus::Failed;
                self.error_message = Some(message);
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
