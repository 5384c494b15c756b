//! Job records and terminal results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::JobId;

/// Lifecycle status of a background job.
///
/// `Working` → `Completed`, exactly once; never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Registered and (as far as the store knows) still running.
    Working,
    /// Finished; the terminal result is attached.
    Completed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

/// Snapshot of a finished handler invocation.
///
/// Header names map to every value the handler set for them, in the order
/// it set them. Bodies are stored as text; bytes that are not valid UTF-8
/// are replaced when the result is captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResult {
    pub status_code: u16,
    pub header: BTreeMap<String, Vec<String>>,
    pub body: String,
}

impl TerminalResult {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            header: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Append a header value, keeping earlier values for the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.entry(name.into()).or_default().push(value.into());
        self
    }
}

/// One tracked background execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub response: Option<TerminalResult>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly registered job in `Working` state.
    pub fn new(id: JobId, kind: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Working,
            response: None,
            kind: kind.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record a heartbeat.
    ///
    /// Returns `false` (and changes nothing) once the job is completed, so a
    /// heartbeat that lands after completion can never un-complete the job.
    pub fn touch(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        self.status = JobStatus::Working;
        self.bump_updated_at(now);
        true
    }

    /// Attach the terminal result.
    ///
    /// Returns `false` (and changes nothing) if a result is already attached.
    pub fn complete(&mut self, result: TerminalResult, now: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.response = Some(result);
        self.bump_updated_at(now);
        true
    }

    fn bump_updated_at(&mut self, now: DateTime<Utc>) {
        // Wall clocks can step backwards.
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
