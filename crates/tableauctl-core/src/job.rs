//! Background jobs and their finish codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HookError, Result};
use crate::wire::lenient_number;

/// The finish code indicates the status of a job
///
/// Mirrors the integer `finishCode` of the server's job record. Jobs that have
/// not finished report no finish code, which is read as [`Pending`](Self::Pending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobFinishCode {
    Pending = -1,
    Success = 0,
    Error = 1,
    Canceled = 2,
}

impl JobFinishCode {
    /// Map a raw finish code; codes outside the known set are an error
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            -1 => Ok(JobFinishCode::Pending),
            0 => Ok(JobFinishCode::Success),
            1 => Ok(JobFinishCode::Error),
            2 => Ok(JobFinishCode::Canceled),
            other => Err(HookError::UnknownFinishCode(other)),
        }
    }

    /// Raw integer value
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Whether the job has stopped running
    pub fn is_finished(self) -> bool {
        self != JobFinishCode::Pending
    }
}

impl fmt::Display for JobFinishCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobFinishCode::Pending => "PENDING",
            JobFinishCode::Success => "SUCCESS",
            JobFinishCode::Error => "ERROR",
            JobFinishCode::Canceled => "CANCELED",
        };
        f.write_str(name)
    }
}

/// A background job record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub finish_code: Option<i64>,
}

impl Job {
    /// Finish code of this record; a missing code means the job is pending
    pub fn status(&self) -> Result<JobFinishCode> {
        JobFinishCode::from_code(self.finish_code.unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(JobFinishCode::from_code(-1).unwrap(), JobFinishCode::Pending);
        assert_eq!(JobFinishCode::from_code(0).unwrap(), JobFinishCode::Success);
        assert_eq!(JobFinishCode::from_code(1).unwrap(), JobFinishCode::Error);
        assert_eq!(JobFinishCode::from_code(2).unwrap(), JobFinishCode::Canceled);
        assert_eq!(JobFinishCode::Canceled.code(), 2);
    }

    #[test]
    fn test_unknown_code_is_error() {
        for code in [-2, 3, 42] {
            match JobFinishCode::from_code(code) {
                Err(HookError::UnknownFinishCode(c)) => assert_eq!(c, code),
                other => panic!("expected unknown finish code, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_display_matches_names() {
        assert_eq!(JobFinishCode::Pending.to_string(), "PENDING");
        assert_eq!(JobFinishCode::Canceled.to_string(), "CANCELED");
        assert!(!JobFinishCode::Pending.is_finished());
        assert!(JobFinishCode::Error.is_finished());
    }

    #[test]
    fn test_job_record_parsing() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": "c8f4c2a1-0000-4000-8000-000000000001",
                "mode": "Asynchronous",
                "type": "RefreshExtract",
                "progress": "100",
                "createdAt": "2024-03-01T10:00:00Z",
                "completedAt": "2024-03-01T10:02:13Z",
                "finishCode": "1"
            }"#,
        )
        .unwrap();

        assert_eq!(job.job_type.as_deref(), Some("RefreshExtract"));
        assert_eq!(job.progress, Some(100));
        assert!(job.started_at.is_none());
        assert_eq!(job.status().unwrap(), JobFinishCode::Error);
    }

    #[test]
    fn test_missing_finish_code_is_pending() {
        let job: Job = serde_json::from_str(r#"{"id": "j1", "progress": 10}"#).unwrap();
        assert_eq!(job.status().unwrap(), JobFinishCode::Pending);
    }
}
