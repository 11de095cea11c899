// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side-generation job records.
//!
//! One record per requested B-roll clip. The whole set is persisted as
//! `sidegen/jobs.json` in the workspace and rewritten atomically on every
//! status change, so a crashed process can re-read the file and carry on.

use crate::run_id::RunId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle of one generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideGenStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "GENERATING")]
    Generating,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "TIMED_OUT")]
    TimedOut,
}

impl SideGenStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SideGenStatus::Completed | SideGenStatus::Failed | SideGenStatus::TimedOut
        )
    }
}

/// Failure classification for a side-generation job.
///
/// Transient codes may be retried by the await-gate; permanent codes may
/// not. Provider errors carrying an "invalid argument" marker are treated
/// as permanent regardless of which operation raised them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideGenErrorCode {
    SubmitFailed,
    RateLimited,
    PollFailed,
    DownloadFailed,
    GenerationFailed,
    InvalidArgument,
}

impl SideGenErrorCode {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SideGenErrorCode::SubmitFailed
                | SideGenErrorCode::RateLimited
                | SideGenErrorCode::PollFailed
        )
    }

    /// Classify a provider error message under a given operation code.
    ///
    /// Marker text in the message overrides the operation's own
    /// classification: an "invalid argument" marker is always permanent,
    /// a rate-limit marker always transient.
    pub fn classify(operation: SideGenErrorCode, message: &str) -> SideGenErrorCode {
        let lower = message.to_ascii_lowercase();
        if lower.contains("invalid argument") {
            SideGenErrorCode::InvalidArgument
        } else if lower.contains("rate limit") {
            SideGenErrorCode::RateLimited
        } else {
            operation
        }
    }
}

impl fmt::Display for SideGenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SideGenErrorCode::SubmitFailed => "submit_failed",
            SideGenErrorCode::RateLimited => "rate_limited",
            SideGenErrorCode::PollFailed => "poll_failed",
            SideGenErrorCode::DownloadFailed => "download_failed",
            SideGenErrorCode::GenerationFailed => "generation_failed",
            SideGenErrorCode::InvalidArgument => "invalid_argument",
        };
        f.write_str(s)
    }
}

/// One side-generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideGenJob {
    /// `{run_id}_{variant}`: deterministic, enabling provider-side dedup.
    pub idempotent_key: String,
    pub variant: String,
    pub status: SideGenStatus,
    #[serde(default)]
    pub video_path: Option<PathBuf>,
    #[serde(default)]
    pub error_code: Option<SideGenErrorCode>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl SideGenJob {
    pub fn pending(run_id: &RunId, variant: impl Into<String>) -> Self {
        let variant = variant.into();
        Self {
            idempotent_key: format!("{run_id}_{variant}"),
            variant,
            status: SideGenStatus::Pending,
            video_path: None,
            error_code: None,
            error_message: None,
        }
    }

    /// A failed job whose error code permits resubmission.
    pub fn is_retriable_failure(&self) -> bool {
        self.status == SideGenStatus::Failed
            && self
                .error_code
                .as_ref()
                .map(SideGenErrorCode::is_retriable)
                .unwrap_or(false)
    }
}

/// The `sidegen/jobs.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideGenJobs {
    pub jobs: Vec<SideGenJob>,
}

impl SideGenJobs {
    pub fn all_terminal(&self) -> bool {
        self.jobs.iter().all(|j| j.status.is_terminal())
    }

    pub fn completed(&self) -> impl Iterator<Item = &SideGenJob> {
        self.jobs
            .iter()
            .filter(|j| j.status == SideGenStatus::Completed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SideGenJob> {
        self.jobs.iter().filter(|j| {
            matches!(j.status, SideGenStatus::Failed | SideGenStatus::TimedOut)
        })
    }

    /// True when there is at least one failure and every failure is
    /// retriable, the precondition for the await-gate's single retry.
    pub fn all_failures_retriable(&self) -> bool {
        let mut any = false;
        for job in self.failed() {
            if job.status == SideGenStatus::TimedOut || !job.is_retriable_failure() {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn get_mut(&mut self, idempotent_key: &str) -> Option<&mut SideGenJob> {
        self.jobs
            .iter_mut()
            .find(|j| j.idempotent_key == idempotent_key)
    }
}

#[cfg(test)]
#[path = "sidegen_tests.rs"]
mod tests;
