// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery chain levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Escalation levels, attempted strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecoveryLevel {
    /// Re-run the same agent with the same request and prior artifacts.
    #[serde(rename = "RETRY")]
    Retry,
    /// Prior artifacts retained, attempt history stripped.
    #[serde(rename = "FORK")]
    Fork,
    /// Both attempt history and prior artifacts stripped.
    #[serde(rename = "FRESH")]
    Fresh,
    /// Hand the failure to the user.
    #[serde(rename = "ESCALATE")]
    Escalate,
}

impl RecoveryLevel {
    /// All levels in escalation order.
    pub const CHAIN: [RecoveryLevel; 4] = [
        RecoveryLevel::Retry,
        RecoveryLevel::Fork,
        RecoveryLevel::Fresh,
        RecoveryLevel::Escalate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryLevel::Retry => "RETRY",
            RecoveryLevel::Fork => "FORK",
            RecoveryLevel::Fresh => "FRESH",
            RecoveryLevel::Escalate => "ESCALATE",
        }
    }

    /// Whether this level re-runs the agent (everything below escalate).
    pub fn reruns_agent(&self) -> bool {
        !matches!(self, RecoveryLevel::Escalate)
    }

    /// Whether the rework context keeps prior-stage artifacts at this level.
    pub fn keeps_artifacts(&self) -> bool {
        matches!(self, RecoveryLevel::Retry | RecoveryLevel::Fork)
    }

    /// Whether the rework context keeps the accumulated attempt history.
    pub fn keeps_history(&self) -> bool {
        matches!(self, RecoveryLevel::Retry)
    }
}

impl fmt::Display for RecoveryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a full recovery chain invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    /// The last level attempted.
    pub level: RecoveryLevel,
    pub succeeded: bool,
    /// Artifact produced by the successful level, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_artifact: Option<PathBuf>,
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
