// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The JSON document stored in the queue directories.

use crate::request::Request;
use crate::run_id::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One queued job: the request payload plus the run it was assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub run_id: RunId,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub request: Request,
}

impl QueueItem {
    pub fn new(run_id: RunId, submitted_at: DateTime<Utc>, request: Request) -> Self {
        Self {
            run_id,
            submitted_at,
            request,
        }
    }

    /// Queue filename stem for this item: `YYYYMMDDHHMMSS-<uuid>`.
    ///
    /// The timestamp prefix makes lexicographic order time order; the
    /// uuid suffix keeps same-millisecond submissions apart.
    pub fn filename(&self) -> String {
        format!(
            "{}-{}.json",
            self.submitted_at.format("%Y%m%d%H%M%S"),
            uuid::Uuid::new_v4().simple(),
        )
    }
}

#[cfg(test)]
#[path = "queue_item_tests.rs"]
mod tests;
