// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-run state.
//!
//! Persisted as the front-matter portion of the workspace's `run.md` after
//! every terminal stage event, and read back by the crash-recovery planner.

use crate::stage::PipelineStage;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The checkpointed state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Stage the run is currently in (or about to enter).
    pub stage: PipelineStage,
    /// Stages completed so far, in completion order.
    pub stages_completed: IndexSet<PipelineStage>,
    /// Monotonically updated on every persist.
    pub updated_at: DateTime<Utc>,
    /// Fingerprint of the originating request.
    pub request_fingerprint: String,
    /// Agent attempts consumed per stage (QA reworks included).
    #[serde(default)]
    pub attempts: BTreeMap<PipelineStage, u32>,
}

impl RunState {
    pub fn new(fingerprint: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            stage: PipelineStage::Router,
            stages_completed: IndexSet::new(),
            updated_at: now,
            request_fingerprint: fingerprint.into(),
            attempts: BTreeMap::new(),
        }
    }

    /// Record that `stage` completed and the run moved to `next`.
    pub fn complete_stage(
        &mut self,
        stage: PipelineStage,
        next: Option<PipelineStage>,
        now: DateTime<Utc>,
    ) {
        self.stages_completed.insert(stage);
        if let Some(next) = next {
            self.stage = next;
        }
        self.updated_at = now;
    }

    /// Count one agent attempt against `stage`.
    pub fn record_attempt(&mut self, stage: PipelineStage, now: DateTime<Utc>) -> u32 {
        let count = self.attempts.entry(stage).or_insert(0);
        *count += 1;
        self.updated_at = now;
        *count
    }

    /// First stage of the sequence not yet completed.
    ///
    /// `None` when the terminal stage has completed; there is no resume
    /// work left.
    pub fn resume_point(&self) -> Option<PipelineStage> {
        if self.stages_completed.contains(&PipelineStage::Delivery) {
            return None;
        }
        PipelineStage::SEQUENCE
            .iter()
            .find(|stage| !self.stages_completed.contains(*stage))
            .copied()
    }

    /// A run is incomplete until its terminal stage has completed.
    pub fn is_incomplete(&self) -> bool {
        self.resume_point().is_some()
    }
}

#[cfg(test)]
#[path = "run_state_tests.rs"]
mod tests;
