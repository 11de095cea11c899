// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-recovery planning.
//!
//! At daemon startup every unfinished run gets a resume plan: the first
//! stage its checkpoint does not record as completed, unless the user
//! pinned a start stage explicitly. Plans are journaled into the run and
//! announced to the user; a broken channel never blocks recovery.

use chrono::Utc;
use reel_adapters::Messaging;
use reel_core::event::EventKind;
use reel_core::{PipelineEvent, PipelineStage, RunId, RunState};
use reel_storage::StateStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Resume instructions for one unfinished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryPlan {
    pub run_id: RunId,
    pub resume_from: PipelineStage,
    pub stages_completed: Vec<PipelineStage>,
    pub stages_remaining: Vec<PipelineStage>,
}

impl RecoveryPlan {
    /// Compute the plan for one run state.
    ///
    /// An explicit `start_stage` hint always wins; auto-detection from
    /// the completed set is only used without one. Returns `None` when
    /// the terminal stage has completed and nothing remains to resume.
    pub fn for_state(
        run_id: RunId,
        state: &RunState,
        start_stage_hint: Option<PipelineStage>,
    ) -> Option<Self> {
        let resume_from = match start_stage_hint {
            Some(stage) => stage,
            None => state.resume_point()?,
        };
        let stages_completed: Vec<PipelineStage> =
            state.stages_completed.iter().copied().collect();
        let stages_remaining = PipelineStage::SEQUENCE[resume_from.index()..].to_vec();
        Some(Self {
            run_id,
            resume_from,
            stages_completed,
            stages_remaining,
        })
    }
}

/// Plans resumption of unfinished runs at startup.
pub struct CrashRecoveryPlanner<S: StateStore, M: Messaging> {
    store: Arc<S>,
    messaging: Option<M>,
}

impl<S: StateStore, M: Messaging> CrashRecoveryPlanner<S, M> {
    pub fn new(store: Arc<S>, messaging: Option<M>) -> Self {
        Self { store, messaging }
    }

    /// Inspect every unfinished run and emit its plan.
    pub async fn plan_all(&self) -> Result<Vec<RecoveryPlan>, crate::error::EngineError> {
        let mut plans = Vec::new();
        for (run_id, state) in self.store.list_incomplete_runs()? {
            let Some(plan) = RecoveryPlan::for_state(run_id.clone(), &state, None) else {
                continue;
            };
            info!(
                run_id = %plan.run_id,
                resume_from = %plan.resume_from,
                completed = plan.stages_completed.len(),
                "planned resume"
            );

            let event = PipelineEvent::new(
                Utc::now(),
                EventKind::ResumePlanned {
                    resume_from: plan.resume_from,
                    completed: plan.stages_completed.len(),
                    total: PipelineStage::COUNT,
                },
            );
            if let Err(err) = self.store.append_event(&run_id, &event) {
                warn!(run_id = %run_id, error = %err, "failed to journal resume plan");
            }

            if let Some(messaging) = &self.messaging {
                let text = format!(
                    "Resuming your run from {} ({} of {} stages completed)",
                    plan.resume_from,
                    plan.stages_completed.len(),
                    PipelineStage::COUNT,
                );
                if let Err(err) = messaging.notify_user(&text).await {
                    warn!(run_id = %run_id, error = %err, "resume notification failed");
                }
            }
            plans.push(plan);
        }
        Ok(plans)
    }
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
