// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated stage transitions.
//!
//! The machine holds an explicit `(stage, signal) -> next_stage` table.
//! Every advancement goes through [`PipelineStateMachine::advance`], which
//! rejects illegal edges instead of trusting the caller.

use crate::stage::PipelineStage;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Signal that moves the pipeline out of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageSignal {
    /// QA gate approved the stage output.
    #[serde(rename = "qa_pass")]
    QaPass,
    /// The side-generation await-gate reached a terminal outcome.
    #[serde(rename = "gate_complete")]
    GateComplete,
}

impl StageSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageSignal::QaPass => "qa_pass",
            StageSignal::GateComplete => "gate_complete",
        }
    }
}

impl fmt::Display for StageSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error on an illegal `(stage, signal)` edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal transition: {signal} at {stage}")]
pub struct TransitionError {
    pub stage: PipelineStage,
    pub signal: StageSignal,
}

/// Ordered stage sequence with validated transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStateMachine {
    current: PipelineStage,
    completed: IndexSet<PipelineStage>,
}

impl PipelineStateMachine {
    /// Fresh machine positioned at the first stage.
    pub fn new() -> Self {
        Self {
            current: PipelineStage::Router,
            completed: IndexSet::new(),
        }
    }

    /// Machine resumed at `stage` with the given completion history.
    pub fn resume_at(stage: PipelineStage, completed: IndexSet<PipelineStage>) -> Self {
        Self {
            current: stage,
            completed,
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.current
    }

    /// Stages completed so far, in completion order.
    pub fn completed(&self) -> &IndexSet<PipelineStage> {
        &self.completed
    }

    /// The expected signal out of `stage`.
    ///
    /// Every stage leaves on `qa_pass` except the await-gate, which leaves
    /// on `gate_complete`.
    pub fn expected_signal(stage: PipelineStage) -> StageSignal {
        match stage {
            PipelineStage::SidegenAwait => StageSignal::GateComplete,
            _ => StageSignal::QaPass,
        }
    }

    /// Validate `signal` against the current stage, mark the stage
    /// completed, and move to the next one.
    ///
    /// Returns the stage just completed. The machine stays put when the
    /// terminal stage completes.
    pub fn advance(&mut self, signal: StageSignal) -> Result<PipelineStage, TransitionError> {
        let stage = self.current;
        if signal != Self::expected_signal(stage) {
            return Err(TransitionError { stage, signal });
        }
        self.completed.insert(stage);
        if let Some(next) = stage.next() {
            self.current = next;
        }
        Ok(stage)
    }

    /// Whether the terminal stage has completed.
    pub fn is_finished(&self) -> bool {
        self.completed.contains(&PipelineStage::Delivery)
    }
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
