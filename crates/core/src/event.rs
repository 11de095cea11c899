// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline events.
//!
//! Every observable transition in a run is expressed as a
//! [`PipelineEvent`] and published on the event bus. Serializes with a
//! `{"event": "namespace.name", ...fields}` format; the journal listener
//! renders one line per event as
//! `<ISO8601> | <namespace.event> | <stage> | <compact_json>`.

use crate::recovery::RecoveryLevel;
use crate::stage::PipelineStage;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum EventKind {
    // -- pipeline --
    #[serde(rename = "pipeline.stage_entered")]
    StageEntered { stage: PipelineStage },

    #[serde(rename = "pipeline.stage_completed")]
    StageCompleted { stage: PipelineStage },

    #[serde(rename = "pipeline.stage_failed")]
    StageFailed { stage: PipelineStage, error: String },

    #[serde(rename = "pipeline.run_completed")]
    RunCompleted,

    #[serde(rename = "pipeline.run_failed")]
    RunFailed { error: String },

    // -- qa --
    #[serde(rename = "qa.gate_passed")]
    QaGatePassed {
        stage: PipelineStage,
        score: u8,
        attempt: u32,
    },

    #[serde(rename = "qa.gate_reworked")]
    QaGateReworked {
        stage: PipelineStage,
        attempt: u32,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        blockers: Vec<String>,
    },

    #[serde(rename = "qa.gate_failed")]
    QaGateFailed { stage: PipelineStage, attempt: u32 },

    // -- recovery --
    #[serde(rename = "recovery.level_attempted")]
    RecoveryLevelAttempted {
        stage: PipelineStage,
        level: RecoveryLevel,
    },

    #[serde(rename = "recovery.escalated")]
    RecoveryEscalated { stage: PipelineStage, summary: String },

    #[serde(rename = "recovery.resume_planned")]
    ResumePlanned {
        resume_from: PipelineStage,
        completed: usize,
        total: usize,
    },

    // -- sidegen --
    #[serde(rename = "sidegen.jobs_submitted")]
    SidegenJobsSubmitted { count: usize },

    #[serde(rename = "sidegen.gate_started")]
    SidegenGateStarted,

    #[serde(rename = "sidegen.gate_retried")]
    SidegenGateRetried { resubmitted: usize },

    #[serde(rename = "sidegen.gate_completed")]
    SidegenGateCompleted { completed: usize, failed: usize },

    #[serde(rename = "sidegen.gate_timeout")]
    SidegenGateTimeout { pending: usize },

    // -- queue / daemon --
    #[serde(rename = "queue.item_released")]
    QueueItemReleased { reason: String },

    #[serde(rename = "daemon.stopping")]
    DaemonStopping,
}

impl EventKind {
    /// The `namespace.event_name` wire name.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::StageEntered { .. } => "pipeline.stage_entered",
            EventKind::StageCompleted { .. } => "pipeline.stage_completed",
            EventKind::StageFailed { .. } => "pipeline.stage_failed",
            EventKind::RunCompleted => "pipeline.run_completed",
            EventKind::RunFailed { .. } => "pipeline.run_failed",
            EventKind::QaGatePassed { .. } => "qa.gate_passed",
            EventKind::QaGateReworked { .. } => "qa.gate_reworked",
            EventKind::QaGateFailed { .. } => "qa.gate_failed",
            EventKind::RecoveryLevelAttempted { .. } => "recovery.level_attempted",
            EventKind::RecoveryEscalated { .. } => "recovery.escalated",
            EventKind::ResumePlanned { .. } => "recovery.resume_planned",
            EventKind::SidegenJobsSubmitted { .. } => "sidegen.jobs_submitted",
            EventKind::SidegenGateStarted => "sidegen.gate_started",
            EventKind::SidegenGateRetried { .. } => "sidegen.gate_retried",
            EventKind::SidegenGateCompleted { .. } => "sidegen.gate_completed",
            EventKind::SidegenGateTimeout { .. } => "sidegen.gate_timeout",
            EventKind::QueueItemReleased { .. } => "queue.item_released",
            EventKind::DaemonStopping => "daemon.stopping",
        }
    }

    /// The stage this event concerns, when it concerns one.
    ///
    /// Side-generation gate events always belong to the await-gate stage.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            EventKind::StageEntered { stage }
            | EventKind::StageCompleted { stage }
            | EventKind::StageFailed { stage, .. }
            | EventKind::QaGatePassed { stage, .. }
            | EventKind::QaGateReworked { stage, .. }
            | EventKind::QaGateFailed { stage, .. }
            | EventKind::RecoveryLevelAttempted { stage, .. }
            | EventKind::RecoveryEscalated { stage, .. } => Some(*stage),
            EventKind::ResumePlanned { resume_from, .. } => Some(*resume_from),
            EventKind::SidegenJobsSubmitted { .. }
            | EventKind::SidegenGateStarted
            | EventKind::SidegenGateRetried { .. }
            | EventKind::SidegenGateCompleted { .. }
            | EventKind::SidegenGateTimeout { .. } => Some(PipelineStage::SidegenAwait),
            EventKind::RunCompleted
            | EventKind::RunFailed { .. }
            | EventKind::QueueItemReleased { .. }
            | EventKind::DaemonStopping => None,
        }
    }

    /// Event payload with the wire-name and stage columns stripped.
    pub fn data_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.remove("event");
            map.remove("stage");
        }
        value
    }
}

/// A timestamped event as it travels over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl PipelineEvent {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// Render the journal line for this event (no trailing newline).
    pub fn journal_line(&self) -> String {
        let stage = self
            .kind
            .stage()
            .map(|s| s.as_str())
            .unwrap_or("-");
        let data = self.kind.data_json();
        format!(
            "{} | {} | {} | {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.kind.name(),
            stage,
            data,
        )
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
