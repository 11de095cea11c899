// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in bus subscribers: journaling, checkpointing, user notification.
//!
//! The journal listener is the single writer of `events.log`; the
//! checkpoint listener is the single writer of the run document. Because
//! the bus delivers synchronously, the run state reaches disk during the
//! publish of the event that changed it, before any later event is
//! emitted.

use crate::bus::EventListener;
use async_trait::async_trait;
use parking_lot::Mutex;
use reel_adapters::Messaging;
use reel_core::event::EventKind;
use reel_core::{PipelineEvent, RunId, RunState};
use reel_storage::StateStore;
use std::sync::Arc;

/// Appends one line per event to the run's `events.log`.
pub struct JournalListener<S: StateStore> {
    store: Arc<S>,
    run_id: RunId,
}

impl<S: StateStore> JournalListener<S> {
    pub fn new(store: Arc<S>, run_id: RunId) -> Self {
        Self { store, run_id }
    }
}

#[async_trait]
impl<S: StateStore> EventListener for JournalListener<S> {
    fn name(&self) -> &'static str {
        "journal"
    }

    async fn receive(&self, event: &PipelineEvent) -> Result<(), String> {
        self.store
            .append_event(&self.run_id, event)
            .map_err(|e| e.to_string())
    }
}

/// Persists the shared [`RunState`] on every stage-terminal event.
pub struct CheckpointListener<S: StateStore> {
    store: Arc<S>,
    run_id: RunId,
    state: Arc<Mutex<RunState>>,
}

impl<S: StateStore> CheckpointListener<S> {
    pub fn new(store: Arc<S>, run_id: RunId, state: Arc<Mutex<RunState>>) -> Self {
        Self {
            store,
            run_id,
            state,
        }
    }

    fn is_checkpoint_event(kind: &EventKind) -> bool {
        matches!(
            kind,
            EventKind::QaGatePassed { .. }
                | EventKind::QaGateFailed { .. }
                | EventKind::StageCompleted { .. }
                | EventKind::StageFailed { .. }
                | EventKind::RecoveryEscalated { .. }
                | EventKind::SidegenGateStarted
                | EventKind::SidegenGateCompleted { .. }
                | EventKind::SidegenGateTimeout { .. }
                | EventKind::RunCompleted
                | EventKind::RunFailed { .. }
        )
    }

    /// Progress note for the run document body, when the event warrants one.
    fn note(event: &PipelineEvent) -> Option<String> {
        let when = event.timestamp.format("%Y-%m-%d %H:%M:%S");
        match &event.kind {
            EventKind::QaGatePassed { stage, score, attempt } => Some(format!(
                "{when} {stage} passed QA (score {score}, attempt {attempt})"
            )),
            EventKind::StageFailed { stage, error } => {
                Some(format!("{when} {stage} failed: {error}"))
            }
            EventKind::RecoveryEscalated { stage, summary } => {
                Some(format!("{when} {stage} escalated to user: {summary}"))
            }
            EventKind::SidegenGateTimeout { pending } => Some(format!(
                "{when} side generation timed out with {pending} clip(s) unresolved"
            )),
            EventKind::RunCompleted => Some(format!("{when} run completed")),
            _ => None,
        }
    }
}

#[async_trait]
impl<S: StateStore> EventListener for CheckpointListener<S> {
    fn name(&self) -> &'static str {
        "checkpoint"
    }

    async fn receive(&self, event: &PipelineEvent) -> Result<(), String> {
        if !Self::is_checkpoint_event(&event.kind) {
            return Ok(());
        }
        let snapshot = self.state.lock().clone();
        self.store
            .save_state(&self.run_id, &snapshot)
            .map_err(|e| e.to_string())?;
        if let Some(note) = Self::note(event) {
            self.store
                .append_note(&self.run_id, &note)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Forwards user-relevant events to the messaging channel.
///
/// Messaging failures are reported to the bus, which logs and swallows
/// them; a broken channel never stalls a run.
pub struct NotifyListener<M: Messaging> {
    messaging: M,
}

impl<M: Messaging> NotifyListener<M> {
    pub fn new(messaging: M) -> Self {
        Self { messaging }
    }

    fn message(kind: &EventKind) -> Option<String> {
        match kind {
            EventKind::StageEntered { stage } => Some(format!(
                "Working on {stage} ({} of {})",
                stage.index() + 1,
                reel_core::PipelineStage::COUNT
            )),
            EventKind::RunCompleted => Some("Your reel is ready.".to_string()),
            EventKind::RunFailed { error } => Some(format!("Run failed: {error}")),
            EventKind::SidegenGateTimeout { pending } => Some(format!(
                "Side clips timed out ({pending} unresolved); continuing without them."
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl<M: Messaging> EventListener for NotifyListener<M> {
    fn name(&self) -> &'static str {
        "notify"
    }

    async fn receive(&self, event: &PipelineEvent) -> Result<(), String> {
        let Some(message) = Self::message(&event.kind) else {
            return Ok(());
        };
        self.messaging
            .notify_user(&message)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[path = "listeners_tests.rs"]
mod tests;
