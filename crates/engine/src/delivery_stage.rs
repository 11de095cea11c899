// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The DELIVERY stage.
//!
//! Bypasses the agent/QA machinery entirely: upload the final reel,
//! hand it to the user over the messaging channel, advance the machine.

use crate::bus::EventBus;
use crate::error::EngineError;
use chrono::Utc;
use parking_lot::Mutex;
use reel_adapters::{FileDelivery, Messaging};
use reel_core::event::EventKind;
use reel_core::{PipelineEvent, PipelineStage, PipelineStateMachine, RunState, StageSignal};
use reel_storage::Workspace;
use std::sync::Arc;
use tracing::{info, warn};

/// Delivery collaborator consuming the final artifacts.
#[derive(Clone)]
pub struct DeliveryStage<M: Messaging, F: FileDelivery> {
    messaging: M,
    delivery: F,
}

impl<M: Messaging, F: FileDelivery> DeliveryStage<M, F> {
    pub fn new(messaging: M, delivery: F) -> Self {
        Self {
            messaging,
            delivery,
        }
    }

    pub async fn run(
        &self,
        bus: &EventBus,
        machine: &mut PipelineStateMachine,
        state: &Arc<Mutex<RunState>>,
        workspace: &Workspace,
    ) -> Result<(), EngineError> {
        let stage = PipelineStage::Delivery;
        bus.publish(&PipelineEvent::new(
            Utc::now(),
            EventKind::StageEntered { stage },
        ))
        .await;

        let reel = workspace.final_reel();
        if !reel.exists() {
            let error = format!("final reel missing: {}", reel.display());
            bus.publish(&PipelineEvent::new(
                Utc::now(),
                EventKind::StageFailed {
                    stage,
                    error: error.clone(),
                },
            ))
            .await;
            return Err(EngineError::Delivery(error));
        }

        let url = self
            .delivery
            .upload(&reel)
            .await
            .map_err(|e| EngineError::Delivery(e.to_string()))?;
        info!(%url, "final reel uploaded");

        // The send is the delivery; a broken channel still leaves the
        // upload URL in the notification trail and the journal.
        if let Err(err) = self
            .messaging
            .send_file(&reel, &format!("Your reel is ready: {url}"))
            .await
        {
            warn!(error = %err, "file send failed, falling back to a link notification");
            let _ = self
                .messaging
                .notify_user(&format!("Your reel is ready: {url}"))
                .await;
        }

        let completed = machine.advance(StageSignal::QaPass)?;
        state.lock().complete_stage(completed, None, Utc::now());
        bus.publish(&PipelineEvent::new(
            Utc::now(),
            EventKind::StageCompleted { stage: completed },
        ))
        .await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "delivery_stage_tests.rs"]
mod tests;
