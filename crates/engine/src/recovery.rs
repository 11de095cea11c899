// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four-level recovery chain.
//!
//! RETRY, FORK, and FRESH re-run the failing stage with progressively
//! less context; ESCALATE hands the failure to the user. Levels are
//! attempted strictly in order, each at most once per invocation, and
//! the chain stops at the first success.

use crate::bus::EventBus;
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::Utc;
use reel_adapters::Messaging;
use reel_core::event::EventKind;
use reel_core::{PipelineEvent, PipelineStage, RecoveryLevel, RecoveryResult};
use std::path::PathBuf;
use tracing::{info, warn};

/// One re-run of a failing stage under a recovery level.
///
/// Implementors decide what "re-run" means; the chain only decides which
/// levels run and in what order.
#[async_trait]
pub trait RecoveryAttempt: Send {
    async fn attempt(&mut self, level: RecoveryLevel)
        -> Result<Option<PathBuf>, EngineError>;
}

/// Walks the recovery levels for one failed stage invocation.
pub struct RecoveryChain<M: Messaging> {
    messaging: Option<M>,
}

impl<M: Messaging> RecoveryChain<M> {
    pub fn new(messaging: Option<M>) -> Self {
        Self { messaging }
    }

    pub async fn run(
        &self,
        bus: &EventBus,
        stage: PipelineStage,
        failure_summary: &str,
        attempt: &mut dyn RecoveryAttempt,
    ) -> RecoveryResult {
        for level in RecoveryLevel::CHAIN {
            bus.publish(&PipelineEvent::new(
                Utc::now(),
                EventKind::RecoveryLevelAttempted { stage, level },
            ))
            .await;

            if !level.reruns_agent() {
                return self.escalate(bus, stage, failure_summary).await;
            }

            match attempt.attempt(level).await {
                Ok(artifact) => {
                    info!(%stage, %level, "recovery level succeeded");
                    return RecoveryResult {
                        level,
                        succeeded: true,
                        final_artifact: artifact,
                    };
                }
                Err(err) => {
                    warn!(%stage, %level, error = %err, "recovery level failed");
                }
            }
        }
        // CHAIN always ends in ESCALATE, which returns above.
        RecoveryResult {
            level: RecoveryLevel::Escalate,
            succeeded: false,
            final_artifact: None,
        }
    }

    async fn escalate(
        &self,
        bus: &EventBus,
        stage: PipelineStage,
        failure_summary: &str,
    ) -> RecoveryResult {
        bus.publish(&PipelineEvent::new(
            Utc::now(),
            EventKind::RecoveryEscalated {
                stage,
                summary: failure_summary.to_string(),
            },
        ))
        .await;

        if let Some(messaging) = &self.messaging {
            // Messaging errors are swallowed; escalation is terminal
            // either way.
            if let Err(err) = messaging
                .notify_user(&format!(
                    "{stage} could not recover automatically: {failure_summary}. \
                     The run stops here; artifacts are kept in the workspace."
                ))
                .await
            {
                warn!(%stage, error = %err, "escalation notification failed");
            }
        }

        RecoveryResult {
            level: RecoveryLevel::Escalate,
            succeeded: false,
            final_artifact: None,
        }
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
