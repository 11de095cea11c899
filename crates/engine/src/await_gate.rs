// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The SIDEGEN_AWAIT stage.
//!
//! A formal pipeline step outside the agent/QA path: block until every
//! side-generation job is terminal or the deadline passes. The gate owns
//! `sidegen/jobs.json` while it runs (the orchestrator's worker is shut
//! down before entry), so crash re-entry is just a re-read: completed
//! jobs are skipped, active jobs re-polled, failed jobs accepted as-is.
//!
//! Retriability: when every failure is transient and no retry has fired
//! in this invocation, all failed jobs are re-submitted exactly once.
//! Any permanent failure in the mix disables the retry. Clips that never
//! complete are simply absent downstream; the gate itself never fails
//! the pipeline.

use crate::bus::EventBus;
use crate::error::EngineError;
use crate::sidegen::{poll_jobs_once, write_jobs};
use chrono::Utc;
use reel_adapters::{GenPrompt, VideoGeneration};
use reel_core::event::EventKind;
use reel_core::{PipelineEvent, SideGenErrorCode, SideGenJobs, SideGenStatus};
use reel_storage::Workspace;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Await-gate tuning.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Absolute deadline for the whole gate.
    pub timeout: Duration,
    pub poll_start: Duration,
    pub poll_cap: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_start: Duration::from_secs(5),
            poll_cap: Duration::from_secs(30),
        }
    }
}

/// Terminal classification of one gate invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// No side generation was requested for this run.
    NoJobs,
    Completed { completed: usize, failed: usize },
    TimedOut { pending: usize },
}

/// Blocks the pipeline on side-generation resolution.
#[derive(Clone)]
pub struct AwaitGate<G: VideoGeneration> {
    gen: G,
    config: GateConfig,
}

impl<G: VideoGeneration> AwaitGate<G> {
    pub fn new(gen: G, config: GateConfig) -> Self {
        Self { gen, config }
    }

    pub async fn run(
        &self,
        bus: &EventBus,
        workspace: &Workspace,
    ) -> Result<GateOutcome, EngineError> {
        bus.publish(&PipelineEvent::new(Utc::now(), EventKind::SidegenGateStarted))
            .await;

        let jobs_path = workspace.sidegen_jobs();
        if !jobs_path.exists() {
            bus.publish(&PipelineEvent::new(
                Utc::now(),
                EventKind::SidegenGateCompleted {
                    completed: 0,
                    failed: 0,
                },
            ))
            .await;
            return Ok(GateOutcome::NoJobs);
        }

        let text = std::fs::read_to_string(&jobs_path)?;
        let mut jobs: SideGenJobs = serde_json::from_str(&text)
            .map_err(|e| EngineError::StateLoad(format!("sidegen jobs file: {e}")))?;

        let deadline = Instant::now() + self.config.timeout;
        let mut backoff = self.config.poll_start;
        let mut retried = false;

        loop {
            let changed = poll_jobs_once(&self.gen, workspace, &mut jobs).await;
            if changed {
                write_jobs(workspace, &jobs)?;
                backoff = self.config.poll_start;
            } else {
                backoff = (backoff * 2).min(self.config.poll_cap);
            }

            if jobs.all_terminal() {
                if !retried && jobs.all_failures_retriable() {
                    retried = true;
                    let resubmitted = self.resubmit_failed(&mut jobs).await;
                    write_jobs(workspace, &jobs)?;
                    bus.publish(&PipelineEvent::new(
                        Utc::now(),
                        EventKind::SidegenGateRetried { resubmitted },
                    ))
                    .await;
                    continue;
                }
                let completed = jobs.completed().count();
                let failed = jobs.failed().count();
                info!(completed, failed, "side-generation gate complete");
                bus.publish(&PipelineEvent::new(
                    Utc::now(),
                    EventKind::SidegenGateCompleted { completed, failed },
                ))
                .await;
                return Ok(GateOutcome::Completed { completed, failed });
            }

            if Instant::now() >= deadline {
                let mut pending = 0;
                for job in &mut jobs.jobs {
                    if !job.status.is_terminal() {
                        job.status = SideGenStatus::TimedOut;
                        pending += 1;
                    }
                }
                write_jobs(workspace, &jobs)?;
                warn!(pending, "side-generation gate timed out");
                bus.publish(&PipelineEvent::new(
                    Utc::now(),
                    EventKind::SidegenGateTimeout { pending },
                ))
                .await;
                return Ok(GateOutcome::TimedOut { pending });
            }

            tokio::time::sleep(backoff.min(deadline.saturating_duration_since(Instant::now())))
                .await;
        }
    }

    /// Re-submit every failed job once. Submit errors mark the job failed
    /// again with a fresh classification.
    async fn resubmit_failed(&self, jobs: &mut SideGenJobs) -> usize {
        let mut resubmitted = 0;
        for job in &mut jobs.jobs {
            if job.status != SideGenStatus::Failed {
                continue;
            }
            // The provider identifies the job by its idempotent key; the
            // prompt body is only needed on first contact.
            let prompt = GenPrompt {
                variant: job.variant.clone(),
                text: String::new(),
                anchor: None,
                duration_s: None,
            };
            match self.gen.submit_job(&job.idempotent_key, &prompt).await {
                Ok(()) => {
                    job.status = SideGenStatus::Generating;
                    job.error_code = None;
                    job.error_message = None;
                    resubmitted += 1;
                }
                Err(err) => {
                    warn!(key = %job.idempotent_key, error = %err, "resubmit failed");
                    job.error_code = Some(SideGenErrorCode::classify(
                        SideGenErrorCode::SubmitFailed,
                        err.message(),
                    ));
                    job.error_message = Some(err.message().to_string());
                }
            }
        }
        resubmitted
    }
}

#[cfg(test)]
#[path = "await_gate_tests.rs"]
mod tests;
