// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background side-clip generation.
//!
//! Fired right after CONTENT completes: submit every generation prompt
//! (capped), then poll the provider from a detached task with adaptive
//! backoff until all jobs are terminal or the task is cancelled. Every
//! status change rewrites `sidegen/jobs.json` atomically; the jobs file
//! is the only channel to the await-gate, which takes over polling once
//! the pipeline reaches it and this task has been shut down.

use crate::bus::EventBus;
use crate::error::EngineError;
use chrono::Utc;
use reel_adapters::{GenJobUpdate, GenPrompt, VideoGeneration};
use reel_core::event::EventKind;
use reel_core::{
    PipelineEvent, RunId, SideGenErrorCode, SideGenJob, SideGenJobs, SideGenStatus,
};
use reel_storage::{write_atomic, Workspace};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Side-generation tuning.
#[derive(Debug, Clone)]
pub struct SideGenConfig {
    /// Ceiling on clips per run; extra prompts are dropped with a log.
    pub max_clips: usize,
    /// Initial poll interval.
    pub poll_start: Duration,
    /// Poll interval ceiling under stable status.
    pub poll_cap: Duration,
}

impl Default for SideGenConfig {
    fn default() -> Self {
        Self {
            max_clips: 4,
            poll_start: Duration::from_secs(5),
            poll_cap: Duration::from_secs(30),
        }
    }
}

/// Handle to the detached orchestrator task.
pub struct SideGenHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SideGenHandle {
    /// Cancel the polling worker and wait for its final snapshot.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.join.await {
            warn!(error = %err, "side-generation worker join failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Submits generation jobs and owns the background polling worker.
#[derive(Clone)]
pub struct SideGenOrchestrator<G: VideoGeneration> {
    gen: G,
    config: SideGenConfig,
}

impl<G: VideoGeneration> SideGenOrchestrator<G> {
    pub fn new(gen: G, config: SideGenConfig) -> Self {
        Self { gen, config }
    }

    /// Pull generation prompts out of the CONTENT artifact.
    ///
    /// The artifact is the content agent's JSON reply; prompts live under
    /// `sidegen_prompts`. A missing or unparseable document simply means
    /// no side clips.
    pub fn extract_prompts(content_artifact: &str) -> Vec<GenPrompt> {
        #[derive(serde::Deserialize)]
        struct ContentDoc {
            #[serde(default)]
            sidegen_prompts: Vec<GenPrompt>,
        }
        match serde_json::from_str::<ContentDoc>(content_artifact) {
            Ok(doc) => doc.sidegen_prompts,
            Err(err) => {
                debug!(error = %err, "content artifact carries no side-generation prompts");
                Vec::new()
            }
        }
    }

    /// Submit `prompts` and spawn the polling worker.
    ///
    /// Returns `None` when there is nothing to generate (no `sidegen/`
    /// state is created at all, and the await-gate becomes a no-op).
    pub async fn start(
        &self,
        bus: &EventBus,
        run_id: &RunId,
        workspace: &Workspace,
        mut prompts: Vec<GenPrompt>,
    ) -> Result<Option<SideGenHandle>, EngineError> {
        if prompts.is_empty() {
            return Ok(None);
        }
        if prompts.len() > self.config.max_clips {
            info!(
                requested = prompts.len(),
                cap = self.config.max_clips,
                "capping side-generation prompts"
            );
            prompts.truncate(self.config.max_clips);
        }

        let mut jobs = SideGenJobs::default();
        for prompt in &prompts {
            let mut job = SideGenJob::pending(run_id, prompt.variant.clone());
            match self.gen.submit_job(&job.idempotent_key, prompt).await {
                Ok(()) => job.status = SideGenStatus::Generating,
                Err(err) => {
                    warn!(key = %job.idempotent_key, error = %err, "side-generation submit failed");
                    job.status = SideGenStatus::Failed;
                    job.error_code = Some(SideGenErrorCode::classify(
                        SideGenErrorCode::SubmitFailed,
                        err.message(),
                    ));
                    job.error_message = Some(err.message().to_string());
                }
            }
            jobs.jobs.push(job);
        }

        write_jobs(workspace, &jobs)?;
        bus.publish(&PipelineEvent::new(
            Utc::now(),
            EventKind::SidegenJobsSubmitted {
                count: jobs.jobs.len(),
            },
        ))
        .await;

        let cancel = CancellationToken::new();
        let join = tokio::spawn(poll_worker(
            self.gen.clone(),
            workspace.clone(),
            jobs,
            self.config.clone(),
            cancel.clone(),
        ));
        Ok(Some(SideGenHandle { cancel, join }))
    }
}

/// Background polling loop: adaptive backoff, atomic rewrites, final
/// snapshot on cancellation.
async fn poll_worker<G: VideoGeneration>(
    gen: G,
    workspace: Workspace,
    mut jobs: SideGenJobs,
    config: SideGenConfig,
    cancel: CancellationToken,
) {
    let mut backoff = config.poll_start;
    loop {
        if jobs.all_terminal() {
            debug!("side-generation worker done, all jobs terminal");
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => {
                // Final snapshot so the await-gate resumes from truth.
                if let Err(err) = write_jobs(&workspace, &jobs) {
                    warn!(error = %err, "final side-generation snapshot failed");
                }
                return;
            }
            _ = tokio::time::sleep(backoff) => {}
        }
        let changed = poll_jobs_once(&gen, &workspace, &mut jobs).await;
        if changed {
            if let Err(err) = write_jobs(&workspace, &jobs) {
                warn!(error = %err, "side-generation snapshot failed");
            }
            backoff = config.poll_start;
        } else {
            backoff = (backoff * 2).min(config.poll_cap);
        }
    }
}

/// One poll pass over every non-terminal job. Returns whether any record
/// changed. Completed jobs are skipped, failures are kept as-is.
pub(crate) async fn poll_jobs_once<G: VideoGeneration>(
    gen: &G,
    workspace: &Workspace,
    jobs: &mut SideGenJobs,
) -> bool {
    let mut changed = false;
    for job in &mut jobs.jobs {
        if job.status.is_terminal() {
            continue;
        }
        match gen.poll_job(&job.idempotent_key).await {
            Ok(GenJobUpdate::Generating) => {
                if job.status != SideGenStatus::Generating {
                    job.status = SideGenStatus::Generating;
                    changed = true;
                }
            }
            Ok(GenJobUpdate::Completed) => {
                let dest = workspace.sidegen_clip(&job.variant);
                match gen.download_clip(&job.idempotent_key, &dest).await {
                    Ok(()) => {
                        job.status = SideGenStatus::Completed;
                        job.video_path = Some(dest);
                    }
                    Err(err) => {
                        job.status = SideGenStatus::Failed;
                        job.error_code = Some(SideGenErrorCode::classify(
                            SideGenErrorCode::DownloadFailed,
                            err.message(),
                        ));
                        job.error_message = Some(err.message().to_string());
                    }
                }
                changed = true;
            }
            Ok(GenJobUpdate::Failed { message }) => {
                job.status = SideGenStatus::Failed;
                job.error_code = Some(SideGenErrorCode::classify(
                    SideGenErrorCode::GenerationFailed,
                    &message,
                ));
                job.error_message = Some(message);
                changed = true;
            }
            Err(err) => {
                job.status = SideGenStatus::Failed;
                job.error_code = Some(SideGenErrorCode::classify(
                    SideGenErrorCode::PollFailed,
                    err.message(),
                ));
                job.error_message = Some(err.message().to_string());
                changed = true;
            }
        }
    }
    changed
}

pub(crate) fn write_jobs(workspace: &Workspace, jobs: &SideGenJobs) -> Result<(), EngineError> {
    let bytes = serde_json::to_vec_pretty(jobs).map_err(reel_storage::StoreError::from)?;
    write_atomic(&workspace.sidegen_jobs(), &bytes)?;
    Ok(())
}

#[cfg(test)]
#[path = "sidegen_tests.rs"]
mod tests;
