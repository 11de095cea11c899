// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic QA-gated stage execution.
//!
//! One code path runs every agent stage; per-stage differences (workflow
//! document, agent definition, gate criteria) arrive through
//! [`StageContext`]. The flow: dispatch the agent, gate its output
//! through the reflection loop, rework with the critic's prescriptive
//! fixes up to the attempt cap, and hand persistent failures to the
//! recovery chain.

use crate::bus::EventBus;
use crate::error::EngineError;
use crate::pipeline::StageDocs;
use crate::recovery::{RecoveryAttempt, RecoveryChain};
use crate::reflection::{QaOutcome, ReflectionLoop};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use reel_adapters::{AgentDispatch, DispatchRequest, Messaging};
use reel_core::event::EventKind;
use reel_core::{
    PipelineEvent, PipelineStage, PipelineStateMachine, RecoveryLevel, Request, RunId, RunState,
    StageSignal,
};
use reel_storage::{write_atomic, Workspace};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Everything one stage invocation needs.
pub struct StageContext<'a> {
    pub run_id: &'a RunId,
    pub workspace: &'a Workspace,
    pub request: &'a Request,
    pub stage: PipelineStage,
    pub docs: &'a StageDocs,
    /// Artifacts produced by earlier stages, oldest first.
    pub prior_artifacts: &'a [PathBuf],
    pub state: &'a Arc<Mutex<RunState>>,
}

/// Runs one agent stage behind its QA gate.
pub struct StageRunner<D: AgentDispatch, M: Messaging> {
    dispatch: D,
    reflection: ReflectionLoop<D>,
    recovery: RecoveryChain<M>,
    agent_timeout: Duration,
}

impl<D: AgentDispatch, M: Messaging> StageRunner<D, M> {
    pub fn new(
        dispatch: D,
        reflection: ReflectionLoop<D>,
        recovery: RecoveryChain<M>,
        agent_timeout: Duration,
    ) -> Self {
        Self {
            dispatch,
            reflection,
            recovery,
            agent_timeout,
        }
    }

    /// Drive `ctx.stage` to a terminal outcome.
    ///
    /// On success the state machine has advanced, the run state records
    /// the completion, and `pipeline.stage_completed` has been published.
    /// On failure `pipeline.stage_failed` has been published and the
    /// error carries the reason.
    pub async fn run_stage(
        &self,
        bus: &EventBus,
        machine: &mut PipelineStateMachine,
        ctx: &StageContext<'_>,
    ) -> Result<PathBuf, EngineError> {
        bus.publish(&PipelineEvent::new(
            Utc::now(),
            EventKind::StageEntered { stage: ctx.stage },
        ))
        .await;

        let mut history: Vec<String> = Vec::new();
        let mut fixes: Vec<String> = Vec::new();
        let mut last_failure = String::new();
        let max_attempts = self.reflection.config().max_attempts;

        for _ in 0..max_attempts {
            let attempt = ctx.state.lock().record_attempt(ctx.stage, Utc::now());
            let artifact = match self.invoke_agent(ctx, ctx.prior_artifacts, &history, &fixes).await
            {
                Ok(artifact) => artifact,
                Err(err) => {
                    // Agent subprocess failures engage the recovery chain
                    // rather than aborting the run outright.
                    warn!(stage = %ctx.stage, error = %err, "agent invocation failed");
                    last_failure = err.to_string();
                    break;
                }
            };

            match self
                .reflection
                .review(ctx.stage, &ctx.docs.gate_name, &ctx.docs.criteria, &[artifact.clone()])
                .await
            {
                Ok(QaOutcome::Pass(critique)) => {
                    self.complete(machine, ctx)?;
                    bus.publish(&PipelineEvent::new(
                        Utc::now(),
                        EventKind::QaGatePassed {
                            stage: ctx.stage,
                            score: critique.score,
                            attempt,
                        },
                    ))
                    .await;
                    bus.publish(&PipelineEvent::new(
                        Utc::now(),
                        EventKind::StageCompleted { stage: ctx.stage },
                    ))
                    .await;
                    return Ok(artifact);
                }
                Ok(QaOutcome::Rework(critique)) => {
                    bus.publish(&PipelineEvent::new(
                        Utc::now(),
                        EventKind::QaGateReworked {
                            stage: ctx.stage,
                            attempt,
                            blockers: critique.blockers.clone(),
                        },
                    ))
                    .await;
                    history.push(format!(
                        "attempt {attempt}: REWORK (score {}): {}",
                        critique.score,
                        critique.blockers.join("; "),
                    ));
                    fixes = critique.prescriptive_fixes;
                    last_failure = "rework attempts exhausted".to_string();
                }
                Ok(QaOutcome::Fail(critique)) => {
                    bus.publish(&PipelineEvent::new(
                        Utc::now(),
                        EventKind::QaGateFailed {
                            stage: ctx.stage,
                            attempt,
                        },
                    ))
                    .await;
                    last_failure = format!("QA FAIL: {}", critique.blockers.join("; "));
                    break;
                }
                Err(err) => {
                    warn!(stage = %ctx.stage, error = %err, "QA dispatch failed");
                    last_failure = err.to_string();
                    break;
                }
            }
        }

        // Recovery chain: retry → fork → fresh → escalate.
        let mut attempt = ChainAttempt {
            runner: self,
            ctx,
            history,
        };
        let result = self
            .recovery
            .run(bus, ctx.stage, &last_failure, &mut attempt)
            .await;

        if result.succeeded {
            self.complete(machine, ctx)?;
            bus.publish(&PipelineEvent::new(
                Utc::now(),
                EventKind::StageCompleted { stage: ctx.stage },
            ))
            .await;
            let artifact = result
                .final_artifact
                .unwrap_or_else(|| ctx.workspace.artifact(&stage_artifact_name(ctx.stage)));
            return Ok(artifact);
        }

        bus.publish(&PipelineEvent::new(
            Utc::now(),
            EventKind::StageFailed {
                stage: ctx.stage,
                error: last_failure.clone(),
            },
        ))
        .await;
        Err(EngineError::RecoveryExhausted {
            stage: ctx.stage,
            reason: last_failure,
        })
    }

    /// Advance the machine and record the completion, before the
    /// completion event is published.
    fn complete(
        &self,
        machine: &mut PipelineStateMachine,
        ctx: &StageContext<'_>,
    ) -> Result<(), EngineError> {
        let completed = machine.advance(StageSignal::QaPass)?;
        let next = if machine.is_finished() {
            None
        } else {
            Some(machine.current())
        };
        ctx.state.lock().complete_stage(completed, next, Utc::now());
        info!(stage = %completed, "stage completed");
        Ok(())
    }

    async fn invoke_agent(
        &self,
        ctx: &StageContext<'_>,
        prior_artifacts: &[PathBuf],
        history: &[String],
        fixes: &[String],
    ) -> Result<PathBuf, EngineError> {
        let prompt = build_agent_prompt(ctx, prior_artifacts, history, fixes);
        let request = DispatchRequest::new(prompt, self.agent_timeout)
            .with_workdir(ctx.workspace.path());
        let reply = self.dispatch.dispatch(request).await?;
        let artifact = ctx.workspace.artifact(&stage_artifact_name(ctx.stage));
        write_atomic(&artifact, reply.as_bytes())?;
        Ok(artifact)
    }
}

/// The recovery chain's view of the failing stage: one agent re-run per
/// level, with context stripped according to the level.
struct ChainAttempt<'a, D: AgentDispatch, M: Messaging> {
    runner: &'a StageRunner<D, M>,
    ctx: &'a StageContext<'a>,
    history: Vec<String>,
}

#[async_trait]
impl<D: AgentDispatch, M: Messaging> RecoveryAttempt for ChainAttempt<'_, D, M> {
    async fn attempt(
        &mut self,
        level: RecoveryLevel,
    ) -> Result<Option<PathBuf>, EngineError> {
        let history = if level.keeps_history() {
            self.history.clone()
        } else {
            Vec::new()
        };
        let prior: &[PathBuf] = if level.keeps_artifacts() {
            self.ctx.prior_artifacts
        } else {
            &[]
        };
        self.ctx
            .state
            .lock()
            .record_attempt(self.ctx.stage, Utc::now());
        let artifact = self
            .runner
            .invoke_agent(self.ctx, prior, &history, &[])
            .await?;
        match self
            .runner
            .reflection
            .review(
                self.ctx.stage,
                &self.ctx.docs.gate_name,
                &self.ctx.docs.criteria,
                &[artifact.clone()],
            )
            .await?
        {
            QaOutcome::Pass(_) => Ok(Some(artifact)),
            QaOutcome::Rework(critique) | QaOutcome::Fail(critique) => {
                Err(EngineError::AttemptRejected(format!(
                    "{}: {}",
                    critique.decision,
                    critique.blockers.join("; "),
                )))
            }
        }
    }
}

fn stage_artifact_name(stage: PipelineStage) -> String {
    format!("{}.json", stage.as_str().to_ascii_lowercase())
}

fn build_agent_prompt(
    ctx: &StageContext<'_>,
    prior_artifacts: &[PathBuf],
    history: &[String],
    fixes: &[String],
) -> String {
    let mut prompt = format!("{}\n\n{}\n", ctx.docs.workflow, ctx.docs.agent);
    prompt.push_str(&format!(
        "\n## Request\nsource_url: {}\nmessage: {}\n",
        ctx.request.source_url, ctx.request.message_text,
    ));
    if let Some(duration) = ctx.request.directives.target_duration_s {
        prompt.push_str(&format!("target_duration_s: {duration}\n"));
    }
    if let Some(segments) = ctx.request.directives.segment_count {
        prompt.push_str(&format!("segment_count: {segments}\n"));
    }
    for (key, value) in &ctx.request.directives.advisory {
        prompt.push_str(&format!("{key}: {value}\n"));
    }
    prompt.push_str(&format!(
        "\n## Workspace\n{}\nWrite your result to {} in the workspace.\n",
        ctx.workspace.path().display(),
        stage_artifact_name(ctx.stage),
    ));
    if !prior_artifacts.is_empty() {
        prompt.push_str("\n## Prior artifacts\n");
        for artifact in prior_artifacts {
            prompt.push_str(&format!("- {}\n", artifact.display()));
        }
    }
    if !fixes.is_empty() {
        prompt.push_str("\n## Rework guidance\n");
        for fix in fixes {
            prompt.push_str(&format!("- {fix}\n"));
        }
    }
    if !history.is_empty() {
        prompt.push_str("\n## Attempt history\n");
        for entry in history {
            prompt.push_str(&format!("- {entry}\n"));
        }
    }
    prompt
}

#[cfg(test)]
#[path = "stage_runner_tests.rs"]
mod tests;
