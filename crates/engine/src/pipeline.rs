// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driving one request through the full stage sequence.
//!
//! The runner owns the per-run wiring: workspace acquisition, the event
//! bus with its journal/checkpoint/notify listeners, the dispatch table
//! mapping stages to their documents, the detached side-generation task,
//! and the terminal run events. Stage semantics live in
//! [`StageRunner`], [`AwaitGate`], and [`DeliveryStage`].

use crate::await_gate::{AwaitGate, GateConfig};
use crate::bus::EventBus;
use crate::delivery_stage::DeliveryStage;
use crate::error::EngineError;
use crate::listeners::{CheckpointListener, JournalListener, NotifyListener};
use crate::recovery::RecoveryChain;
use crate::reflection::{QaConfig, ReflectionLoop};
use crate::sidegen::{SideGenConfig, SideGenHandle, SideGenOrchestrator};
use crate::stage_runner::{StageContext, StageRunner};
use chrono::Utc;
use parking_lot::Mutex;
use reel_adapters::{AgentDispatch, FileDelivery, Messaging, VideoGeneration};
use reel_core::event::EventKind;
use reel_core::{
    PipelineEvent, PipelineStage, PipelineStateMachine, QueueItem, RunState, StageSignal,
};
use reel_storage::{CheckpointStore, StateStore, Workspace, WorkspaceManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How a run left the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Shutdown was requested; the current stage finished, the rest did
    /// not run. State is checkpointed for resumption.
    Interrupted,
}

/// The documents a stage invocation is assembled from.
#[derive(Debug, Clone)]
pub struct StageDocs {
    /// Stage-workflow document (what to do).
    pub workflow: String,
    /// Agent-definition document (who is doing it).
    pub agent: String,
    /// QA gate name, for prompts and logs.
    pub gate_name: String,
    /// Gate criteria document.
    pub criteria: String,
}

/// Pipeline-wide configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the user-editable workflow/agent/gate documents.
    /// Stages fall back to built-in documents when a file is absent.
    pub docs_root: Option<PathBuf>,
    pub agent_timeout: Duration,
    pub qa: QaConfig,
    pub sidegen: SideGenConfig,
    pub gate: GateConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            docs_root: None,
            agent_timeout: Duration::from_secs(600),
            qa: QaConfig::default(),
            sidegen: SideGenConfig::default(),
            gate: GateConfig::default(),
        }
    }
}

/// External collaborators the runner dispatches to.
pub struct PipelineDeps<D, M, F, G> {
    pub dispatch: D,
    pub messaging: M,
    pub delivery: F,
    pub generation: G,
}

/// Dispatch-table entry: workflow document, agent directory, QA gate.
fn dispatch_table(stage: PipelineStage) -> (&'static str, &'static str, &'static str) {
    match stage {
        PipelineStage::Router => ("router.md", "router", "router_gate"),
        PipelineStage::Research => ("research.md", "research", "research_gate"),
        PipelineStage::Transcript => ("transcript.md", "transcript", "transcript_gate"),
        PipelineStage::Content => ("content.md", "content", "content_gate"),
        PipelineStage::LayoutDetective => {
            ("layout_detective.md", "layout-detective", "layout_gate")
        }
        PipelineStage::FfmpegEngineer => {
            ("ffmpeg_engineer.md", "ffmpeg-engineer", "encode_gate")
        }
        // Non-agent stages have no table entry to dispatch.
        PipelineStage::SidegenAwait | PipelineStage::Delivery => ("", "", ""),
        PipelineStage::Assembly => ("assembly.md", "assembly", "assembly_gate"),
    }
}

/// Drives one request from its current stage to a terminal outcome.
pub struct PipelineRunner<D, M, F, G>
where
    D: AgentDispatch,
    M: Messaging,
    F: FileDelivery,
    G: VideoGeneration,
{
    messaging: M,
    stage_runner: StageRunner<D, M>,
    delivery: DeliveryStage<M, F>,
    orchestrator: SideGenOrchestrator<G>,
    await_gate: AwaitGate<G>,
    store: Arc<CheckpointStore>,
    workspaces: WorkspaceManager,
    config: PipelineConfig,
}

impl<D, M, F, G> PipelineRunner<D, M, F, G>
where
    D: AgentDispatch,
    M: Messaging,
    F: FileDelivery,
    G: VideoGeneration,
{
    pub fn new(
        deps: PipelineDeps<D, M, F, G>,
        store: Arc<CheckpointStore>,
        workspaces: WorkspaceManager,
        config: PipelineConfig,
    ) -> Self {
        let reflection = ReflectionLoop::new(deps.dispatch.clone(), config.qa.clone());
        let recovery = RecoveryChain::new(Some(deps.messaging.clone()));
        let stage_runner = StageRunner::new(
            deps.dispatch,
            reflection,
            recovery,
            config.agent_timeout,
        );
        let delivery = DeliveryStage::new(deps.messaging.clone(), deps.delivery);
        let orchestrator = SideGenOrchestrator::new(deps.generation.clone(), config.sidegen.clone());
        let await_gate = AwaitGate::new(deps.generation, config.gate.clone());
        Self {
            messaging: deps.messaging,
            stage_runner,
            delivery,
            orchestrator,
            await_gate,
            store,
            workspaces,
            config,
        }
    }

    /// Run `item` to completion (or terminal failure).
    pub async fn run(&self, item: &QueueItem) -> Result<RunOutcome, EngineError> {
        self.run_until(item, &CancellationToken::new()).await
    }

    /// Run `item`, stopping after the current stage when `cancel` fires.
    pub async fn run_until(
        &self,
        item: &QueueItem,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, EngineError> {
        let run_id = &item.run_id;
        let workspace = self.workspaces.acquire(run_id)?;

        let (machine, state) = self.position(item)?;
        let state = Arc::new(Mutex::new(state));
        let mut machine = machine;

        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(CheckpointListener::new(
            Arc::clone(&self.store),
            run_id.clone(),
            Arc::clone(&state),
        )));
        bus.subscribe(Arc::new(JournalListener::new(
            Arc::clone(&self.store),
            run_id.clone(),
        )));
        bus.subscribe(Arc::new(NotifyListener::new(self.messaging.clone())));

        // The workspace scope guarantee: a run document exists from the
        // moment the workspace is acquired.
        self.store.save_state(run_id, &state.lock().clone())?;

        let result = self
            .drive(&bus, &mut machine, &state, &workspace, item, cancel)
            .await;

        // Scope exit: persist whatever state the run reached.
        self.store.save_state(run_id, &state.lock().clone())?;

        match result {
            Ok(RunOutcome::Completed) => {
                bus.publish(&PipelineEvent::new(Utc::now(), EventKind::RunCompleted))
                    .await;
                info!(%run_id, "run completed");
                Ok(RunOutcome::Completed)
            }
            Ok(RunOutcome::Interrupted) => {
                info!(%run_id, stage = %machine.current(), "run interrupted for shutdown");
                Ok(RunOutcome::Interrupted)
            }
            Err(err) => {
                bus.publish(&PipelineEvent::new(
                    Utc::now(),
                    EventKind::RunFailed {
                        error: err.to_string(),
                    },
                ))
                .await;
                warn!(%run_id, error = %err, "run failed");
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        bus: &EventBus,
        machine: &mut PipelineStateMachine,
        state: &Arc<Mutex<RunState>>,
        workspace: &Workspace,
        item: &QueueItem,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, EngineError> {
        let mut sidegen_handle: Option<SideGenHandle> = None;
        let mut prior_artifacts = self.existing_artifacts(machine, workspace);

        let outcome = loop {
            if machine.is_finished() {
                break Ok(RunOutcome::Completed);
            }
            if cancel.is_cancelled() {
                break Ok(RunOutcome::Interrupted);
            }
            let stage = machine.current();
            match stage {
                PipelineStage::Delivery => {
                    if let Err(err) = self
                        .delivery
                        .run(bus, machine, state, workspace)
                        .await
                    {
                        break Err(err);
                    }
                }
                PipelineStage::SidegenAwait => {
                    // The gate owns the jobs file; stop the background
                    // worker first.
                    if let Some(handle) = sidegen_handle.take() {
                        handle.shutdown().await;
                    }
                    bus.publish(&PipelineEvent::new(
                        Utc::now(),
                        EventKind::StageEntered { stage },
                    ))
                    .await;
                    if let Err(err) = self.await_gate.run(bus, workspace).await {
                        break Err(err);
                    }
                    let completed = match machine.advance(StageSignal::GateComplete) {
                        Ok(completed) => completed,
                        Err(err) => break Err(err.into()),
                    };
                    state
                        .lock()
                        .complete_stage(completed, Some(machine.current()), Utc::now());
                    bus.publish(&PipelineEvent::new(
                        Utc::now(),
                        EventKind::StageCompleted { stage: completed },
                    ))
                    .await;
                }
                stage => {
                    let docs = self.stage_docs(stage);
                    let ctx = StageContext {
                        run_id: &item.run_id,
                        workspace,
                        request: &item.request,
                        stage,
                        docs: &docs,
                        prior_artifacts: &prior_artifacts,
                        state,
                    };
                    let artifact = match self.stage_runner.run_stage(bus, machine, &ctx).await {
                        Ok(artifact) => artifact,
                        Err(err) => break Err(err),
                    };
                    prior_artifacts.push(artifact.clone());

                    if stage == PipelineStage::Content {
                        sidegen_handle = self
                            .spawn_sidegen(bus, item, workspace, &artifact)
                            .await?;
                    }
                }
            }
        };

        // No background task outlives its run.
        if let Some(handle) = sidegen_handle.take() {
            handle.shutdown().await;
        }
        outcome
    }

    /// Fire the side-generation orchestrator after CONTENT completes.
    async fn spawn_sidegen(
        &self,
        bus: &EventBus,
        item: &QueueItem,
        workspace: &Workspace,
        content_artifact: &std::path::Path,
    ) -> Result<Option<SideGenHandle>, EngineError> {
        let text = std::fs::read_to_string(content_artifact).unwrap_or_default();
        let prompts = SideGenOrchestrator::<G>::extract_prompts(&text);
        self.orchestrator
            .start(bus, &item.run_id, workspace, prompts)
            .await
    }

    /// Compute the machine position and run state for `item`.
    ///
    /// A checkpointed state resumes at its first uncompleted stage; an
    /// explicit start-stage directive overrides the detection. Without a
    /// checkpoint the run starts fresh.
    fn position(
        &self,
        item: &QueueItem,
    ) -> Result<(PipelineStateMachine, RunState), EngineError> {
        let hint = item.request.directives.start_stage_override();
        match self.store.load_state(&item.run_id)? {
            Some(mut saved) => {
                if let Some(stage) = hint {
                    // Re-running from an explicit stage un-completes that
                    // stage and everything after it.
                    saved
                        .stages_completed
                        .retain(|done| done.index() < stage.index());
                }
                let resume_from = match hint.or_else(|| saved.resume_point()) {
                    Some(stage) => stage,
                    None => {
                        // Terminal stage already completed; re-running is
                        // a no-op positioned at the end.
                        PipelineStage::Delivery
                    }
                };
                saved.stage = resume_from;
                let machine =
                    PipelineStateMachine::resume_at(resume_from, saved.stages_completed.clone());
                Ok((machine, saved))
            }
            None => {
                let mut state = RunState::new(item.request.fingerprint(), Utc::now());
                let machine = match hint {
                    Some(stage) => {
                        state.stage = stage;
                        PipelineStateMachine::resume_at(stage, Default::default())
                    }
                    None => PipelineStateMachine::new(),
                };
                Ok((machine, state))
            }
        }
    }

    /// Artifacts of already-completed agent stages, for resume context.
    fn existing_artifacts(
        &self,
        machine: &PipelineStateMachine,
        workspace: &Workspace,
    ) -> Vec<PathBuf> {
        machine
            .completed()
            .iter()
            .filter(|stage| stage.is_agent_stage())
            .map(|stage| {
                workspace.artifact(&format!("{}.json", stage.as_str().to_ascii_lowercase()))
            })
            .filter(|path| path.exists())
            .collect()
    }

    /// Assemble the documents for an agent stage from the dispatch table.
    fn stage_docs(&self, stage: PipelineStage) -> StageDocs {
        let (workflow_file, agent_dir, gate_name) = dispatch_table(stage);
        let workflow = self
            .load_doc(&["workflows", workflow_file])
            .unwrap_or_else(|| {
                format!("Perform the {stage} stage of the reel pipeline.")
            });
        let agent = self
            .load_doc(&["agents", agent_dir, "agent.md"])
            .unwrap_or_else(|| format!("You are the {agent_dir} agent."));
        let criteria = self
            .load_doc(&["gates", &format!("{gate_name}.md")])
            .unwrap_or_else(|| {
                "Output must be valid JSON matching the stage schema and \
                 faithful to the source material."
                    .to_string()
            });
        StageDocs {
            workflow,
            agent,
            gate_name: gate_name.to_string(),
            criteria,
        }
    }

    fn load_doc(&self, parts: &[&str]) -> Option<String> {
        let root = self.config.docs_root.as_ref()?;
        let mut path = root.clone();
        for part in parts {
            path.push(part);
        }
        std::fs::read_to_string(path).ok()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
