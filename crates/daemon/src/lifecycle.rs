// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: single-instance lock, startup recovery, tick loop.

use crate::env::{ConfigurationError, Settings};
use crate::inbox::InboxProcessor;
use chrono::Utc;
use fs2::FileExt;
use reel_adapters::{
    AgentDispatch, FileDelivery, KnowledgeBase, Messaging, MessagingInbox, ResourceMonitor,
    VideoGeneration, YamlKnowledgeBase,
};
use reel_core::event::EventKind;
use reel_core::{PipelineEvent, SystemClock};
use reel_engine::{
    CrashRecoveryPlanner, EngineError, GateConfig, PipelineConfig, PipelineDeps, PipelineRunner,
    QaConfig, ResourceThrottler, RunOutcome, SideGenConfig, ThrottleConfig,
};
use reel_storage::{
    append_line, write_atomic, CheckpointStore, Queue, QueueError, StateStore, StoreError,
    WorkspaceManager,
};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Errors from daemon startup and operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another daemon already owns {path} (pid {pid})")]
    AlreadyRunning { path: PathBuf, pid: String },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigurationError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Exclusive ownership of a queue root, held via an advisory lock on the
/// pid file. Dropping the lock releases it.
#[derive(Debug)]
pub struct DaemonLock {
    // NOTE(lifetime): held to maintain the exclusive file lock
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl DaemonLock {
    pub fn acquire(path: PathBuf) -> Result<Self, LifecycleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        if file.try_lock_exclusive().is_err() {
            let pid = std::fs::read_to_string(&path)
                .unwrap_or_default()
                .trim()
                .to_string();
            return Err(LifecycleError::AlreadyRunning { path, pid });
        }
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Adapters the daemon is wired with.
pub struct DaemonDeps<D, M, I, F, G, R> {
    pub dispatch: D,
    pub messaging: M,
    pub inbox: I,
    pub delivery: F,
    pub generation: G,
    pub monitor: R,
}

/// The long-running process driving the queue.
pub struct Daemon<D, M, I, F, G, R>
where
    D: AgentDispatch,
    M: Messaging,
    I: MessagingInbox,
    F: FileDelivery,
    G: VideoGeneration,
    R: ResourceMonitor,
{
    settings: Settings,
    // NOTE(lifetime): released when the daemon is dropped
    #[allow(dead_code)]
    lock: DaemonLock,
    queue: Queue,
    store: Arc<CheckpointStore>,
    runner: PipelineRunner<D, M, F, G>,
    throttler: ResourceThrottler<R, M>,
    inbox: InboxProcessor<I, M, SystemClock>,
}

impl<D, M, I, F, G, R> Daemon<D, M, I, F, G, R>
where
    D: AgentDispatch,
    M: Messaging,
    I: MessagingInbox,
    F: FileDelivery,
    G: VideoGeneration,
    R: ResourceMonitor,
{
    /// Acquire the instance lock, recover crashed state, wire the
    /// pipeline.
    pub async fn startup(
        settings: Settings,
        deps: DaemonDeps<D, M, I, F, G, R>,
    ) -> Result<Self, LifecycleError> {
        let lock = DaemonLock::acquire(settings.lock_path())?;
        info!(state_dir = %settings.state_dir.display(), "daemon starting");

        let queue = Queue::open(&settings.queue_root)?;
        let recovered = queue.recover_processing()?;
        if recovered > 0 {
            info!(recovered, "returned in-flight items to the inbox");
        }

        let store = Arc::new(CheckpointStore::new(&settings.workspace_root));
        let workspaces = WorkspaceManager::new(&settings.workspace_root);

        // Plan resumption for every unfinished run before accepting work.
        let planner = CrashRecoveryPlanner::new(Arc::clone(&store), Some(deps.messaging.clone()));
        let plans = planner.plan_all().await?;
        if !plans.is_empty() {
            info!(count = plans.len(), "resume plans computed");
        }

        let config = PipelineConfig {
            docs_root: settings.docs_root.clone(),
            agent_timeout: settings.agent_timeout,
            qa: QaConfig {
                agent_timeout: settings.agent_timeout,
                ..QaConfig::default()
            },
            sidegen: SideGenConfig {
                max_clips: settings.clip_count,
                ..SideGenConfig::default()
            },
            gate: GateConfig {
                timeout: settings.generation_timeout,
                ..GateConfig::default()
            },
        };
        let runner = PipelineRunner::new(
            PipelineDeps {
                dispatch: deps.dispatch,
                messaging: deps.messaging.clone(),
                delivery: deps.delivery,
                generation: deps.generation,
            },
            Arc::clone(&store),
            workspaces,
            config,
        );
        let throttler = ResourceThrottler::new(
            deps.monitor,
            Some(deps.messaging.clone()),
            ThrottleConfig::default(),
        );
        // Operator preferences ride along with every request as advisory
        // inputs for the agents.
        let knowledge = YamlKnowledgeBase::new(&settings.knowledge_base);
        let advisory = match knowledge.entries() {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, path = %settings.knowledge_base.display(), "knowledge base unreadable");
                Vec::new()
            }
        };
        let inbox = InboxProcessor::new(
            deps.inbox,
            deps.messaging,
            SystemClock,
            settings.messaging_allowed_senders.clone(),
        )
        .with_advisory_defaults(advisory);

        Ok(Self {
            settings,
            lock,
            queue,
            store,
            runner,
            throttler,
            inbox,
        })
    }

    /// The tick loop. Returns when `shutdown` fires.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), LifecycleError> {
        let heartbeat_every = self.settings.watchdog_interval / 2;
        let mut last_heartbeat: Option<Instant> = None;

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            self.heartbeat(heartbeat_every, &mut last_heartbeat);

            let _ = self.inbox.drain(&self.queue).await;

            // Admission control; shutdown wins over a blocked host.
            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.throttler.admit(None) => {
                    if let Err(err) = result {
                        warn!(error = %err, "admission failed");
                        continue;
                    }
                }
            }

            match self.queue.claim_next() {
                Ok(Some(claimed)) => {
                    let item = claimed.item().clone();
                    match self.runner.run_until(&item, &shutdown).await {
                        Ok(RunOutcome::Completed) => claimed.commit()?,
                        Ok(RunOutcome::Interrupted) => claimed.release()?,
                        Err(err) => {
                            // Unhandled stage error: the item goes back
                            // to the inbox and the release is journaled.
                            error!(run_id = %item.run_id, error = %err, "run failed");
                            let event = PipelineEvent::new(
                                Utc::now(),
                                EventKind::QueueItemReleased {
                                    reason: err.to_string(),
                                },
                            );
                            if let Err(journal_err) =
                                self.store.append_event(&item.run_id, &event)
                            {
                                warn!(error = %journal_err, "failed to journal release");
                            }
                            claimed.release()?;
                        }
                    }
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.inbox_poll_interval) => {}
                    }
                }
                Err(err) => {
                    warn!(error = %err, "queue claim failed");
                    tokio::time::sleep(self.settings.inbox_poll_interval).await;
                }
            }
        }

        self.stopping();
        Ok(())
    }

    /// Liveness marker for the supervising environment, at half the
    /// watchdog window.
    fn heartbeat(&self, every: Duration, last: &mut Option<Instant>) {
        let due = last.map(|at| at.elapsed() >= every).unwrap_or(true);
        if !due {
            return;
        }
        *last = Some(Instant::now());
        let stamp = Utc::now().to_rfc3339();
        if let Err(err) = write_atomic(&self.settings.heartbeat_path(), stamp.as_bytes()) {
            warn!(error = %err, "heartbeat write failed");
        }
    }

    fn stopping(&self) {
        info!("daemon stopping");
        let event = PipelineEvent::new(Utc::now(), EventKind::DaemonStopping);
        let path = self.settings.state_dir.join("daemon-events.log");
        if let Err(err) = append_line(&path, event.journal_line().as_bytes()) {
            warn!(error = %err, "failed to journal daemon.stopping");
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
