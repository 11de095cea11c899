//! Shared harness for the behavioral specs.

use chrono::{TimeZone, Utc};
use reel_adapters::{
    DispatchRequest, FakeAgentDispatch, FakeFileDelivery, FakeMessaging, FakeVideoGeneration,
};
use reel_core::{QueueItem, Request, RunId};
use reel_engine::{
    GateConfig, PipelineConfig, PipelineDeps, PipelineRunner, QaConfig, SideGenConfig,
};
use reel_storage::{CheckpointStore, Queue, WorkspaceManager};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const PASS: &str = r#"{"decision": "PASS", "score": 90}"#;

pub type SpecRunner =
    PipelineRunner<FakeAgentDispatch, FakeMessaging, FakeFileDelivery, FakeVideoGeneration>;

pub struct Harness {
    pub dir: TempDir,
    pub dispatch: FakeAgentDispatch,
    pub messaging: FakeMessaging,
    pub delivery: FakeFileDelivery,
    pub generation: FakeVideoGeneration,
    pub store: Arc<CheckpointStore>,
    pub queue: Queue,
    pub runner: SpecRunner,
}

pub fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let dispatch = FakeAgentDispatch::new();
    let messaging = FakeMessaging::new();
    let delivery = FakeFileDelivery::new();
    let generation = FakeVideoGeneration::new();
    let store = Arc::new(CheckpointStore::new(dir.path().join("workspace/runs")));
    let queue = Queue::open(dir.path().join("queue")).unwrap();
    let config = PipelineConfig {
        docs_root: None,
        agent_timeout: Duration::from_secs(5),
        qa: QaConfig::default(),
        sidegen: SideGenConfig {
            max_clips: 4,
            poll_start: Duration::from_millis(5),
            poll_cap: Duration::from_millis(20),
        },
        gate: GateConfig {
            timeout: Duration::from_millis(400),
            poll_start: Duration::from_millis(5),
            poll_cap: Duration::from_millis(20),
        },
    };
    let runner = PipelineRunner::new(
        PipelineDeps {
            dispatch: dispatch.clone(),
            messaging: messaging.clone(),
            delivery: delivery.clone(),
            generation: generation.clone(),
        },
        Arc::clone(&store),
        WorkspaceManager::new(dir.path().join("workspace/runs")),
        config,
    );
    Harness {
        dir,
        dispatch,
        messaging,
        delivery,
        generation,
        store,
        queue,
        runner,
    }
}

impl Harness {
    pub fn item(&self, run_id: &str, url: &str, message: &str) -> QueueItem {
        QueueItem::new(
            RunId::new(run_id),
            Utc.timestamp_opt(1_704_110_400, 0).unwrap(),
            Request::new(url, message),
        )
    }

    /// The run's journal, one line per event.
    pub fn journal(&self, run_id: &str) -> Vec<String> {
        let path = self
            .store
            .run_dir(&RunId::new(run_id))
            .join("events.log");
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Event names in journal order, e.g. `qa.gate_passed@TRANSCRIPT`.
    pub fn event_tags(&self, run_id: &str) -> Vec<String> {
        self.journal(run_id)
            .iter()
            .filter_map(|line| {
                let mut columns = line.split(" | ");
                let _ts = columns.next()?;
                let name = columns.next()?;
                let stage = columns.next()?;
                Some(format!("{name}@{stage}"))
            })
            .collect()
    }
}

/// Default fleet: QA passes everything, agents answer JSON, the assembly
/// agent writes the final reel into its working directory.
pub fn wire_default_fleet(dispatch: &FakeAgentDispatch) {
    dispatch.set_handler(|req: &DispatchRequest| {
        if req.prompt.contains("QA gate") {
            return Ok(PASS.to_string());
        }
        write_reel_if_assembly(req);
        Ok(r#"{"ok": true}"#.to_string())
    });
}

/// The assembly agent's observable side effect.
pub fn write_reel_if_assembly(req: &DispatchRequest) {
    if req.prompt.contains("assembly.json") {
        if let Some(workdir) = &req.workdir {
            let _ = std::fs::write(workdir.join("final-reel.mp4"), b"reel bytes");
        }
    }
}
