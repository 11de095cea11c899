//! Scenario: the CONTENT agent fails persistently. All four recovery
//! levels run once, the user gets one escalation message, and the run
//! state does not record CONTENT as completed.

use crate::prelude::*;
use reel_core::{PipelineStage, RunId};
use reel_storage::StateStore;

const RUN: &str = "20240101-120000-000000-cafe3001";

#[tokio::test]
async fn persistent_content_failure_escalates_once() {
    let h = harness();
    h.dispatch.set_handler(|req| {
        if req.prompt.contains("QA gate") {
            return Ok(PASS.to_string());
        }
        // The content agent's process dies every time; everyone else
        // behaves.
        if req.prompt.contains("content.json") {
            return Err(reel_adapters::DispatchError::ProcessFailed(
                "content agent crashed".to_string(),
            ));
        }
        Ok(r#"{"ok": true}"#.to_string())
    });

    let item = h.item(RUN, "https://example.com/v/1", "standard");
    h.runner.run(&item).await.unwrap_err();

    let tags = h.event_tags(RUN);
    let attempted: Vec<&String> = tags
        .iter()
        .filter(|t| t.starts_with("recovery.level_attempted@"))
        .collect();
    assert_eq!(attempted.len(), 4);

    let journal = h.journal(RUN).join("\n");
    for level in ["RETRY", "FORK", "FRESH", "ESCALATE"] {
        assert!(journal.contains(level), "missing level {level}");
    }
    assert!(tags.contains(&"recovery.escalated@CONTENT".to_string()));
    assert!(tags.contains(&"pipeline.stage_failed@CONTENT".to_string()));

    // Exactly one escalation message reached the user (the run-failed
    // notification is separate and generic).
    let escalations: Vec<String> = h
        .messaging
        .notifications()
        .into_iter()
        .filter(|n| n.contains("could not recover"))
        .collect();
    assert_eq!(escalations.len(), 1);

    // CONTENT is not in stages_completed; earlier stages are.
    let state = h.store.load_state(&RunId::new(RUN)).unwrap().unwrap();
    assert!(!state.stages_completed.contains(&PipelineStage::Content));
    assert!(state.stages_completed.contains(&PipelineStage::Transcript));
    assert_eq!(state.stage, PipelineStage::Content);
}
