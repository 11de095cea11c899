//! Scenario: the critic demands one rework at TRANSCRIPT, then passes.
//! The recovery chain stays out of it.

use crate::prelude::*;
use reel_storage::StateStore;
use std::sync::{Arc, Mutex};

const RUN: &str = "20240101-120000-000000-cafe2001";
const REWORK: &str = r#"{"decision": "REWORK", "score": 35, "blockers": ["filler words kept"], "prescriptive_fixes": ["strip the filler words"]}"#;

#[tokio::test]
async fn rework_then_pass_without_recovery() {
    let h = harness();
    let transcript_reviews = Arc::new(Mutex::new(0u32));
    {
        let transcript_reviews = Arc::clone(&transcript_reviews);
        h.dispatch.set_handler(move |req| {
            if req.prompt.contains("QA gate") {
                // First TRANSCRIPT review demands a rework, the second
                // passes; every other gate passes outright.
                if req.prompt.contains("transcript_gate") {
                    let mut count = transcript_reviews.lock().unwrap();
                    *count += 1;
                    if *count == 1 {
                        return Ok(REWORK.to_string());
                    }
                }
                return Ok(PASS.to_string());
            }
            write_reel_if_assembly(req);
            Ok(r#"{"ok": true}"#.to_string())
        });
    }

    let item = h.item(RUN, "https://example.com/v/1", "standard");
    h.runner.run(&item).await.unwrap();

    let tags = h.event_tags(RUN);
    let reworked_at = tags
        .iter()
        .position(|t| t == "qa.gate_reworked@TRANSCRIPT")
        .unwrap();
    let passed_at = tags
        .iter()
        .position(|t| t == "qa.gate_passed@TRANSCRIPT")
        .unwrap();
    assert!(reworked_at < passed_at);

    // The recovery chain was never engaged.
    assert!(!tags.iter().any(|t| t.starts_with("recovery.")));

    // The rework consumed a second attempt at TRANSCRIPT.
    let state = h
        .store
        .load_state(&reel_core::RunId::new(RUN))
        .unwrap()
        .unwrap();
    assert_eq!(state.attempts[&reel_core::PipelineStage::Transcript], 2);
}
