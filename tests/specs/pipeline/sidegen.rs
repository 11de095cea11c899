//! Scenarios: side-generation retriability at the await-gate.

use crate::prelude::*;
use reel_adapters::{DispatchRequest, FakeGenBehavior};
use reel_core::{SideGenJobs, SideGenStatus};

/// Content agent requesting two clips; QA passes; assembly writes the
/// reel.
fn wire_fleet_with_clips(h: &Harness, variants: &[&str]) {
    let prompts: Vec<String> = variants
        .iter()
        .map(|v| format!(r#"{{"variant": "{v}", "text": "b-roll for {v}"}}"#))
        .collect();
    let content_reply = format!(r#"{{"sidegen_prompts": [{}]}}"#, prompts.join(", "));
    h.dispatch.set_handler(move |req: &DispatchRequest| {
        if req.prompt.contains("QA gate") {
            return Ok(PASS.to_string());
        }
        if req.prompt.contains("Write your result to content.json") {
            return Ok(content_reply.clone());
        }
        write_reel_if_assembly(req);
        Ok(r#"{"ok": true}"#.to_string())
    });
}

fn gate_events(h: &Harness, run: &str) -> Vec<String> {
    h.event_tags(run)
        .into_iter()
        .filter(|t| t.starts_with("sidegen."))
        .collect()
}

fn jobs_file(h: &Harness, run: &str) -> SideGenJobs {
    let path = h
        .dir
        .path()
        .join(format!("workspace/runs/{run}/sidegen/jobs.json"));
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn uniformly_retriable_failures_fire_exactly_one_retry() {
    const RUN: &str = "20240101-120000-000000-cafe5001";
    let h = harness();
    wire_fleet_with_clips(&h, &["hook", "outro"]);
    for variant in ["hook", "outro"] {
        h.generation.set_behavior(
            format!("{RUN}_{variant}"),
            FakeGenBehavior::FailOnPoll("rate limit exceeded".to_string()),
        );
    }

    let item = h.item(RUN, "https://example.com/v/1", "standard");
    h.runner.run(&item).await.unwrap();

    let gate = gate_events(&h, RUN);
    let retries = gate.iter().filter(|t| t.contains("gate_retried")).count();
    assert_eq!(retries, 1);
    // The gate still completed (without clips) after the single retry.
    assert!(gate.iter().any(|t| t.contains("gate_completed")));
    // gate_started precedes the retry and the completion.
    let started = gate.iter().position(|t| t.contains("gate_started")).unwrap();
    let retried = gate.iter().position(|t| t.contains("gate_retried")).unwrap();
    assert!(started < retried);

    // Both failed jobs were re-submitted once, under their original keys.
    let resubmits: Vec<String> = h
        .generation
        .submissions()
        .into_iter()
        .filter(|k| k.starts_with(RUN))
        .collect();
    // 2 initial submissions + 2 retry submissions.
    assert_eq!(resubmits.len(), 4);

    // The run carried on to delivery regardless.
    assert_eq!(h.messaging.sent_files().len(), 1);
}

#[tokio::test]
async fn permanent_failure_in_the_mix_disables_the_retry() {
    const RUN: &str = "20240101-120000-000000-cafe5002";
    let h = harness();
    wire_fleet_with_clips(&h, &["hook", "broll", "outro"]);
    h.generation.set_behavior(
        format!("{RUN}_hook"),
        FakeGenBehavior::CompleteAfter(0),
    );
    h.generation.set_behavior(
        format!("{RUN}_broll"),
        FakeGenBehavior::FailGeneration("invalid argument: unsupported duration".to_string()),
    );
    h.generation.set_behavior(
        format!("{RUN}_outro"),
        FakeGenBehavior::FailOnPoll("rate limit exceeded".to_string()),
    );

    let item = h.item(RUN, "https://example.com/v/1", "standard");
    h.runner.run(&item).await.unwrap();

    let gate = gate_events(&h, RUN);
    assert!(!gate.iter().any(|t| t.contains("gate_retried")));
    assert!(gate.iter().any(|t| t.contains("gate_completed")));

    // The one available clip came through; the failures are recorded.
    let jobs = jobs_file(&h, RUN);
    assert_eq!(jobs.completed().count(), 1);
    assert_eq!(jobs.failed().count(), 2);
    let clip = h
        .dir
        .path()
        .join(format!("workspace/runs/{RUN}/sidegen/hook.mp4"));
    assert!(clip.exists());
}

#[tokio::test]
async fn rerunning_the_gate_after_a_crash_classifies_identically() {
    const RUN: &str = "20240101-120000-000000-cafe5003";
    let h = harness();
    wire_fleet_with_clips(&h, &["hook", "broll"]);
    h.generation.set_behavior(
        format!("{RUN}_hook"),
        FakeGenBehavior::CompleteAfter(0),
    );
    h.generation.set_behavior(
        format!("{RUN}_broll"),
        FakeGenBehavior::FailGeneration("invalid argument: bad prompt".to_string()),
    );

    let item = h.item(RUN, "https://example.com/v/1", "standard");
    h.runner.run(&item).await.unwrap();
    let first = jobs_file(&h, RUN);

    // Crash between the gate and delivery: re-running the await stage
    // against the same jobs file must not change any terminal status.
    let mut rerun = h.item(RUN, "https://example.com/v/1", "standard");
    rerun.request.directives.start_stage = Some(7); // SIDEGEN_AWAIT
    h.runner.run(&rerun).await.unwrap();
    let second = jobs_file(&h, RUN);

    assert_eq!(first.completed().count(), second.completed().count());
    for (a, b) in first.jobs.iter().zip(&second.jobs) {
        assert_eq!(a.status, b.status);
        assert_ne!(a.status, SideGenStatus::Pending);
    }
}
