//! Scenario: the process died after ROUTER and RESEARCH completed. On
//! restart the planner announces one resume from TRANSCRIPT and the
//! pipeline continues from there.

use crate::prelude::*;
use chrono::{TimeZone, Utc};
use reel_core::{PipelineStage, RunId, RunState};
use reel_engine::CrashRecoveryPlanner;
use reel_storage::StateStore;
use std::sync::Arc;

const RUN: &str = "20240101-120000-000000-cafe4001";

fn crashed_state(h: &Harness) -> RunState {
    let item = h.item(RUN, "https://example.com/v/1", "standard");
    let mut state = RunState::new(
        item.request.fingerprint(),
        Utc.timestamp_opt(1_704_110_400, 0).unwrap(),
    );
    for stage in [PipelineStage::Router, PipelineStage::Research] {
        state.complete_stage(
            stage,
            stage.next(),
            Utc.timestamp_opt(1_704_110_500, 0).unwrap(),
        );
    }
    state
}

#[tokio::test]
async fn restart_resumes_from_the_first_uncompleted_stage() {
    let h = harness();
    wire_default_fleet(&h.dispatch);
    let run_id = RunId::new(RUN);
    h.store.save_state(&run_id, &crashed_state(&h)).unwrap();

    // Startup: the planner inspects unfinished runs.
    let planner = CrashRecoveryPlanner::new(Arc::clone(&h.store), Some(h.messaging.clone()));
    let plans = planner.plan_all().await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].resume_from, PipelineStage::Transcript);

    // Exactly one resume_planned event, naming TRANSCRIPT.
    let planned: Vec<String> = h
        .event_tags(RUN)
        .into_iter()
        .filter(|t| t.starts_with("recovery.resume_planned@"))
        .collect();
    assert_eq!(planned, vec!["recovery.resume_planned@TRANSCRIPT".to_string()]);

    // Exactly one resume notification.
    let notifications = h.messaging.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0],
        "Resuming your run from TRANSCRIPT (2 of 9 stages completed)"
    );

    // The re-claimed item resumes from TRANSCRIPT onward.
    let item = h.item(RUN, "https://example.com/v/1", "standard");
    h.runner.run(&item).await.unwrap();

    let entered: Vec<String> = h
        .event_tags(RUN)
        .into_iter()
        .filter(|t| t.starts_with("pipeline.stage_entered@"))
        .collect();
    assert_eq!(entered[0], "pipeline.stage_entered@TRANSCRIPT");
    assert!(!entered.contains(&"pipeline.stage_entered@ROUTER".to_string()));
    assert_eq!(entered.len(), PipelineStage::COUNT - 2);

    let state = h.store.load_state(&run_id).unwrap().unwrap();
    assert!(!state.is_incomplete());
}
