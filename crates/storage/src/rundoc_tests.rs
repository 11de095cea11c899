// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn sample_state() -> RunState {
    let mut state = RunState::new("cafebabe", Utc.timestamp_opt(1_704_110_400, 0).unwrap());
    state.complete_stage(
        PipelineStage::Router,
        PipelineStage::Router.next(),
        Utc.timestamp_opt(1_704_110_460, 0).unwrap(),
    );
    state.record_attempt(
        PipelineStage::Research,
        Utc.timestamp_opt(1_704_110_520, 0).unwrap(),
    );
    state
}

#[test]
fn state_round_trips_through_render_and_parse() {
    let state = sample_state();
    let doc = RunDoc::with_state(state.clone());
    let parsed = RunDoc::parse(&doc.render());
    assert_eq!(parsed.state, Some(state));
}

#[test]
fn subsecond_timestamps_survive_the_round_trip() {
    // Production timestamps come from Utc::now() and carry sub-second
    // precision; a whole-second render would shift updated_at on reload.
    let mut state = sample_state();
    state.updated_at = Utc.timestamp_opt(1_704_110_520, 123_456_000).unwrap();
    let doc = RunDoc::with_state(state.clone());
    let rendered = doc.render();
    assert!(rendered.contains("updated_at: 2024-01-01T12:02:00.123456Z"));
    let parsed = RunDoc::parse(&rendered);
    assert_eq!(parsed.state, Some(state));
}

#[test]
fn unknown_keys_survive_a_rewrite() {
    let text = "---\nstage: RESEARCH\nstages_completed: ROUTER\nupdated_at: 2024-01-01T12:01:00Z\nrequest_fingerprint: cafebabe\noperator_note: keep an eye on this one\n---\nResearch started.\n";
    let mut doc = RunDoc::parse(text);
    assert_eq!(
        doc.extras,
        vec![("operator_note".to_string(), "keep an eye on this one".to_string())]
    );

    // Rewrite with an updated state; the extra key and body must survive.
    if let Some(state) = doc.state.as_mut() {
        state.record_attempt(
            PipelineStage::Research,
            Utc.timestamp_opt(1_704_110_520, 0).unwrap(),
        );
    }
    let rendered = doc.render();
    assert!(rendered.contains("operator_note: keep an eye on this one"));
    assert!(rendered.contains("Research started."));
}

#[test]
fn empty_document_is_absent_state() {
    let doc = RunDoc::parse("");
    assert_eq!(doc.state, None);
}

#[test]
fn document_without_front_matter_is_absent_state_with_body() {
    let doc = RunDoc::parse("just some notes\n");
    assert_eq!(doc.state, None);
    assert_eq!(doc.body, "just some notes\n");
}

#[test]
fn missing_required_field_is_absent_state_but_extras_kept() {
    let text = "---\nstage: ROUTER\noperator_note: hello\n---\n";
    let doc = RunDoc::parse(text);
    assert_eq!(doc.state, None);
    assert_eq!(doc.extras.len(), 1);
}

#[test]
fn unterminated_front_matter_is_tolerated() {
    let text = "---\nstage: ROUTER\nstages_completed:\n";
    let doc = RunDoc::parse(text);
    assert_eq!(doc.state, None);
    assert_eq!(doc.body, "");
}

#[test]
fn empty_completed_list_parses_as_empty_set() {
    let text = "---\nstage: ROUTER\nstages_completed:\nupdated_at: 2024-01-01T12:00:00Z\nrequest_fingerprint: cafe\n---\n";
    let doc = RunDoc::parse(text);
    let state = doc.state.unwrap();
    assert!(state.stages_completed.is_empty());
    assert_eq!(state.stage, PipelineStage::Router);
}

#[test]
fn append_note_grows_the_body() {
    let mut doc = RunDoc::with_state(sample_state());
    doc.append_note("2024-01-01 ROUTER passed QA (score 90)");
    doc.append_note("2024-01-01 RESEARCH entered");
    let rendered = doc.render();
    let body = rendered.split("---\n").nth(2).unwrap();
    assert_eq!(body.lines().count(), 2);
}

#[test]
fn attempts_render_as_stage_equals_count() {
    let doc = RunDoc::with_state(sample_state());
    assert!(doc.render().contains("attempts: RESEARCH=1"));
}
