// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[test]
fn fresh_state_resumes_at_router() {
    let state = RunState::new("cafe", at(0));
    assert_eq!(state.resume_point(), Some(PipelineStage::Router));
    assert!(state.is_incomplete());
}

#[test]
fn resume_point_is_first_uncompleted_stage() {
    let mut state = RunState::new("cafe", at(0));
    state.complete_stage(PipelineStage::Router, PipelineStage::Router.next(), at(1));
    state.complete_stage(PipelineStage::Research, PipelineStage::Research.next(), at(2));
    assert_eq!(state.resume_point(), Some(PipelineStage::Transcript));
    assert_eq!(state.stage, PipelineStage::Transcript);
}

#[test]
fn all_but_last_completed_resumes_at_the_last() {
    let mut state = RunState::new("cafe", at(0));
    for stage in &PipelineStage::SEQUENCE[..PipelineStage::COUNT - 1] {
        state.complete_stage(*stage, stage.next(), at(1));
    }
    assert_eq!(state.resume_point(), Some(PipelineStage::Delivery));
}

#[test]
fn terminal_completion_leaves_no_resume_work() {
    let mut state = RunState::new("cafe", at(0));
    for stage in PipelineStage::SEQUENCE {
        state.complete_stage(stage, stage.next(), at(1));
    }
    assert_eq!(state.resume_point(), None);
    assert!(!state.is_incomplete());
}

#[test]
fn attempts_accumulate_per_stage() {
    let mut state = RunState::new("cafe", at(0));
    assert_eq!(state.record_attempt(PipelineStage::Content, at(1)), 1);
    assert_eq!(state.record_attempt(PipelineStage::Content, at(2)), 2);
    assert_eq!(state.record_attempt(PipelineStage::Router, at(3)), 1);
    assert_eq!(state.updated_at, at(3));
}

#[test]
fn updated_at_moves_forward_on_completion() {
    let mut state = RunState::new("cafe", at(0));
    state.complete_stage(PipelineStage::Router, PipelineStage::Router.next(), at(42));
    assert_eq!(state.updated_at, at(42));
}
