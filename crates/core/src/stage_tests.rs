// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn sequence_is_ordered_and_complete() {
    assert_eq!(PipelineStage::COUNT, 9);
    for (i, stage) in PipelineStage::SEQUENCE.iter().enumerate() {
        assert_eq!(stage.index(), i);
    }
}

#[test]
fn next_walks_the_sequence() {
    assert_eq!(PipelineStage::Router.next(), Some(PipelineStage::Research));
    assert_eq!(
        PipelineStage::FfmpegEngineer.next(),
        Some(PipelineStage::SidegenAwait)
    );
    assert_eq!(PipelineStage::Delivery.next(), None);
}

#[test]
fn only_delivery_is_terminal() {
    for stage in PipelineStage::SEQUENCE {
        assert_eq!(stage.is_terminal(), stage == PipelineStage::Delivery);
    }
}

#[test]
fn await_gate_and_delivery_are_not_agent_stages() {
    assert!(!PipelineStage::SidegenAwait.is_agent_stage());
    assert!(!PipelineStage::Delivery.is_agent_stage());
    assert!(PipelineStage::Router.is_agent_stage());
    assert!(PipelineStage::Assembly.is_agent_stage());
}

#[parameterized(
    router = { PipelineStage::Router, "ROUTER" },
    layout = { PipelineStage::LayoutDetective, "LAYOUT_DETECTIVE" },
    sidegen = { PipelineStage::SidegenAwait, "SIDEGEN_AWAIT" },
    delivery = { PipelineStage::Delivery, "DELIVERY" },
)]
fn display_and_parse_round_trip(stage: PipelineStage, name: &str) {
    assert_eq!(stage.to_string(), name);
    assert_eq!(name.parse::<PipelineStage>().unwrap(), stage);
}

#[test]
fn parse_rejects_unknown_names() {
    assert!("UPLOAD".parse::<PipelineStage>().is_err());
}

#[test]
fn at_position_is_one_based() {
    assert_eq!(PipelineStage::at_position(0), None);
    assert_eq!(PipelineStage::at_position(1), Some(PipelineStage::Router));
    assert_eq!(PipelineStage::at_position(9), Some(PipelineStage::Delivery));
    assert_eq!(PipelineStage::at_position(10), None);
}

#[test]
fn serde_uses_wire_names() {
    let json = serde_json::to_string(&PipelineStage::FfmpegEngineer).unwrap();
    assert_eq!(json, "\"FFMPEG_ENGINEER\"");
    let back: PipelineStage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, PipelineStage::FfmpegEngineer);
}
