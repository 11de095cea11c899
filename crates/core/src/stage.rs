// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ordered pipeline stage enumeration.
//!
//! Stages run strictly in declaration order. `SidegenAwait` is a
//! non-agent stage (handled by the await-gate) and `Delivery` bypasses
//! the agent/QA machinery entirely.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One bounded step of the reel pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    #[serde(rename = "ROUTER")]
    Router,
    #[serde(rename = "RESEARCH")]
    Research,
    #[serde(rename = "TRANSCRIPT")]
    Transcript,
    #[serde(rename = "CONTENT")]
    Content,
    #[serde(rename = "LAYOUT_DETECTIVE")]
    LayoutDetective,
    #[serde(rename = "FFMPEG_ENGINEER")]
    FfmpegEngineer,
    #[serde(rename = "SIDEGEN_AWAIT")]
    SidegenAwait,
    #[serde(rename = "ASSEMBLY")]
    Assembly,
    #[serde(rename = "DELIVERY")]
    Delivery,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const SEQUENCE: [PipelineStage; 9] = [
        PipelineStage::Router,
        PipelineStage::Research,
        PipelineStage::Transcript,
        PipelineStage::Content,
        PipelineStage::LayoutDetective,
        PipelineStage::FfmpegEngineer,
        PipelineStage::SidegenAwait,
        PipelineStage::Assembly,
        PipelineStage::Delivery,
    ];

    /// Number of stages in the pipeline.
    pub const COUNT: usize = Self::SEQUENCE.len();

    /// Zero-based position in the sequence.
    pub fn index(&self) -> usize {
        match self {
            PipelineStage::Router => 0,
            PipelineStage::Research => 1,
            PipelineStage::Transcript => 2,
            PipelineStage::Content => 3,
            PipelineStage::LayoutDetective => 4,
            PipelineStage::FfmpegEngineer => 5,
            PipelineStage::SidegenAwait => 6,
            PipelineStage::Assembly => 7,
            PipelineStage::Delivery => 8,
        }
    }

    /// Stage at a one-based position (CLI `--start-stage` numbering).
    pub fn at_position(position: usize) -> Option<PipelineStage> {
        if position == 0 {
            return None;
        }
        Self::SEQUENCE.get(position - 1).copied()
    }

    /// The stage that follows this one, if any.
    pub fn next(&self) -> Option<PipelineStage> {
        Self::SEQUENCE.get(self.index() + 1).copied()
    }

    /// The final stage completes the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Delivery)
    }

    /// Whether this stage runs an agent behind a QA gate.
    ///
    /// The await-gate stage only watches side-generation records, and
    /// delivery hands the finished artifacts to the delivery collaborator.
    pub fn is_agent_stage(&self) -> bool {
        !matches!(self, PipelineStage::SidegenAwait | PipelineStage::Delivery)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Router => "ROUTER",
            PipelineStage::Research => "RESEARCH",
            PipelineStage::Transcript => "TRANSCRIPT",
            PipelineStage::Content => "CONTENT",
            PipelineStage::LayoutDetective => "LAYOUT_DETECTIVE",
            PipelineStage::FfmpegEngineer => "FFMPEG_ENGINEER",
            PipelineStage::SidegenAwait => "SIDEGEN_AWAIT",
            PipelineStage::Assembly => "ASSEMBLY",
            PipelineStage::Delivery => "DELIVERY",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SEQUENCE
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

/// Error returned when parsing an unrecognised stage name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pipeline stage: {0}")]
pub struct UnknownStage(pub String);

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
