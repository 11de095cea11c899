// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incoming reel requests.

use crate::stage::PipelineStage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Optional knobs a requester may attach to a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directives {
    /// Target duration of the final reel, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_duration_s: Option<u32>,
    /// Requested number of narrative segments ("moments").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<u32>,
    /// Explicit workspace to resume from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<PathBuf>,
    /// Explicit stage override for resume (one-based position).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_stage: Option<usize>,
    /// Free-form advisory inputs forwarded to the agents.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub advisory: BTreeMap<String, String>,
}

impl Directives {
    /// Stage the run should start from, when explicitly overridden.
    pub fn start_stage_override(&self) -> Option<PipelineStage> {
        self.start_stage.and_then(PipelineStage::at_position)
    }
}

/// One job for the pipeline: a source URL plus requester context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub source_url: String,
    #[serde(default)]
    pub message_text: String,
    #[serde(default)]
    pub directives: Directives,
}

impl Request {
    pub fn new(source_url: impl Into<String>, message_text: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            message_text: message_text.into(),
            directives: Directives::default(),
        }
    }

    /// Stable fingerprint of the originating request.
    ///
    /// Recorded in the run state so a resumed run can be matched back to
    /// the request that produced it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_url.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.message_text.as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(16);
        for byte in &digest[..8] {
            hex.push_str(&format!("{byte:02x}"));
        }
        hex
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
