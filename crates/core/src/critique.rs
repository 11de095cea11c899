// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! QA critique payloads.
//!
//! Critics answer in JSON, but the text around the JSON is not under our
//! control; models wrap answers in prose or code fences. [`QaCritique::parse`]
//! digs the first JSON object out of the reply; callers map a parse miss to a
//! synthetic rework rather than failing the stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The critic's verdict on a stage's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QaDecision {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "REWORK")]
    Rework,
    #[serde(rename = "FAIL")]
    Fail,
}

impl fmt::Display for QaDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QaDecision::Pass => "PASS",
            QaDecision::Rework => "REWORK",
            QaDecision::Fail => "FAIL",
        };
        f.write_str(s)
    }
}

/// Structured judgement returned by the QA critic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaCritique {
    pub decision: QaDecision,
    /// Telemetry only; plays no role in gating.
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub blockers: Vec<String>,
    #[serde(default)]
    pub prescriptive_fixes: Vec<String>,
}

impl QaCritique {
    /// A critique that approves without remarks.
    pub fn pass(score: u8) -> Self {
        Self {
            decision: QaDecision::Pass,
            score,
            blockers: Vec::new(),
            prescriptive_fixes: Vec::new(),
        }
    }

    /// The synthetic rework used when a critic's reply cannot be parsed.
    pub fn malformed_reply() -> Self {
        Self {
            decision: QaDecision::Rework,
            score: 0,
            blockers: vec!["critique reply was not valid JSON".to_string()],
            prescriptive_fixes: vec!["restate output in the declared schema".to_string()],
        }
    }

    /// Extract a critique from raw critic output.
    ///
    /// Scans for the first balanced `{...}` object and deserializes it.
    /// Returns `None` when no parseable object is present or the object
    /// does not match the schema.
    pub fn parse(reply: &str) -> Option<Self> {
        let candidate = first_json_object(reply)?;
        serde_json::from_str(candidate).ok()
    }
}

/// Slice out the first balanced top-level JSON object in `text`.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "critique_tests.rs"]
mod tests;
