// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `run.md` document: RunState front matter plus a prose journal.
//!
//! The front matter is a `key: value` block between `---` delimiter
//! lines, one field per line; everything after the closing delimiter is
//! free-form body text. The parser tolerates partial or empty documents
//! (absent state) and preserves unknown keys verbatim when rewriting, so
//! a newer daemon never strips fields written by an older one.

use chrono::{DateTime, Utc};
use reel_core::stage::PipelineStage;
use reel_core::RunState;
use std::collections::BTreeMap;
use std::fmt::Write as _;

const DELIMITER: &str = "---";

const KEY_STAGE: &str = "stage";
const KEY_COMPLETED: &str = "stages_completed";
const KEY_UPDATED: &str = "updated_at";
const KEY_FINGERPRINT: &str = "request_fingerprint";
const KEY_ATTEMPTS: &str = "attempts";

/// Parsed form of a workspace's `run.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDoc {
    /// `None` when the document is missing, empty, or too damaged to
    /// yield a state (the absent-state marker).
    pub state: Option<RunState>,
    /// Unknown front-matter keys, preserved in encounter order.
    pub extras: Vec<(String, String)>,
    /// Free-form progress notes.
    pub body: String,
}

impl RunDoc {
    pub fn with_state(state: RunState) -> Self {
        Self {
            state: Some(state),
            extras: Vec::new(),
            body: String::new(),
        }
    }

    /// Parse a document, tolerating damage.
    ///
    /// A document that does not open with the front-matter delimiter, or
    /// whose required fields are missing or unparseable, yields
    /// `state: None` with whatever body text was present.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines();
        match lines.next() {
            Some(line) if line.trim() == DELIMITER => {}
            _ => {
                return Self {
                    state: None,
                    extras: Vec::new(),
                    body: text.to_string(),
                }
            }
        }

        let mut fields: Vec<(String, String)> = Vec::new();
        let mut closed = false;
        for line in lines.by_ref() {
            if line.trim() == DELIMITER {
                closed = true;
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                fields.push((key.trim().to_string(), value.trim().to_string()));
            }
        }
        let body: String = if closed {
            let rest: Vec<&str> = lines.collect();
            rest.join("\n")
        } else {
            String::new()
        };

        let mut extras = Vec::new();
        let mut stage = None;
        let mut completed = None;
        let mut updated_at = None;
        let mut fingerprint = None;
        let mut attempts = BTreeMap::new();
        for (key, value) in fields {
            match key.as_str() {
                KEY_STAGE => stage = value.parse::<PipelineStage>().ok(),
                KEY_COMPLETED => completed = parse_completed(&value),
                KEY_UPDATED => {
                    updated_at = DateTime::parse_from_rfc3339(&value)
                        .ok()
                        .map(|t| t.with_timezone(&Utc))
                }
                KEY_FINGERPRINT => fingerprint = Some(value),
                KEY_ATTEMPTS => attempts = parse_attempts(&value),
                _ => extras.push((key, value)),
            }
        }

        let state = match (stage, completed, updated_at, fingerprint) {
            (Some(stage), Some(stages_completed), Some(updated_at), Some(request_fingerprint)) => {
                Some(RunState {
                    stage,
                    stages_completed,
                    updated_at,
                    request_fingerprint,
                    attempts,
                })
            }
            _ => None,
        };

        Self { state, extras, body }
    }

    /// Render the document back to text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(DELIMITER);
        out.push('\n');
        if let Some(state) = &self.state {
            let _ = writeln!(out, "{KEY_STAGE}: {}", state.stage);
            let completed: Vec<&str> = state
                .stages_completed
                .iter()
                .map(PipelineStage::as_str)
                .collect();
            let _ = writeln!(out, "{KEY_COMPLETED}: {}", completed.join(", "));
            // Microsecond precision, matching the event journal; anything
            // coarser would corrupt updated_at across a save/load cycle.
            let _ = writeln!(
                out,
                "{KEY_UPDATED}: {}",
                state
                    .updated_at
                    .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
            );
            let _ = writeln!(out, "{KEY_FINGERPRINT}: {}", state.request_fingerprint);
            if !state.attempts.is_empty() {
                let attempts: Vec<String> = state
                    .attempts
                    .iter()
                    .map(|(stage, count)| format!("{stage}={count}"))
                    .collect();
                let _ = writeln!(out, "{KEY_ATTEMPTS}: {}", attempts.join(", "));
            }
        }
        for (key, value) in &self.extras {
            let _ = writeln!(out, "{key}: {value}");
        }
        out.push_str(DELIMITER);
        out.push('\n');
        if !self.body.is_empty() {
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    /// Append one progress note line to the body.
    pub fn append_note(&mut self, note: &str) {
        if !self.body.is_empty() && !self.body.ends_with('\n') {
            self.body.push('\n');
        }
        self.body.push_str(note);
        self.body.push('\n');
    }
}

fn parse_completed(value: &str) -> Option<indexmap::IndexSet<PipelineStage>> {
    let mut set = indexmap::IndexSet::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        set.insert(part.parse::<PipelineStage>().ok()?);
    }
    Some(set)
}

fn parse_attempts(value: &str) -> BTreeMap<PipelineStage, u32> {
    let mut attempts = BTreeMap::new();
    for part in value.split(',') {
        if let Some((stage, count)) = part.trim().split_once('=') {
            if let (Ok(stage), Ok(count)) = (stage.trim().parse(), count.trim().parse()) {
                attempts.insert(stage, count);
            }
        }
    }
    attempts
}

#[cfg(test)]
#[path = "rundoc_tests.rs"]
mod tests;
