// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-run state: the state-store port and its filesystem
//! implementation.
//!
//! Saves are full rewrites of `run.md` through the atomic writer, so a
//! crash mid-save leaves the previous document intact. Events are
//! journal appends to `events.log`.

use crate::atomic::{append_line, write_atomic};
use crate::rundoc::RunDoc;
use reel_core::{PipelineEvent, RunId, RunState};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors from state-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persistence contract the engine checkpoints through.
pub trait StateStore: Send + Sync {
    fn save_state(&self, run: &RunId, state: &RunState) -> Result<(), StoreError>;
    fn load_state(&self, run: &RunId) -> Result<Option<RunState>, StoreError>;
    fn append_event(&self, run: &RunId, event: &PipelineEvent) -> Result<(), StoreError>;
    /// Append one prose line to the run document's body.
    fn append_note(&self, run: &RunId, note: &str) -> Result<(), StoreError>;
    fn list_incomplete_runs(&self) -> Result<Vec<(RunId, RunState)>, StoreError>;
}

/// Filesystem state store rooted at the workspace runs directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    runs_root: PathBuf,
}

impl CheckpointStore {
    pub fn new(runs_root: impl Into<PathBuf>) -> Self {
        Self {
            runs_root: runs_root.into(),
        }
    }

    pub fn runs_root(&self) -> &Path {
        &self.runs_root
    }

    pub fn run_dir(&self, run: &RunId) -> PathBuf {
        self.runs_root.join(run.as_str())
    }

    fn run_doc_path(&self, run: &RunId) -> PathBuf {
        self.run_dir(run).join("run.md")
    }

    fn events_path(&self, run: &RunId) -> PathBuf {
        self.run_dir(run).join("events.log")
    }

    fn load_doc(&self, run: &RunId) -> Result<RunDoc, StoreError> {
        let path = self.run_doc_path(run);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(RunDoc::parse(&text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(RunDoc::parse("")),
            Err(err) => Err(err.into()),
        }
    }
}

impl StateStore for CheckpointStore {
    fn save_state(&self, run: &RunId, state: &RunState) -> Result<(), StoreError> {
        let mut doc = self.load_doc(run)?;
        doc.state = Some(state.clone());
        write_atomic(&self.run_doc_path(run), doc.render().as_bytes())?;
        Ok(())
    }

    fn load_state(&self, run: &RunId) -> Result<Option<RunState>, StoreError> {
        Ok(self.load_doc(run)?.state)
    }

    fn append_event(&self, run: &RunId, event: &PipelineEvent) -> Result<(), StoreError> {
        append_line(&self.events_path(run), event.journal_line().as_bytes())?;
        Ok(())
    }

    fn append_note(&self, run: &RunId, note: &str) -> Result<(), StoreError> {
        let mut doc = self.load_doc(run)?;
        doc.append_note(note);
        write_atomic(&self.run_doc_path(run), doc.render().as_bytes())?;
        Ok(())
    }

    fn list_incomplete_runs(&self) -> Result<Vec<(RunId, RunState)>, StoreError> {
        let mut incomplete = Vec::new();
        let entries = match std::fs::read_dir(&self.runs_root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(incomplete),
            Err(err) => return Err(err.into()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let run = RunId::new(entry.file_name().to_string_lossy().to_string());
            match self.load_state(&run)? {
                Some(state) if state.is_incomplete() => incomplete.push((run, state)),
                Some(_) => {}
                None => {
                    // Damaged or empty run document: nothing to resume
                    // from, but never delete. The artifacts may still
                    // matter to someone.
                    warn!(run_id = %run, "run document unreadable, skipping for resume");
                }
            }
        }
        incomplete.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(incomplete)
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
