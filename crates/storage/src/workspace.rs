// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run workspace directories.
//!
//! Each run owns `workspace/runs/<run_id>/` exclusively (the queue claim
//! enforces the ownership). Acquisition creates the directory; nothing
//! here ever deletes contents; retention is a separate concern.

use reel_core::RunId;
use std::io;
use std::path::{Path, PathBuf};

/// Manager for the runs root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    runs_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(runs_root: impl Into<PathBuf>) -> Self {
        Self {
            runs_root: runs_root.into(),
        }
    }

    pub fn runs_root(&self) -> &Path {
        &self.runs_root
    }

    /// Acquire the workspace for `run_id`, creating it if absent.
    pub fn acquire(&self, run_id: &RunId) -> io::Result<Workspace> {
        let path = self.runs_root.join(run_id.as_str());
        std::fs::create_dir_all(&path)?;
        Ok(Workspace {
            run_id: run_id.clone(),
            path,
        })
    }

    /// All existing run workspaces, sorted (run ids sort chronologically).
    pub fn list_workspaces(&self) -> io::Result<Vec<RunId>> {
        let mut runs = Vec::new();
        let entries = match std::fs::read_dir(&self.runs_root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(runs),
            Err(err) => return Err(err),
        };
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                runs.push(RunId::new(entry.file_name().to_string_lossy().to_string()));
            }
        }
        runs.sort();
        Ok(runs)
    }
}

/// Handle to one run's directory. Path helpers only; file writes go
/// through the atomic store.
#[derive(Debug, Clone)]
pub struct Workspace {
    run_id: RunId,
    path: PathBuf,
}

impl Workspace {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_doc(&self) -> PathBuf {
        self.path.join("run.md")
    }

    pub fn events_log(&self) -> PathBuf {
        self.path.join("events.log")
    }

    /// Per-stage artifact document, e.g. `content.json`.
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn sidegen_dir(&self) -> PathBuf {
        self.path.join("sidegen")
    }

    pub fn sidegen_jobs(&self) -> PathBuf {
        self.sidegen_dir().join("jobs.json")
    }

    /// Download target for a generated clip.
    pub fn sidegen_clip(&self, variant: &str) -> PathBuf {
        self.sidegen_dir().join(format!("{variant}.mp4"))
    }

    pub fn final_reel(&self) -> PathBuf {
        self.path.join("final-reel.mp4")
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
