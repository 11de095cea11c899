// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed FIFO queue with exclusive claim semantics.
//!
//! Items live as JSON documents in one of three sibling directories:
//! `inbox/` (waiting), `processing/` (claimed), `completed/` (done).
//! An item moves between directories with a single rename, so at any
//! observable instant it is in exactly one of them. Claims are guarded
//! by advisory locks on companion `.lock` files; a lock left behind by
//! a crashed process does not block reclaim, because the fresh OS-level
//! lock attempt on the same path simply succeeds.

use crate::atomic::write_atomic;
use fs2::FileExt;
use reel_core::QueueItem;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

const LOCK_SUFFIX: &str = ".lock";

/// Errors from queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The three-directory queue under a single root.
#[derive(Debug, Clone)]
pub struct Queue {
    inbox: PathBuf,
    processing: PathBuf,
    completed: PathBuf,
}

impl Queue {
    /// Open (and create if needed) the queue directories under `root`.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        let queue = Self {
            inbox: root.join("inbox"),
            processing: root.join("processing"),
            completed: root.join("completed"),
        };
        fs::create_dir_all(&queue.inbox)?;
        fs::create_dir_all(&queue.processing)?;
        fs::create_dir_all(&queue.completed)?;
        Ok(queue)
    }

    pub fn inbox_dir(&self) -> &Path {
        &self.inbox
    }

    /// Write a new item into the inbox.
    pub fn enqueue(&self, item: &QueueItem) -> Result<PathBuf, QueueError> {
        let path = self.inbox.join(item.filename());
        let bytes = serde_json::to_vec_pretty(item)?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Claim the oldest unclaimed inbox item, if any.
    ///
    /// Candidates are visited in lexicographic filename order, which is
    /// submission order by construction. Locked candidates are skipped;
    /// unparseable candidates are left in place with a log entry and
    /// never silently dropped.
    pub fn claim_next(&self) -> Result<Option<ClaimedItem>, QueueError> {
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.inbox)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();

        for name in names {
            let item_path = self.inbox.join(&name);
            let lock_path = self.inbox.join(format!("{name}{LOCK_SUFFIX}"));
            let lock_file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)?;

            let attempt = self.try_claim(&lock_file, &item_path, &name);

            // Finally: never leave an orphan lock behind.
            let _ = FileExt::unlock(&lock_file);
            let _ = fs::remove_file(&lock_path);

            match attempt {
                Ok(Some(claimed)) => return Ok(Some(claimed)),
                Ok(None) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Return every item parked in `processing/` to the inbox.
    ///
    /// Run once at daemon startup: an item can only be parked there by a
    /// process that died mid-run, and its run resumes from the workspace
    /// checkpoint once the item is claimed again.
    pub fn recover_processing(&self) -> Result<usize, QueueError> {
        let mut recovered = 0;
        for entry in fs::read_dir(&self.processing)? {
            let entry = entry?;
            let name = entry.file_name();
            fs::rename(entry.path(), self.inbox.join(&name))?;
            recovered += 1;
        }
        if recovered > 0 {
            warn!(count = recovered, "returned orphaned processing items to inbox");
        }
        Ok(recovered)
    }

    fn try_claim(
        &self,
        lock_file: &fs::File,
        item_path: &Path,
        name: &str,
    ) -> Result<Option<ClaimedItem>, QueueError> {
        if lock_file.try_lock_exclusive().is_err() {
            // Another consumer holds this candidate.
            return Ok(None);
        }
        let text = match fs::read_to_string(item_path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                // Claimed and renamed away between listing and locking.
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let item: QueueItem = match serde_json::from_str(&text) {
            Ok(item) => item,
            Err(err) => {
                warn!(file = %item_path.display(), error = %err, "unparseable queue item, leaving in inbox");
                return Ok(None);
            }
        };
        let processing_path = self.processing.join(name);
        fs::rename(item_path, &processing_path)?;
        Ok(Some(ClaimedItem {
            item,
            name: name.to_string(),
            inbox: self.inbox.clone(),
            processing: self.processing.clone(),
            completed: self.completed.clone(),
        }))
    }
}

/// An exclusively-claimed queue item.
///
/// The claim must be disposed exactly one way: [`commit`](Self::commit)
/// on success or [`release`](Self::release) to hand the item back for a
/// later claim. A claim that is merely dropped leaves the item parked in
/// `processing/`, where startup reconciliation will find it.
#[derive(Debug)]
pub struct ClaimedItem {
    item: QueueItem,
    name: String,
    inbox: PathBuf,
    processing: PathBuf,
    completed: PathBuf,
}

impl ClaimedItem {
    pub fn item(&self) -> &QueueItem {
        &self.item
    }

    /// Move the item to `completed/`.
    pub fn commit(self) -> Result<(), QueueError> {
        fs::rename(self.processing.join(&self.name), self.completed.join(&self.name))?;
        Ok(())
    }

    /// Return the item to `inbox/` for a later claim.
    pub fn release(self) -> Result<(), QueueError> {
        fs::rename(self.processing.join(&self.name), self.inbox.join(&self.name))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
