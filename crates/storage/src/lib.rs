// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! reel-storage: durable state for the Reel pipeline daemon.
//!
//! Everything here follows one persistence rule: full documents are
//! replaced atomically (write-temp, fsync, rename), journals are
//! line-oriented appends, and queue items move between directories with
//! single renames.

mod atomic;
mod checkpoint;
mod queue;
mod rundoc;
mod workspace;

pub use atomic::{append_line, write_atomic};
pub use checkpoint::{CheckpointStore, StateStore, StoreError};
pub use queue::{ClaimedItem, Queue, QueueError};
pub use rundoc::RunDoc;
pub use workspace::{Workspace, WorkspaceManager};
