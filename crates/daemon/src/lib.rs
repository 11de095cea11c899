// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! reel-daemon: the long-running process that owns the queue.
//!
//! One daemon per queue root: the tick loop drains the messaging inbox,
//! waits for resource admission, claims one item at a time, and drives
//! it through the pipeline. Crash recovery happens once at startup.

pub mod env;
pub mod inbox;
pub mod lifecycle;

pub use env::{ConfigurationError, Settings};
pub use inbox::InboxProcessor;
pub use lifecycle::{Daemon, DaemonLock, LifecycleError};
