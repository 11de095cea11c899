// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging adapters
//!
//! The user-facing channel: notifications, questions, and file delivery
//! messages. The concrete chat transport lives behind this trait; when no
//! transport is configured the daemon falls back to desktop notifications
//! so user-relevant events are never dropped on the floor.

mod console;
mod desktop;
mod inbox;
mod noop;

pub use console::ConsoleMessaging;
pub use desktop::DesktopMessaging;
pub use inbox::{InboundMessage, MessagingInbox, NoopInbox};
pub use noop::NoopMessaging;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMessaging, MessagingCall};
#[cfg(any(test, feature = "test-support"))]
pub use inbox::FakeInbox;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from messaging operations.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Adapter for talking to the requesting user.
#[async_trait]
pub trait Messaging: Clone + Send + Sync + 'static {
    /// One-way notification.
    async fn notify_user(&self, text: &str) -> Result<(), MessagingError>;

    /// Ask and wait for an answer; `None` when the user did not reply
    /// within `timeout` or the channel cannot carry questions.
    async fn ask_user(&self, prompt: &str, timeout: Duration)
        -> Result<Option<String>, MessagingError>;

    /// Deliver a file with a caption.
    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), MessagingError>;
}
