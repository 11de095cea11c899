// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound messaging: the request side of the chat channel.
//!
//! Separated from the outbound [`Messaging`](super::Messaging) trait so
//! push-only channels (desktop notifications) do not have to pretend
//! they can receive.

use super::MessagingError;
use async_trait::async_trait;

/// One message received from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Channel-assigned message id, used for deduplication.
    pub id: String,
    /// Channel-level sender identity, checked against the allow-list.
    pub sender: String,
    pub text: String,
}

/// Adapter polling the channel for new messages.
#[async_trait]
pub trait MessagingInbox: Clone + Send + Sync + 'static {
    /// Fetch messages that arrived since the last poll.
    async fn poll_inbox(&self) -> Result<Vec<InboundMessage>, MessagingError>;
}

/// Inbox for channels that cannot receive. Always empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInbox;

impl NoopInbox {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessagingInbox for NoopInbox {
    async fn poll_inbox(&self) -> Result<Vec<InboundMessage>, MessagingError> {
        Ok(Vec::new())
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Fake inbox replaying queued messages.
    #[derive(Clone, Default)]
    pub struct FakeInbox {
        queue: Arc<Mutex<VecDeque<InboundMessage>>>,
    }

    impl FakeInbox {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, id: &str, sender: &str, text: &str) {
            self.queue.lock().push_back(InboundMessage {
                id: id.to_string(),
                sender: sender.to_string(),
                text: text.to_string(),
            });
        }
    }

    #[async_trait]
    impl MessagingInbox for FakeInbox {
        async fn poll_inbox(&self) -> Result<Vec<InboundMessage>, MessagingError> {
            Ok(self.queue.lock().drain(..).collect())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeInbox;
