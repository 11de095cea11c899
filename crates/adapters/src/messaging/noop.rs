// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op messaging adapter

use super::{Messaging, MessagingError};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Messaging adapter that discards everything. Used when the daemon runs
/// headless and notifications are unwanted.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMessaging;

impl NoopMessaging {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Messaging for NoopMessaging {
    async fn notify_user(&self, _text: &str) -> Result<(), MessagingError> {
        Ok(())
    }

    async fn ask_user(
        &self,
        _prompt: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, MessagingError> {
        Ok(None)
    }

    async fn send_file(&self, _path: &Path, _caption: &str) -> Result<(), MessagingError> {
        Ok(())
    }
}
