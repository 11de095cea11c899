// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console messaging for foreground CLI runs.

use super::{Messaging, MessagingError};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Prints user-facing messages to stdout. Questions are surfaced but
/// never answered; a foreground run is non-interactive once started.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleMessaging;

impl ConsoleMessaging {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Messaging for ConsoleMessaging {
    async fn notify_user(&self, text: &str) -> Result<(), MessagingError> {
        println!("{text}");
        Ok(())
    }

    async fn ask_user(
        &self,
        prompt: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, MessagingError> {
        println!("{prompt}");
        Ok(None)
    }

    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), MessagingError> {
        println!("{caption}");
        println!("  -> {}", path.display());
        Ok(())
    }
}
