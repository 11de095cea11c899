// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification messaging via notify-rust.
//!
//! Fallback channel for hosts without a configured chat transport. It
//! can only push: questions return no answer and file delivery degrades
//! to a notification naming the path.

use super::{Messaging, MessagingError};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopMessaging;

impl DesktopMessaging {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            // Pre-set the application bundle identifier so mac-notification-sys
            // skips its NSAppleScript lookup (which blocks forever in daemon
            // processes that lack Automation permissions).
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }

    fn show(summary: &str, body: String) {
        let summary = summary.to_string();
        // notify_rust::Notification::show() is synchronous on some
        // platforms. Fire-and-forget on tokio's bounded blocking pool to
        // avoid stalling the async runtime.
        tokio::task::spawn_blocking(move || {
            match notify_rust::Notification::new()
                .summary(&summary)
                .body(&body)
                .show()
            {
                Ok(_) => tracing::debug!(%summary, "desktop notification sent"),
                Err(e) => tracing::warn!(%summary, error = %e, "desktop notification failed"),
            }
        });
    }
}

#[async_trait]
impl Messaging for DesktopMessaging {
    async fn notify_user(&self, text: &str) -> Result<(), MessagingError> {
        Self::show("Reel pipeline", text.to_string());
        Ok(())
    }

    async fn ask_user(
        &self,
        prompt: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, MessagingError> {
        // Desktop notifications cannot carry a reply; surface the question
        // and report no answer.
        Self::show("Reel pipeline needs input", prompt.to_string());
        Ok(None)
    }

    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), MessagingError> {
        Self::show(
            "Reel ready",
            format!("{caption}\n{}", path.display()),
        );
        Ok(())
    }
}
