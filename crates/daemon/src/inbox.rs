// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging-inbox consumption.
//!
//! Each tick drains the channel: authenticate the sender against the
//! allow-list, deduplicate on the channel's message id, validate that
//! the text carries a usable source URL, assign a run id, enqueue. Every
//! accepted message gets exactly one acknowledgement.

use reel_adapters::{InboundMessage, Messaging, MessagingInbox};
use reel_core::{Clock, QueueItem, Request, RunId};
use reel_storage::Queue;
use std::collections::HashSet;
use tracing::{info, warn};

/// Drains inbound messages into the queue.
pub struct InboxProcessor<I: MessagingInbox, M: Messaging, C: Clock> {
    inbox: I,
    messaging: M,
    clock: C,
    allowed_senders: Vec<String>,
    /// Knowledge-base entries attached to every request as advisory
    /// inputs for the agents.
    advisory_defaults: Vec<(String, String)>,
    seen_ids: HashSet<String>,
}

impl<I: MessagingInbox, M: Messaging, C: Clock> InboxProcessor<I, M, C> {
    pub fn new(inbox: I, messaging: M, clock: C, allowed_senders: Vec<String>) -> Self {
        Self {
            inbox,
            messaging,
            clock,
            allowed_senders,
            advisory_defaults: Vec::new(),
            seen_ids: HashSet::new(),
        }
    }

    pub fn with_advisory_defaults(mut self, defaults: Vec<(String, String)>) -> Self {
        self.advisory_defaults = defaults;
        self
    }

    /// One drain pass. Returns how many requests were enqueued.
    pub async fn drain(&mut self, queue: &Queue) -> usize {
        let messages = match self.inbox.poll_inbox().await {
            Ok(messages) => messages,
            Err(err) => {
                warn!(error = %err, "messaging inbox poll failed");
                return 0;
            }
        };

        let mut enqueued = 0;
        for message in messages {
            if !self.seen_ids.insert(message.id.clone()) {
                continue;
            }
            if !self.allowed_senders.iter().any(|s| s == &message.sender) {
                warn!(sender = %message.sender, "ignoring message from unknown sender");
                continue;
            }
            match self.accept(queue, &message).await {
                Ok(run_id) => {
                    enqueued += 1;
                    info!(%run_id, sender = %message.sender, "request queued");
                }
                Err(reason) => {
                    let _ = self
                        .messaging
                        .notify_user(&format!("Could not accept that request: {reason}"))
                        .await;
                }
            }
        }
        enqueued
    }

    async fn accept(
        &self,
        queue: &Queue,
        message: &InboundMessage,
    ) -> Result<RunId, String> {
        let url = extract_url(&message.text)
            .ok_or_else(|| "no source URL found in the message".to_string())?;
        let comment = message.text.replace(&url, "").trim().to_string();

        let now = self.clock.now_utc();
        let run_id = RunId::generate(now);
        let mut request = Request::new(url, comment);
        for (key, value) in &self.advisory_defaults {
            request
                .directives
                .advisory
                .insert(key.clone(), value.clone());
        }
        let item = QueueItem::new(run_id.clone(), now, request);
        queue
            .enqueue(&item)
            .map_err(|err| format!("queueing failed: {err}"))?;

        let _ = self
            .messaging
            .notify_user(&format!("Accepted. Your reel is queued as {run_id}."))
            .await;
        Ok(run_id)
    }
}

/// First http(s) URL in the text, if any.
fn extract_url(text: &str) -> Option<String> {
    for token in text.split_whitespace() {
        let token = token.trim_matches(|c: char| c == '<' || c == '>' || c == ',');
        if let Some(rest) = token
            .strip_prefix("https://")
            .or_else(|| token.strip_prefix("http://"))
        {
            // A scheme alone is not a URL.
            if !rest.is_empty() && rest.contains('.') {
                return Some(token.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;
