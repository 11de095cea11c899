// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake messaging adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Messaging, MessagingError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Recorded messaging interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagingCall {
    Notify { text: String },
    Ask { prompt: String },
    SendFile { path: PathBuf, caption: String },
}

struct FakeMessagingState {
    calls: Vec<MessagingCall>,
    answers: VecDeque<Option<String>>,
    fail_sends: bool,
}

/// Fake messaging adapter recording calls and replaying scripted answers.
#[derive(Clone)]
pub struct FakeMessaging {
    inner: Arc<Mutex<FakeMessagingState>>,
}

impl Default for FakeMessaging {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeMessagingState {
                calls: Vec::new(),
                answers: VecDeque::new(),
                fail_sends: false,
            })),
        }
    }
}

impl FakeMessaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next `ask_user`.
    pub fn push_answer(&self, answer: Option<&str>) {
        self.inner
            .lock()
            .answers
            .push_back(answer.map(str::to_string));
    }

    /// Make every subsequent operation fail (to exercise swallow paths).
    pub fn fail_sends(&self) {
        self.inner.lock().fail_sends = true;
    }

    pub fn calls(&self) -> Vec<MessagingCall> {
        self.inner.lock().calls.clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MessagingCall::Notify { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sent_files(&self) -> Vec<PathBuf> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MessagingCall::SendFile { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messaging for FakeMessaging {
    async fn notify_user(&self, text: &str) -> Result<(), MessagingError> {
        let mut state = self.inner.lock();
        state.calls.push(MessagingCall::Notify {
            text: text.to_string(),
        });
        if state.fail_sends {
            return Err(MessagingError::SendFailed("fake send failure".to_string()));
        }
        Ok(())
    }

    async fn ask_user(
        &self,
        prompt: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, MessagingError> {
        let mut state = self.inner.lock();
        state.calls.push(MessagingCall::Ask {
            prompt: prompt.to_string(),
        });
        if state.fail_sends {
            return Err(MessagingError::SendFailed("fake send failure".to_string()));
        }
        Ok(state.answers.pop_front().flatten())
    }

    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), MessagingError> {
        let mut state = self.inner.lock();
        state.calls.push(MessagingCall::SendFile {
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        if state.fail_sends {
            return Err(MessagingError::SendFailed("fake send failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
