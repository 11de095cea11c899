// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake agent dispatch for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AgentDispatch, DispatchError, DispatchRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type ReplyFn = Box<dyn Fn(&DispatchRequest) -> Result<String, DispatchError> + Send>;

struct FakeDispatchState {
    /// Scripted replies, consumed front to back.
    replies: VecDeque<Result<String, String>>,
    /// Fallback handler once the scripted replies run out.
    handler: Option<ReplyFn>,
    /// Every request seen, in order.
    requests: Vec<DispatchRequest>,
}

/// Fake dispatch adapter replaying scripted replies.
#[derive(Clone)]
pub struct FakeAgentDispatch {
    inner: Arc<Mutex<FakeDispatchState>>,
}

impl Default for FakeAgentDispatch {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeDispatchState {
                replies: VecDeque::new(),
                handler: None,
                requests: Vec::new(),
            })),
        }
    }
}

impl FakeAgentDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.inner.lock().replies.push_back(Ok(reply.into()));
    }

    /// Queue a dispatch failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.inner.lock().replies.push_back(Err(message.into()));
    }

    /// Install a handler used once scripted replies are exhausted.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&DispatchRequest) -> Result<String, DispatchError> + Send + 'static,
    {
        self.inner.lock().handler = Some(Box::new(handler));
    }

    /// All requests observed so far.
    pub fn requests(&self) -> Vec<DispatchRequest> {
        self.inner.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().requests.len()
    }
}

#[async_trait]
impl AgentDispatch for FakeAgentDispatch {
    async fn dispatch(&self, request: DispatchRequest) -> Result<String, DispatchError> {
        let mut state = self.inner.lock();
        state.requests.push(request.clone());
        if let Some(reply) = state.replies.pop_front() {
            return reply.map_err(DispatchError::ProcessFailed);
        }
        if let Some(handler) = &state.handler {
            return handler(&request);
        }
        Err(DispatchError::ProcessFailed(
            "fake dispatch: no scripted reply".to_string(),
        ))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
