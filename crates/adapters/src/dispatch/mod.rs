// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent dispatch: one prompt in, one text reply out.
//!
//! Both pipeline agents and the QA critic go through this port. The
//! caller owns model selection (the QA loop walks its preferred →
//! fallback ladder by issuing two dispatches); the adapter owns process
//! mechanics and the timeout.

mod cli;

pub use cli::CliAgentDispatch;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAgentDispatch;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from agent dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("agent process failed: {0}")]
    ProcessFailed(String),
    #[error("agent exited non-zero ({code}): {stderr}")]
    NonZeroExit { code: i32, stderr: String },
    #[error("agent timed out after {0}s")]
    TimedOut(u64),
}

/// One dispatch invocation.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub prompt: String,
    /// Model override; `None` uses the adapter's default.
    pub model: Option<String>,
    /// Working directory for the agent process (usually the workspace).
    pub workdir: Option<PathBuf>,
    pub timeout: Duration,
}

impl DispatchRequest {
    pub fn new(prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            workdir: None,
            timeout,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }
}

/// Adapter for invoking an agent and collecting its reply.
#[async_trait]
pub trait AgentDispatch: Clone + Send + Sync + 'static {
    async fn dispatch(&self, request: DispatchRequest) -> Result<String, DispatchError>;
}
