// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Video generation service port.
//!
//! Side clips are produced by an external generation service. Submission
//! is keyed by the caller's idempotent key, so re-submitting a key the
//! provider already finished must not produce a second artifact.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from the generation service.
#[derive(Debug, Error)]
pub enum VideoGenError {
    /// Transport-level failure (connection, 5xx, timeout).
    #[error("generation service error: {0}")]
    Transport(String),
    /// The provider rejected the request outright.
    #[error("generation request rejected: {0}")]
    Rejected(String),
}

impl VideoGenError {
    pub fn message(&self) -> &str {
        match self {
            VideoGenError::Transport(m) | VideoGenError::Rejected(m) => m,
        }
    }
}

/// One generation prompt, as extracted from the CONTENT artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenPrompt {
    pub variant: String,
    pub text: String,
    /// Narrative anchor the clip belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<u32>,
}

/// Provider-side view of a job, as returned by a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum GenJobUpdate {
    Generating,
    Completed,
    Failed { message: String },
}

/// Adapter for the asynchronous video generation service.
#[async_trait]
pub trait VideoGeneration: Clone + Send + Sync + 'static {
    /// Submit a job under the caller's idempotent key.
    async fn submit_job(&self, idempotent_key: &str, prompt: &GenPrompt)
        -> Result<(), VideoGenError>;

    /// Poll the provider for the job's current status.
    async fn poll_job(&self, idempotent_key: &str) -> Result<GenJobUpdate, VideoGenError>;

    /// Download a completed clip to `dest`.
    async fn download_clip(&self, idempotent_key: &str, dest: &Path)
        -> Result<(), VideoGenError>;
}

/// Generation adapter for hosts without provider credentials.
///
/// Submission is rejected with an "invalid argument" marker, which the
/// await-gate classifies as permanent, so the pipeline proceeds without
/// side clips instead of retrying a service that is not there.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVideoGeneration;

impl DisabledVideoGeneration {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VideoGeneration for DisabledVideoGeneration {
    async fn submit_job(
        &self,
        _idempotent_key: &str,
        _prompt: &GenPrompt,
    ) -> Result<(), VideoGenError> {
        Err(VideoGenError::Rejected(
            "invalid argument: generation service not configured".to_string(),
        ))
    }

    async fn poll_job(&self, _idempotent_key: &str) -> Result<GenJobUpdate, VideoGenError> {
        Err(VideoGenError::Transport(
            "generation service not configured".to_string(),
        ))
    }

    async fn download_clip(
        &self,
        _idempotent_key: &str,
        _dest: &Path,
    ) -> Result<(), VideoGenError> {
        Err(VideoGenError::Transport(
            "generation service not configured".to_string(),
        ))
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Scripted behaviour for one idempotent key.
    #[derive(Debug, Clone)]
    pub enum FakeGenBehavior {
        /// Report `Generating` for the first `n` polls, then complete.
        CompleteAfter(usize),
        /// Every submit for this key errors.
        FailOnSubmit(String),
        /// Every poll for this key errors at the transport level.
        FailOnPoll(String),
        /// Polls resolve to a provider-side generation failure.
        FailGeneration(String),
        /// Completes on poll, but the clip download errors.
        FailDownload(String),
        /// Never leaves `Generating`.
        NeverFinish,
    }

    #[derive(Default)]
    struct FakeGenState {
        behaviors: HashMap<String, FakeGenBehavior>,
        polls: HashMap<String, usize>,
        submissions: Vec<String>,
        artifacts: HashMap<String, u32>,
    }

    /// Fake generation service with per-key scripted outcomes.
    ///
    /// Keys without scripted behaviour complete on the first poll.
    #[derive(Clone, Default)]
    pub struct FakeVideoGeneration {
        inner: Arc<Mutex<FakeGenState>>,
    }

    impl FakeVideoGeneration {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_behavior(&self, idempotent_key: impl Into<String>, behavior: FakeGenBehavior) {
            self.inner
                .lock()
                .behaviors
                .insert(idempotent_key.into(), behavior);
        }

        /// All submit calls observed, in order (repeats included).
        pub fn submissions(&self) -> Vec<String> {
            self.inner.lock().submissions.clone()
        }

        /// How many artifacts the provider produced for a key.
        pub fn artifact_count(&self, idempotent_key: &str) -> u32 {
            self.inner
                .lock()
                .artifacts
                .get(idempotent_key)
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl VideoGeneration for FakeVideoGeneration {
        async fn submit_job(
            &self,
            idempotent_key: &str,
            _prompt: &GenPrompt,
        ) -> Result<(), VideoGenError> {
            let mut state = self.inner.lock();
            state.submissions.push(idempotent_key.to_string());
            match state.behaviors.get(idempotent_key) {
                Some(FakeGenBehavior::FailOnSubmit(message)) => {
                    Err(VideoGenError::Transport(message.clone()))
                }
                _ => Ok(()),
            }
        }

        async fn poll_job(&self, idempotent_key: &str) -> Result<GenJobUpdate, VideoGenError> {
            let mut state = self.inner.lock();
            let polls = {
                let counter = state.polls.entry(idempotent_key.to_string()).or_insert(0);
                *counter += 1;
                *counter
            };
            let behavior = state
                .behaviors
                .get(idempotent_key)
                .cloned()
                .unwrap_or(FakeGenBehavior::CompleteAfter(0));
            let completed = |state: &mut FakeGenState| {
                // Idempotent completion: the artifact is produced once no
                // matter how many submits or polls observe it.
                state
                    .artifacts
                    .entry(idempotent_key.to_string())
                    .or_insert(1);
                Ok(GenJobUpdate::Completed)
            };
            match behavior {
                FakeGenBehavior::CompleteAfter(n) if polls > n => completed(&mut state),
                FakeGenBehavior::CompleteAfter(_) => Ok(GenJobUpdate::Generating),
                FakeGenBehavior::FailOnSubmit(_) => Ok(GenJobUpdate::Generating),
                FakeGenBehavior::FailOnPoll(message) => Err(VideoGenError::Transport(message)),
                FakeGenBehavior::FailGeneration(message) => {
                    Ok(GenJobUpdate::Failed { message })
                }
                FakeGenBehavior::FailDownload(_) => completed(&mut state),
                FakeGenBehavior::NeverFinish => Ok(GenJobUpdate::Generating),
            }
        }

        async fn download_clip(
            &self,
            idempotent_key: &str,
            dest: &Path,
        ) -> Result<(), VideoGenError> {
            let behavior = self.inner.lock().behaviors.get(idempotent_key).cloned();
            if let Some(FakeGenBehavior::FailDownload(message)) = behavior {
                return Err(VideoGenError::Transport(message));
            }
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| VideoGenError::Transport(e.to_string()))?;
            }
            tokio::fs::write(dest, b"fake clip bytes")
                .await
                .map_err(|e| VideoGenError::Transport(e.to_string()))?;
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGenBehavior, FakeVideoGeneration};

#[cfg(test)]
#[path = "videogen_tests.rs"]
mod tests;
