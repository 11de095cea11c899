// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use reel_adapters::DispatchError;
use reel_core::stage::PipelineStage;
use reel_core::TransitionError;
use reel_storage::StoreError;
use thiserror::Error;

/// Errors that can occur while driving a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("recovery exhausted at {stage}: {reason}")]
    RecoveryExhausted {
        stage: PipelineStage,
        reason: String,
    },
    #[error("transition error: {0}")]
    Transition(#[from] TransitionError),
    #[error("state load error: {0}")]
    StateLoad(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("resource admission blocked: {0}")]
    ResourceBlocked(String),
    #[error("side generation failed permanently: {0}")]
    SideGenPermanent(String),
    #[error("stage attempt rejected: {0}")]
    AttemptRejected(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
