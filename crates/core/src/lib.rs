// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! reel-core: domain types for the Reel pipeline daemon

pub mod clock;
pub mod critique;
pub mod event;
pub mod queue_item;
pub mod recovery;
pub mod request;
pub mod resource;
pub mod run_id;
pub mod run_state;
pub mod sidegen;
pub mod stage;
pub mod state_machine;

pub use clock::{Clock, FakeClock, SystemClock};
pub use critique::{QaCritique, QaDecision};
pub use event::PipelineEvent;
pub use queue_item::QueueItem;
pub use recovery::{RecoveryLevel, RecoveryResult};
pub use request::{Directives, Request};
pub use resource::{ResourceLimits, ResourceSnapshot};
pub use run_id::RunId;
pub use run_state::RunState;
pub use sidegen::{SideGenErrorCode, SideGenJob, SideGenJobs, SideGenStatus};
pub use stage::PipelineStage;
pub use state_machine::{PipelineStateMachine, StageSignal, TransitionError};
