// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! reel-adapters: ports to the outside world.
//!
//! Every external collaborator (agent CLIs, the messaging channel, file
//! delivery, video tooling, the generation service, the host's resource
//! counters, the knowledge base) is reached through a narrow trait
//! defined here. Production adapters wrap subprocesses or system files;
//! fakes (behind the `test-support` feature) record calls and play back
//! scripted outcomes.

mod delivery;
mod dispatch;
mod knowledge;
mod messaging;
mod monitor;
mod subprocess;
mod video;
mod videogen;

pub use delivery::{DeliveryError, FileDelivery, LocalFileDelivery};
pub use dispatch::{AgentDispatch, CliAgentDispatch, DispatchError, DispatchRequest};
pub use knowledge::{KnowledgeBase, KnowledgeError, YamlKnowledgeBase};
pub use messaging::{
    ConsoleMessaging, DesktopMessaging, InboundMessage, Messaging, MessagingError,
    MessagingInbox, NoopInbox, NoopMessaging,
};
pub use monitor::{MonitorError, ResourceMonitor, SystemResourceMonitor};
pub use subprocess::run_with_timeout;
pub use video::{
    FfmpegEncoder, FfprobeProber, VideoDownload, VideoEncode, VideoProbe, VideoToolError,
    YtDlpDownloader,
};
pub use videogen::{
    DisabledVideoGeneration, GenJobUpdate, GenPrompt, VideoGenError, VideoGeneration,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use delivery::FakeFileDelivery;
#[cfg(any(test, feature = "test-support"))]
pub use dispatch::FakeAgentDispatch;
#[cfg(any(test, feature = "test-support"))]
pub use messaging::{FakeInbox, FakeMessaging, MessagingCall};
#[cfg(any(test, feature = "test-support"))]
pub use monitor::FakeResourceMonitor;
#[cfg(any(test, feature = "test-support"))]
pub use videogen::{FakeGenBehavior, FakeVideoGeneration};
