// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource-admission throttling.
//!
//! Before claiming work, the daemon waits here until the host is under
//! its memory, CPU, and temperature thresholds. The user hears about the
//! blocked state once on entry and once on exit, not every poll.

use crate::error::EngineError;
use reel_adapters::{Messaging, ResourceMonitor};
use reel_core::ResourceLimits;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Throttler tuning.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub limits: ResourceLimits,
    pub poll_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            limits: ResourceLimits::default(),
            poll_interval: Duration::from_secs(30),
        }
    }
}

/// Gates admission on host resource headroom.
#[derive(Clone)]
pub struct ResourceThrottler<R: ResourceMonitor, M: Messaging> {
    monitor: R,
    messaging: Option<M>,
    config: ThrottleConfig,
}

impl<R: ResourceMonitor, M: Messaging> ResourceThrottler<R, M> {
    pub fn new(monitor: R, messaging: Option<M>, config: ThrottleConfig) -> Self {
        Self {
            monitor,
            messaging,
            config,
        }
    }

    /// Wait until the host admits new work.
    ///
    /// With no `deadline`, waits indefinitely (normal daemon operation).
    /// With a deadline, gives up at that instant with
    /// [`EngineError::ResourceBlocked`].
    pub async fn admit(&self, deadline: Option<Instant>) -> Result<(), EngineError> {
        let mut blocked_since: Option<Instant> = None;
        let mut last_blockers = Vec::new();
        loop {
            let blockers = match self.monitor.snapshot().await {
                Ok(snapshot) => snapshot.blockers(&self.config.limits),
                Err(err) => {
                    // An unreadable monitor never blocks admission.
                    warn!(error = %err, "resource probe failed, admitting anyway");
                    Vec::new()
                }
            };

            if blockers.is_empty() {
                if let Some(since) = blocked_since {
                    info!(blocked_for_s = since.elapsed().as_secs(), "resources recovered");
                    self.notify(&format!(
                        "Resources recovered after {}s; resuming work.",
                        since.elapsed().as_secs()
                    ))
                    .await;
                }
                return Ok(());
            }

            if blocked_since.is_none() {
                blocked_since = Some(Instant::now());
                warn!(blockers = ?blockers, "admission blocked");
                self.notify(&format!("Pausing new work: {}", blockers.join("; ")))
                    .await;
            }
            last_blockers = blockers;

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(EngineError::ResourceBlocked(last_blockers.join("; ")));
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn notify(&self, text: &str) {
        if let Some(messaging) = &self.messaging {
            if let Err(err) = messaging.notify_user(text).await {
                warn!(error = %err, "throttle notification failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "throttle_tests.rs"]
mod tests;
