// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event bus.
//!
//! Listeners receive events sequentially, in registration order, in the
//! publisher's task. A listener failure is logged and isolated; it
//! never reaches the publisher or the listeners after it. There is no
//! back-pressure and no persistence; durable trails are a listener
//! concern (see the journal and checkpoint listeners).

use async_trait::async_trait;
use reel_core::PipelineEvent;
use std::sync::Arc;
use tracing::warn;

/// A subscriber on the bus.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Listener name, for failure logs.
    fn name(&self) -> &'static str;

    async fn receive(&self, event: &PipelineEvent) -> Result<(), String>;
}

/// Process-scoped publish/subscribe.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Delivery order is registration order.
    pub fn subscribe(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Deliver `event` to every listener, isolating failures.
    pub async fn publish(&self, event: &PipelineEvent) {
        for listener in &self.listeners {
            if let Err(message) = listener.receive(event).await {
                warn!(
                    listener = listener.name(),
                    event = event.kind.name(),
                    error = %message,
                    "event listener failed",
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
