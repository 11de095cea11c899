// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use reel_adapters::{FakeMessaging, FakeResourceMonitor};
use reel_core::ResourceSnapshot;

fn fast_config() -> ThrottleConfig {
    ThrottleConfig {
        limits: ResourceLimits::default(),
        poll_interval: Duration::from_millis(5),
    }
}

fn hot_snapshot() -> ResourceSnapshot {
    ResourceSnapshot {
        memory_available_bytes: 1024 * 1024 * 1024,
        memory_total_bytes: 16 * 1024 * 1024 * 1024,
        cpu_load_normalised: 0.2,
        temperature_celsius: Some(50.0),
    }
}

#[tokio::test]
async fn healthy_host_admits_immediately_and_quietly() {
    let monitor = FakeResourceMonitor::healthy();
    let messaging = FakeMessaging::new();
    let throttler = ResourceThrottler::new(monitor, Some(messaging.clone()), fast_config());
    throttler.admit(None).await.unwrap();
    assert!(messaging.notifications().is_empty());
}

#[tokio::test]
async fn blocked_host_notifies_on_entry_and_exit_once() {
    let monitor = FakeResourceMonitor::healthy();
    monitor.set(hot_snapshot());
    let messaging = FakeMessaging::new();
    let throttler = ResourceThrottler::new(monitor.clone(), Some(messaging.clone()), fast_config());

    let recover = {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            monitor.set(ResourceSnapshot {
                memory_available_bytes: 8 * 1024 * 1024 * 1024,
                ..hot_snapshot()
            });
        })
    };

    throttler.admit(None).await.unwrap();
    recover.await.unwrap();

    let notifications = messaging.notifications();
    assert_eq!(notifications.len(), 2);
    assert!(notifications[0].contains("Pausing new work"));
    assert!(notifications[0].contains("memory low"));
    assert!(notifications[1].contains("Resources recovered"));
}

#[tokio::test]
async fn explicit_deadline_raises_resource_blocked() {
    let monitor = FakeResourceMonitor::healthy();
    monitor.set(hot_snapshot());
    let throttler: ResourceThrottler<_, FakeMessaging> =
        ResourceThrottler::new(monitor, None, fast_config());

    let err = throttler
        .admit(Some(Instant::now() + Duration::from_millis(25)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ResourceBlocked(_)));
}
