// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host resource monitoring.
//!
//! The system reader parses `/proc/meminfo` and `/proc/loadavg` and
//! scans `/sys/class/thermal` for the hottest zone. Hosts without a
//! thermal zone (VMs, containers) simply report no temperature.

use async_trait::async_trait;
use reel_core::ResourceSnapshot;
use std::path::Path;
use thiserror::Error;

/// Errors from resource probes.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unparseable {file}: {message}")]
    Unparseable { file: String, message: String },
}

/// Adapter reading host resource counters.
#[async_trait]
pub trait ResourceMonitor: Clone + Send + Sync + 'static {
    async fn snapshot(&self) -> Result<ResourceSnapshot, MonitorError>;
}

/// Monitor backed by procfs/sysfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResourceMonitor;

impl SystemResourceMonitor {
    pub fn new() -> Self {
        Self
    }

    fn meminfo_kib(text: &str, key: &str) -> Option<u64> {
        text.lines()
            .find(|line| line.starts_with(key))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    }

    fn parse_meminfo(text: &str) -> Result<(u64, u64), MonitorError> {
        let available = Self::meminfo_kib(text, "MemAvailable:");
        let total = Self::meminfo_kib(text, "MemTotal:");
        match (available, total) {
            (Some(available), Some(total)) => Ok((available * 1024, total * 1024)),
            _ => Err(MonitorError::Unparseable {
                file: "/proc/meminfo".to_string(),
                message: "missing MemAvailable or MemTotal".to_string(),
            }),
        }
    }

    fn parse_loadavg(text: &str) -> Result<f64, MonitorError> {
        text.split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| MonitorError::Unparseable {
                file: "/proc/loadavg".to_string(),
                message: "missing 1-minute average".to_string(),
            })
    }

    /// Highest thermal zone reading, in celsius.
    fn read_temperature(thermal_root: &Path) -> Option<f64> {
        let mut hottest: Option<f64> = None;
        let entries = std::fs::read_dir(thermal_root).ok()?;
        for entry in entries.flatten() {
            let temp_path = entry.path().join("temp");
            if let Ok(text) = std::fs::read_to_string(&temp_path) {
                if let Ok(millis) = text.trim().parse::<f64>() {
                    let celsius = millis / 1000.0;
                    hottest = Some(hottest.map_or(celsius, |h: f64| h.max(celsius)));
                }
            }
        }
        hottest
    }
}

#[async_trait]
impl ResourceMonitor for SystemResourceMonitor {
    async fn snapshot(&self) -> Result<ResourceSnapshot, MonitorError> {
        let meminfo = tokio::fs::read_to_string("/proc/meminfo").await?;
        let loadavg = tokio::fs::read_to_string("/proc/loadavg").await?;
        let (memory_available_bytes, memory_total_bytes) = Self::parse_meminfo(&meminfo)?;
        let load = Self::parse_loadavg(&loadavg)?;
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Ok(ResourceSnapshot {
            memory_available_bytes,
            memory_total_bytes,
            cpu_load_normalised: load / cores as f64,
            temperature_celsius: Self::read_temperature(Path::new("/sys/class/thermal")),
        })
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake monitor returning a settable snapshot.
    #[derive(Clone)]
    pub struct FakeResourceMonitor {
        snapshot: Arc<Mutex<ResourceSnapshot>>,
    }

    impl FakeResourceMonitor {
        /// Starts healthy: plenty of memory, idle CPU, cool.
        pub fn healthy() -> Self {
            Self {
                snapshot: Arc::new(Mutex::new(ResourceSnapshot {
                    memory_available_bytes: 8 * 1024 * 1024 * 1024,
                    memory_total_bytes: 16 * 1024 * 1024 * 1024,
                    cpu_load_normalised: 0.1,
                    temperature_celsius: Some(50.0),
                })),
            }
        }

        pub fn set(&self, snapshot: ResourceSnapshot) {
            *self.snapshot.lock() = snapshot;
        }
    }

    #[async_trait]
    impl ResourceMonitor for FakeResourceMonitor {
        async fn snapshot(&self) -> Result<ResourceSnapshot, MonitorError> {
            Ok(*self.snapshot.lock())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeResourceMonitor;

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
