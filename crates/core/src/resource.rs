// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host resource observations for admission control.

use serde::{Deserialize, Serialize};

/// Point-in-time host resource reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub memory_available_bytes: u64,
    pub memory_total_bytes: u64,
    /// 1-minute load average divided by logical core count.
    pub cpu_load_normalised: f64,
    /// Hottest sensor reading, when the host exposes one.
    pub temperature_celsius: Option<f64>,
}

/// Admission thresholds for the throttler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLimits {
    pub memory_floor_bytes: u64,
    pub cpu_ceiling_normalised: f64,
    pub temperature_ceiling_celsius: f64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_floor_bytes: 3 * 1024 * 1024 * 1024,
            cpu_ceiling_normalised: 0.8,
            temperature_ceiling_celsius: 80.0,
        }
    }
}

impl ResourceSnapshot {
    /// The reasons this snapshot fails admission, empty when admissible.
    pub fn blockers(&self, limits: &ResourceLimits) -> Vec<String> {
        let mut blockers = Vec::new();
        if self.memory_available_bytes < limits.memory_floor_bytes {
            blockers.push(format!(
                "memory low: {} MiB available, floor {} MiB",
                self.memory_available_bytes / (1024 * 1024),
                limits.memory_floor_bytes / (1024 * 1024),
            ));
        }
        if self.cpu_load_normalised > limits.cpu_ceiling_normalised {
            blockers.push(format!(
                "cpu load high: {:.2}, ceiling {:.2}",
                self.cpu_load_normalised, limits.cpu_ceiling_normalised,
            ));
        }
        if let Some(temp) = self.temperature_celsius {
            if temp > limits.temperature_ceiling_celsius {
                blockers.push(format!(
                    "temperature high: {:.0} C, ceiling {:.0} C",
                    temp, limits.temperature_ceiling_celsius,
                ));
            }
        }
        blockers
    }

    pub fn admissible(&self, limits: &ResourceLimits) -> bool {
        self.blockers(limits).is_empty()
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
