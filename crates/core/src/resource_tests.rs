// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn healthy() -> ResourceSnapshot {
    ResourceSnapshot {
        memory_available_bytes: 8 * 1024 * 1024 * 1024,
        memory_total_bytes: 16 * 1024 * 1024 * 1024,
        cpu_load_normalised: 0.2,
        temperature_celsius: Some(55.0),
    }
}

#[test]
fn healthy_snapshot_is_admissible() {
    assert!(healthy().admissible(&ResourceLimits::default()));
}

#[test]
fn low_memory_blocks() {
    let snapshot = ResourceSnapshot {
        memory_available_bytes: 1024 * 1024 * 1024,
        ..healthy()
    };
    let blockers = snapshot.blockers(&ResourceLimits::default());
    assert_eq!(blockers.len(), 1);
    assert!(blockers[0].contains("memory low"));
}

#[test]
fn hot_cpu_and_temperature_block_together() {
    let snapshot = ResourceSnapshot {
        cpu_load_normalised: 0.95,
        temperature_celsius: Some(91.0),
        ..healthy()
    };
    let blockers = snapshot.blockers(&ResourceLimits::default());
    assert_eq!(blockers.len(), 2);
}

#[test]
fn missing_temperature_sensor_never_blocks() {
    let snapshot = ResourceSnapshot {
        temperature_celsius: None,
        ..healthy()
    };
    assert!(snapshot.admissible(&ResourceLimits::default()));
}

#[test]
fn default_limits_match_deployment_policy() {
    let limits = ResourceLimits::default();
    assert_eq!(limits.memory_floor_bytes, 3 * 1024 * 1024 * 1024);
    assert!((limits.cpu_ceiling_normalised - 0.8).abs() < f64::EPSILON);
    assert!((limits.temperature_ceiling_celsius - 80.0).abs() < f64::EPSILON);
}
