// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn at(secs: i64, micros: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, micros * 1000).unwrap()
}

#[test]
fn format_is_date_time_micros_hex() {
    let id = RunId::generate(at(1_700_000_000, 123_456 / 1000));
    let parts: Vec<&str> = id.as_str().split('-').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0].len(), 8); // YYYYMMDD
    assert_eq!(parts[1].len(), 6); // HHMMSS
    assert_eq!(parts[2].len(), 6); // microseconds, zero-padded
    assert_eq!(parts[3].len(), 8); // random hex
}

#[test]
fn ids_sort_chronologically() {
    let earlier = RunId::generate(at(1_700_000_000, 0));
    let later = RunId::generate(at(1_700_000_100, 0));
    assert!(earlier < later);
}

#[test]
fn same_instant_ids_differ() {
    let now = at(1_700_000_000, 42);
    let a = RunId::generate(now);
    let b = RunId::generate(now);
    assert_ne!(a, b);
}

#[test]
fn serde_round_trips_transparently() {
    let id = RunId::new("20240101-120000-000042-deadbeef");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"20240101-120000-000042-deadbeef\"");
    let back: RunId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
