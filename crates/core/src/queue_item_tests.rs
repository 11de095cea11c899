// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn item() -> QueueItem {
    QueueItem::new(
        RunId::new("20240101-120000-000042-deadbeef"),
        Utc.timestamp_opt(1_704_110_400, 0).unwrap(),
        Request::new("https://example.com/v/1", "standard"),
    )
}

#[test]
fn document_flattens_the_request() {
    let json = serde_json::to_value(item()).unwrap();
    assert_eq!(json["run_id"], "20240101-120000-000042-deadbeef");
    assert_eq!(json["source_url"], "https://example.com/v/1");
    assert_eq!(json["message_text"], "standard");
    assert!(json.get("request").is_none());
}

#[test]
fn round_trips() {
    let original = item();
    let json = serde_json::to_string(&original).unwrap();
    let back: QueueItem = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn filenames_sort_by_submission_time() {
    let early = item();
    let mut late = item();
    late.submitted_at = Utc.timestamp_opt(1_704_110_500, 0).unwrap();
    let a = early.filename();
    let b = late.filename();
    assert!(a < b);
    assert!(a.ends_with(".json"));
}

#[test]
fn same_second_filenames_differ() {
    let item = item();
    assert_ne!(item.filename(), item.filename());
}
