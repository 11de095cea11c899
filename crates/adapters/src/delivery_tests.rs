// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn local_delivery_copies_into_exports() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("final-reel.mp4");
    std::fs::write(&source, b"video bytes").unwrap();

    let delivery = LocalFileDelivery::new(dir.path().join("exports"));
    let url = delivery.upload(&source).await.unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.ends_with("final-reel.mp4"));
    assert!(dir.path().join("exports/final-reel.mp4").exists());
}

#[tokio::test]
async fn local_delivery_rejects_pathless_input() {
    let dir = TempDir::new().unwrap();
    let delivery = LocalFileDelivery::new(dir.path());
    assert!(delivery.upload(std::path::Path::new("/")).await.is_err());
}

#[tokio::test]
async fn fake_delivery_records_uploads() {
    let fake = FakeFileDelivery::new();
    let url = fake.upload(std::path::Path::new("/tmp/a.mp4")).await.unwrap();
    assert!(url.starts_with("https://delivery.invalid/"));
    assert_eq!(fake.uploads().len(), 1);
}
