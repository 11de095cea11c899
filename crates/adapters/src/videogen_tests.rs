// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn prompt() -> GenPrompt {
    GenPrompt {
        variant: "hook".to_string(),
        text: "city skyline at dusk".to_string(),
        anchor: None,
        duration_s: Some(6),
    }
}

#[tokio::test]
async fn unscripted_key_completes_on_first_poll() {
    let fake = FakeVideoGeneration::new();
    fake.submit_job("r1_hook", &prompt()).await.unwrap();
    assert_eq!(fake.poll_job("r1_hook").await.unwrap(), GenJobUpdate::Completed);
}

#[tokio::test]
async fn complete_after_counts_polls() {
    let fake = FakeVideoGeneration::new();
    fake.set_behavior("r1_hook", FakeGenBehavior::CompleteAfter(2));
    fake.submit_job("r1_hook", &prompt()).await.unwrap();
    assert_eq!(fake.poll_job("r1_hook").await.unwrap(), GenJobUpdate::Generating);
    assert_eq!(fake.poll_job("r1_hook").await.unwrap(), GenJobUpdate::Generating);
    assert_eq!(fake.poll_job("r1_hook").await.unwrap(), GenJobUpdate::Completed);
}

#[tokio::test]
async fn resubmitting_a_completed_key_produces_no_second_artifact() {
    let fake = FakeVideoGeneration::new();
    fake.submit_job("r1_hook", &prompt()).await.unwrap();
    let _ = fake.poll_job("r1_hook").await.unwrap();
    fake.submit_job("r1_hook", &prompt()).await.unwrap();
    let _ = fake.poll_job("r1_hook").await.unwrap();
    assert_eq!(fake.submissions().len(), 2);
    assert_eq!(fake.artifact_count("r1_hook"), 1);
}

#[tokio::test]
async fn scripted_failures_surface_where_scripted() {
    let fake = FakeVideoGeneration::new();
    fake.set_behavior("a", FakeGenBehavior::FailOnSubmit("quota".to_string()));
    fake.set_behavior("b", FakeGenBehavior::FailGeneration("nsfw filter".to_string()));
    fake.set_behavior("c", FakeGenBehavior::FailDownload("cdn error".to_string()));

    assert!(fake.submit_job("a", &prompt()).await.is_err());
    assert_eq!(
        fake.poll_job("b").await.unwrap(),
        GenJobUpdate::Failed {
            message: "nsfw filter".to_string()
        }
    );

    let dir = TempDir::new().unwrap();
    assert_eq!(fake.poll_job("c").await.unwrap(), GenJobUpdate::Completed);
    assert!(fake
        .download_clip("c", &dir.path().join("c.mp4"))
        .await
        .is_err());
}

#[tokio::test]
async fn download_writes_the_destination_file() {
    let fake = FakeVideoGeneration::new();
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("sidegen/hook.mp4");
    fake.download_clip("r1_hook", &dest).await.unwrap();
    assert!(dest.exists());
}
