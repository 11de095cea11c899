//! Scenario: a standard request flows through every stage and the user
//! receives exactly one video delivery.

use crate::prelude::*;
use reel_core::PipelineStage;

const RUN: &str = "20240101-120000-000000-cafe1001";

#[tokio::test]
async fn happy_path_delivers_one_reel() {
    let h = harness();
    wire_default_fleet(&h.dispatch);

    // Enqueue, claim, run, commit: the daemon's tick in miniature.
    let item = h.item(RUN, "https://example.com/v/1", "standard");
    h.queue.enqueue(&item).unwrap();
    let claimed = h.queue.claim_next().unwrap().unwrap();

    h.runner.run(claimed.item()).await.unwrap();
    claimed.commit().unwrap();

    // Events arrive in stage order, entered before passed/completed.
    let tags = h.event_tags(RUN);
    let expected_prefix = [
        "pipeline.stage_entered@ROUTER",
        "qa.gate_passed@ROUTER",
        "pipeline.stage_completed@ROUTER",
        "pipeline.stage_entered@RESEARCH",
    ];
    assert_eq!(&tags[..4], &expected_prefix);

    let entered: Vec<&String> = tags
        .iter()
        .filter(|t| t.starts_with("pipeline.stage_entered@"))
        .collect();
    assert_eq!(entered.len(), PipelineStage::COUNT);
    assert_eq!(entered[8], "pipeline.stage_entered@DELIVERY");
    assert!(tags.contains(&"pipeline.stage_completed@DELIVERY".to_string()));
    assert!(tags.last().unwrap().starts_with("pipeline.run_completed@"));

    // Each stage's entered precedes its completed.
    for stage in PipelineStage::SEQUENCE {
        let entered_at = tags
            .iter()
            .position(|t| *t == format!("pipeline.stage_entered@{stage}"))
            .unwrap();
        let completed_at = tags
            .iter()
            .position(|t| *t == format!("pipeline.stage_completed@{stage}"))
            .unwrap();
        assert!(entered_at < completed_at, "{stage}");
    }

    // The queue item ended in completed/.
    let queue_root = h.dir.path().join("queue");
    assert_eq!(std::fs::read_dir(queue_root.join("inbox")).unwrap().count(), 0);
    assert_eq!(
        std::fs::read_dir(queue_root.join("processing")).unwrap().count(),
        0
    );
    assert_eq!(
        std::fs::read_dir(queue_root.join("completed")).unwrap().count(),
        1
    );

    // Terminal artifact exists; exactly one video delivery.
    assert!(h
        .dir
        .path()
        .join(format!("workspace/runs/{RUN}/final-reel.mp4"))
        .exists());
    assert_eq!(h.messaging.sent_files().len(), 1);
    assert_eq!(h.delivery.uploads().len(), 1);
}
