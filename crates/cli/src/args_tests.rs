// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn args(url: &str) -> RunArgs {
    RunArgs {
        url: url.to_string(),
        message: String::new(),
        target_duration: None,
        moments: None,
        resume: None,
        start_stage: None,
        timeout: None,
    }
}

#[test]
fn plain_url_is_valid() {
    args("https://example.com/v/1").validate().unwrap();
}

#[test]
fn non_url_is_rejected_with_a_hint() {
    let err = args("watch?v=123").validate().unwrap_err();
    assert!(err.message.contains("not an http(s) URL"));
    assert!(!err.hint.is_empty());
}

#[test]
fn start_stage_one_without_resume_is_valid() {
    let mut a = args("https://example.com/v/1");
    a.start_stage = Some(1);
    a.validate().unwrap();
}

#[test]
fn start_stage_above_one_requires_resume() {
    let mut a = args("https://example.com/v/1");
    a.start_stage = Some(3);
    let err = a.validate().unwrap_err();
    assert!(err.message.contains("requires --resume"));
}

#[test]
fn start_stage_out_of_range_is_rejected() {
    for stage in [0, 10] {
        let mut a = args("https://example.com/v/1");
        a.start_stage = Some(stage);
        let err = a.validate().unwrap_err();
        assert!(err.message.contains("out of range"), "{}", err.message);
    }
}

#[test]
fn resume_path_must_exist() {
    let mut a = args("https://example.com/v/1");
    a.resume = Some(PathBuf::from("/nonexistent/workspace/runs/r1"));
    a.start_stage = Some(3);
    let err = a.validate().unwrap_err();
    assert!(err.message.contains("does not exist"));
}

#[test]
fn existing_resume_path_with_start_stage_is_valid() {
    let dir = TempDir::new().unwrap();
    let mut a = args("https://example.com/v/1");
    a.resume = Some(dir.path().to_path_buf());
    a.start_stage = Some(9);
    a.validate().unwrap();
}

#[test]
fn clap_parses_the_documented_surface() {
    let cli = Cli::try_parse_from([
        "reel",
        "run",
        "https://example.com/v/1",
        "--message",
        "make it pop",
        "--target-duration",
        "45",
        "--moments",
        "5",
        "--start-stage",
        "1",
        "--timeout",
        "300",
    ])
    .unwrap();
    let Command::Run(run) = cli.command;
    assert_eq!(run.url, "https://example.com/v/1");
    assert_eq!(run.message, "make it pop");
    assert_eq!(run.target_duration, Some(45));
    assert_eq!(run.moments, Some(5));
    assert_eq!(run.timeout, Some(300));
}
