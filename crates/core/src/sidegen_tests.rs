// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn run_id() -> RunId {
    RunId::new("20240101-120000-000042-deadbeef")
}

fn failed(variant: &str, code: SideGenErrorCode) -> SideGenJob {
    let mut job = SideGenJob::pending(&run_id(), variant);
    job.status = SideGenStatus::Failed;
    job.error_code = Some(code);
    job
}

#[test]
fn idempotent_key_is_run_id_underscore_variant() {
    let job = SideGenJob::pending(&run_id(), "hook_broll");
    assert_eq!(
        job.idempotent_key,
        "20240101-120000-000042-deadbeef_hook_broll"
    );
    assert_eq!(job.status, SideGenStatus::Pending);
}

#[parameterized(
    submit = { SideGenErrorCode::SubmitFailed, true },
    rate = { SideGenErrorCode::RateLimited, true },
    poll = { SideGenErrorCode::PollFailed, true },
    download = { SideGenErrorCode::DownloadFailed, false },
    generation = { SideGenErrorCode::GenerationFailed, false },
    invalid = { SideGenErrorCode::InvalidArgument, false },
)]
fn retriability_classification(code: SideGenErrorCode, retriable: bool) {
    assert_eq!(code.is_retriable(), retriable);
}

#[test]
fn invalid_argument_marker_overrides_operation_code() {
    let code = SideGenErrorCode::classify(
        SideGenErrorCode::RateLimited,
        "Provider rejected: INVALID ARGUMENT: duration out of range",
    );
    assert_eq!(code, SideGenErrorCode::InvalidArgument);

    let code = SideGenErrorCode::classify(SideGenErrorCode::PollFailed, "503 upstream");
    assert_eq!(code, SideGenErrorCode::PollFailed);
}

#[test]
fn rate_limit_marker_overrides_operation_code() {
    let code = SideGenErrorCode::classify(
        SideGenErrorCode::GenerationFailed,
        "429: rate limit exceeded, retry later",
    );
    assert_eq!(code, SideGenErrorCode::RateLimited);
}

#[test]
fn all_failures_retriable_requires_at_least_one_failure() {
    let mut jobs = SideGenJobs::default();
    assert!(!jobs.all_failures_retriable());

    let mut done = SideGenJob::pending(&run_id(), "a");
    done.status = SideGenStatus::Completed;
    jobs.jobs.push(done);
    assert!(!jobs.all_failures_retriable());
}

#[test]
fn mixed_permanent_failure_blocks_retry() {
    let jobs = SideGenJobs {
        jobs: vec![
            failed("a", SideGenErrorCode::RateLimited),
            failed("b", SideGenErrorCode::InvalidArgument),
        ],
    };
    assert!(!jobs.all_failures_retriable());
}

#[test]
fn uniformly_transient_failures_permit_retry() {
    let jobs = SideGenJobs {
        jobs: vec![
            failed("a", SideGenErrorCode::RateLimited),
            failed("b", SideGenErrorCode::SubmitFailed),
        ],
    };
    assert!(jobs.all_failures_retriable());
}

#[test]
fn timed_out_jobs_are_failures_but_never_retriable() {
    let mut job = SideGenJob::pending(&run_id(), "a");
    job.status = SideGenStatus::TimedOut;
    let jobs = SideGenJobs { jobs: vec![job] };
    assert_eq!(jobs.failed().count(), 1);
    assert!(!jobs.all_failures_retriable());
}

#[test]
fn terminal_detection() {
    let mut jobs = SideGenJobs {
        jobs: vec![failed("a", SideGenErrorCode::GenerationFailed)],
    };
    assert!(jobs.all_terminal());
    let mut active = SideGenJob::pending(&run_id(), "b");
    active.status = SideGenStatus::Generating;
    jobs.jobs.push(active);
    assert!(!jobs.all_terminal());
}

#[test]
fn jobs_file_round_trips() {
    let jobs = SideGenJobs {
        jobs: vec![failed("a", SideGenErrorCode::RateLimited)],
    };
    let json = serde_json::to_string_pretty(&jobs).unwrap();
    let back: SideGenJobs = serde_json::from_str(&json).unwrap();
    assert_eq!(back, jobs);
    assert!(json.contains("\"rate_limited\""));
    assert!(json.contains("\"FAILED\""));
}
