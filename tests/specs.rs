//! Behavioral specifications for the reel pipeline.
//!
//! These tests drive the full pipeline through fake adapters and verify
//! the observable contract: event ordering, queue-item location, files
//! in the workspace, and user-visible messages.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;

// pipeline/
#[path = "specs/pipeline/crash_resume.rs"]
mod pipeline_crash_resume;
#[path = "specs/pipeline/happy_path.rs"]
mod pipeline_happy_path;
#[path = "specs/pipeline/qa_rework.rs"]
mod pipeline_qa_rework;
#[path = "specs/pipeline/recovery.rs"]
mod pipeline_recovery;
#[path = "specs/pipeline/sidegen.rs"]
mod pipeline_sidegen;
