// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument surface and precondition checks.
//!
//! Every precondition is validated before any side effect; violations
//! carry a corrective hint for stderr and terminate with exit code 2.

use clap::{Parser, Subcommand};
use reel_core::PipelineStage;
use std::path::PathBuf;
use thiserror::Error;

/// reel - turn a source video into a short vertical reel
#[derive(Debug, Parser)]
#[command(name = "reel", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one request through the pipeline in the foreground
    Run(RunArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Source video URL
    pub url: String,

    /// Free-text guidance forwarded to the agents
    #[arg(long, short, default_value = "")]
    pub message: String,

    /// Target duration of the final reel, in seconds
    #[arg(long = "target-duration", value_name = "S")]
    pub target_duration: Option<u32>,

    /// Number of narrative moments to extract
    #[arg(long, value_name = "N")]
    pub moments: Option<u32>,

    /// Workspace directory of a previous run to resume
    #[arg(long, value_name = "PATH")]
    pub resume: Option<PathBuf>,

    /// One-based stage to start from (requires --resume when > 1)
    #[arg(long = "start-stage", value_name = "K")]
    pub start_stage: Option<usize>,

    /// Agent timeout in seconds
    #[arg(long, value_name = "S")]
    pub timeout: Option<u64>,
}

/// Precondition violations. `hint` tells the user how to fix the call.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UserArgumentError {
    pub message: String,
    pub hint: String,
}

impl UserArgumentError {
    fn new(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: hint.into(),
        }
    }
}

impl RunArgs {
    /// Enforce the resume preconditions.
    pub fn validate(&self) -> Result<(), UserArgumentError> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(UserArgumentError::new(
                format!("'{}' is not an http(s) URL", self.url),
                "pass the source video URL as the first argument",
            ));
        }
        if let Some(stage) = self.start_stage {
            if stage < 1 || stage > PipelineStage::COUNT {
                return Err(UserArgumentError::new(
                    format!(
                        "--start-stage {} is out of range (1..={})",
                        stage,
                        PipelineStage::COUNT
                    ),
                    "stages are numbered 1 (ROUTER) through 9 (DELIVERY)",
                ));
            }
            if stage > 1 && self.resume.is_none() {
                return Err(UserArgumentError::new(
                    "--start-stage > 1 requires --resume",
                    "point --resume at the workspace directory of the run to continue",
                ));
            }
        }
        if let Some(resume) = &self.resume {
            if !resume.is_dir() {
                return Err(UserArgumentError::new(
                    format!("resume path does not exist: {}", resume.display()),
                    "pass an existing workspace directory, e.g. workspace/runs/<run-id>",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
