// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Video tooling ports: download, encode, probe.
//!
//! Each adapter is a thin invocation contract around an external binary
//! (yt-dlp, ffmpeg, ffprobe). Arguments are always passed as discrete
//! argv entries; source URLs and paths never touch a shell.

use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Default ceiling for a source download.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(900);

/// Default ceiling for one encode pass.
pub const ENCODE_TIMEOUT: Duration = Duration::from_secs(1800);

/// Default ceiling for a probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from video tool invocations.
#[derive(Debug, Error)]
pub enum VideoToolError {
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: &'static str, message: String },
    #[error("{tool} produced no output at {path}")]
    MissingOutput { tool: &'static str, path: PathBuf },
}

fn check_output(
    tool: &'static str,
    result: Result<std::process::Output, String>,
) -> Result<std::process::Output, VideoToolError> {
    let output = result.map_err(|message| VideoToolError::ToolFailed { tool, message })?;
    if !output.status.success() {
        return Err(VideoToolError::ToolFailed {
            tool,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Adapter downloading a source video to a local file.
#[async_trait]
pub trait VideoDownload: Clone + Send + Sync + 'static {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), VideoToolError>;
}

/// Adapter running one encode invocation with explicit arguments.
#[async_trait]
pub trait VideoEncode: Clone + Send + Sync + 'static {
    async fn encode(&self, args: &[String]) -> Result<(), VideoToolError>;
}

/// Adapter probing stream metadata as JSON.
#[async_trait]
pub trait VideoProbe: Clone + Send + Sync + 'static {
    async fn probe(&self, path: &Path) -> Result<serde_json::Value, VideoToolError>;
}

/// yt-dlp invocation contract.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl VideoDownload for YtDlpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), VideoToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-playlist")
            .arg("--output")
            .arg(dest)
            .arg("--")
            .arg(url);
        check_output("yt-dlp", run_with_timeout(cmd, self.timeout, "yt-dlp").await)?;
        if !dest.exists() {
            return Err(VideoToolError::MissingOutput {
                tool: "yt-dlp",
                path: dest.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// ffmpeg invocation contract.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: ENCODE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl VideoEncode for FfmpegEncoder {
    async fn encode(&self, args: &[String]) -> Result<(), VideoToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-hide_banner").arg("-y").args(args);
        check_output("ffmpeg", run_with_timeout(cmd, self.timeout, "ffmpeg").await)?;
        Ok(())
    }
}

/// ffprobe invocation contract.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: PROBE_TIMEOUT,
        }
    }
}

#[async_trait]
impl VideoProbe for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<serde_json::Value, VideoToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg("--")
            .arg(path);
        let output = check_output("ffprobe", run_with_timeout(cmd, self.timeout, "ffprobe").await)?;
        serde_json::from_slice(&output.stdout).map_err(|e| VideoToolError::ToolFailed {
            tool: "ffprobe",
            message: format!("unparseable probe output: {e}"),
        })
    }
}

#[cfg(test)]
#[path = "video_tests.rs"]
mod tests;
