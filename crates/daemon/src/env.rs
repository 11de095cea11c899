// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed settings, loaded once at startup.
//!
//! Every knob arrives through environment variables with sensible
//! defaults under the state directory. Validation happens here and only
//! here: a malformed number or an inconsistent combination refuses
//! startup instead of surfacing mid-run.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from settings loading.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("environment variable {var} is invalid: {message}")]
    InvalidVar { var: &'static str, message: String },
    #[error("no home directory and no REEL_STATE_DIR set")]
    NoStateDir,
}

/// Daemon-wide configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root state directory.
    pub state_dir: PathBuf,
    /// Queue root (inbox/processing/completed live under it).
    pub queue_root: PathBuf,
    /// Workspace runs root.
    pub workspace_root: PathBuf,
    /// User-editable workflow/agent/gate documents.
    pub docs_root: Option<PathBuf>,
    /// YAML knowledge-base file.
    pub knowledge_base: PathBuf,
    /// Agent CLI binary.
    pub agent_program: PathBuf,
    pub agent_timeout: Duration,
    /// Generation service API key; side generation is disabled without it.
    pub generation_api_key: Option<String>,
    /// Ceiling on side clips per run.
    pub clip_count: usize,
    /// Side-generation await timeout.
    pub generation_timeout: Duration,
    /// Pixels to crop off generated clips during post-processing.
    pub clip_crop_px: u32,
    /// Messaging credentials; desktop notifications without them.
    pub messaging_token: Option<String>,
    /// Channel senders allowed to enqueue work.
    pub messaging_allowed_senders: Vec<String>,
    /// Credentials file for the file-delivery service.
    pub delivery_credentials: Option<PathBuf>,
    /// Watchdog window; heartbeats fire at half of it.
    pub watchdog_interval: Duration,
    /// Messaging inbox poll interval.
    pub inbox_poll_interval: Duration,
    /// Log filter, `REEL_LOG`.
    pub log_filter: String,
}

impl Settings {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigurationError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&env)
    }

    /// Load from an explicit map (testable without touching the process
    /// environment).
    pub fn from_map(env: &HashMap<String, String>) -> Result<Self, ConfigurationError> {
        let state_dir = state_dir(env)?;
        let get = |var: &str| env.get(var).filter(|v| !v.is_empty());

        let messaging_token = get("REEL_MESSAGING_TOKEN").cloned();
        let messaging_allowed_senders: Vec<String> = get("REEL_MESSAGING_ALLOWED_SENDERS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        // A messaging channel without a sender allow-list would accept
        // work from anyone who finds the bot.
        if messaging_token.is_some() && messaging_allowed_senders.is_empty() {
            return Err(ConfigurationError::MissingVar(
                "REEL_MESSAGING_ALLOWED_SENDERS",
            ));
        }

        Ok(Self {
            queue_root: get("REEL_QUEUE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("queue")),
            workspace_root: get("REEL_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("workspace/runs")),
            docs_root: get("REEL_DOCS_ROOT").map(PathBuf::from),
            knowledge_base: get("REEL_KNOWLEDGE_BASE")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("config/knowledge.yaml")),
            agent_program: get("REEL_AGENT_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("claude")),
            agent_timeout: duration_s(env, "REEL_AGENT_TIMEOUT_S", 600)?,
            generation_api_key: get("REEL_GENERATION_API_KEY").cloned(),
            clip_count: parse_num(env, "REEL_CLIP_COUNT", 4)?,
            generation_timeout: duration_s(env, "REEL_GENERATION_TIMEOUT_S", 300)?,
            clip_crop_px: parse_num(env, "REEL_CLIP_CROP_PX", 0)?,
            messaging_token,
            messaging_allowed_senders,
            delivery_credentials: get("REEL_DELIVERY_CREDENTIALS").map(PathBuf::from),
            watchdog_interval: duration_s(env, "REEL_WATCHDOG_S", 300)?,
            inbox_poll_interval: duration_s(env, "REEL_INBOX_POLL_S", 3)?,
            log_filter: get("REEL_LOG").cloned().unwrap_or_else(|| "info".to_string()),
            state_dir,
        })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("daemon.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("daemon.log")
    }

    pub fn heartbeat_path(&self) -> PathBuf {
        self.state_dir.join("heartbeat")
    }
}

/// Resolve state directory: REEL_STATE_DIR > XDG_STATE_HOME/reel >
/// ~/.local/state/reel.
fn state_dir(env: &HashMap<String, String>) -> Result<PathBuf, ConfigurationError> {
    if let Some(dir) = env.get("REEL_STATE_DIR").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = env.get("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("reel"));
    }
    dirs::home_dir()
        .map(|home| home.join(".local/state/reel"))
        .ok_or(ConfigurationError::NoStateDir)
}

fn parse_num<T: std::str::FromStr>(
    env: &HashMap<String, String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigurationError>
where
    T::Err: std::fmt::Display,
{
    match env.get(var).filter(|v| !v.is_empty()) {
        Some(value) => value.parse().map_err(|e: T::Err| {
            ConfigurationError::InvalidVar {
                var,
                message: e.to_string(),
            }
        }),
        None => Ok(default),
    }
}

fn duration_s(
    env: &HashMap<String, String>,
    var: &'static str,
    default_s: u64,
) -> Result<Duration, ConfigurationError> {
    Ok(Duration::from_secs(parse_num(env, var, default_s)?))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
