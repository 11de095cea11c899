// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent dispatch over a one-shot CLI subprocess.
//!
//! The prompt is written to the agent's stdin and the reply read from
//! stdout. Paths and arguments are passed as discrete argv entries;
//! nothing is ever routed through a shell.

use super::{AgentDispatch, DispatchError, DispatchRequest};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Dispatch adapter spawning an agent CLI per request.
#[derive(Debug, Clone)]
pub struct CliAgentDispatch {
    program: PathBuf,
    base_args: Vec<String>,
    default_model: Option<String>,
}

impl CliAgentDispatch {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: vec!["-p".to_string()],
            default_model: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }
}

#[async_trait]
impl AgentDispatch for CliAgentDispatch {
    async fn dispatch(&self, request: DispatchRequest) -> Result<String, DispatchError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args);
        let model = request.model.as_ref().or(self.default_model.as_ref());
        if let Some(model) = model {
            cmd.arg("--model").arg(model);
        }
        if let Some(workdir) = &request.workdir {
            cmd.current_dir(workdir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), model = ?model, "dispatching agent");

        let mut child = cmd
            .spawn()
            .map_err(|e| DispatchError::ProcessFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.prompt.as_bytes())
                .await
                .map_err(|e| DispatchError::ProcessFailed(e.to_string()))?;
            // Close stdin so the agent sees EOF.
            drop(stdin);
        }

        let output = tokio::time::timeout(request.timeout, child.wait_with_output())
            .await
            .map_err(|_| DispatchError::TimedOut(request.timeout.as_secs()))?
            .map_err(|e| DispatchError::ProcessFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(DispatchError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
