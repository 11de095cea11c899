// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with a hard deadline.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Run an external tool to completion, capturing its output, giving up
/// at `timeout`.
///
/// Kill-on-drop is set on the command here, unconditionally: when the
/// deadline elapses the output future is dropped and the child receives
/// SIGKILL, instead of running on in the background against the same
/// host resources the throttler is budgeting for new work. Errors are
/// rendered as one descriptive string naming `description`.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    let result = tokio::time::timeout(timeout, cmd.output()).await;
    match result {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(spawn_err)) => Err(format!("{description} failed: {spawn_err}")),
        Err(_) => Err(format!(
            "{description} timed out after {}s",
            timeout.as_secs()
        )),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
