// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbook step executors.

use async_trait::async_trait;
use sentinel_core::RunbookStep;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Cap on captured step output retained in the run record.
const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Errors from step execution.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("step timed out after {0:?}")]
    Timeout(Duration),
    #[error("step cancelled")]
    Cancelled,
    #[error("failed to spawn step: {0}")]
    Spawn(String),
    #[error("step exited with {code:?}")]
    Failed { code: Option<i32>, output: String },
}

/// Executes one runbook step.
#[async_trait]
pub trait StepExecutor: Send + Sync + 'static {
    /// Run the step to completion, honoring the per-step timeout and the
    /// parent cancellation token. Returns captured output.
    async fn execute(
        &self,
        step: &RunbookStep,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, ExecError>;
}

/// Default executor: runs the step command through `sh -c`.
#[derive(Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

fn truncate_output(mut text: String) -> String {
    if text.len() > MAX_OUTPUT_BYTES {
        let mut cut = MAX_OUTPUT_BYTES;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[async_trait]
impl StepExecutor for ShellExecutor {
    async fn execute(
        &self,
        step: &RunbookStep,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, ExecError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(&step.command).kill_on_drop(true);

        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(ExecError::Cancelled),
            result = tokio::time::timeout(timeout, cmd.output()) => match result {
                Err(_) => return Err(ExecError::Timeout(timeout)),
                Ok(Err(e)) => return Err(ExecError::Spawn(e.to_string())),
                Ok(Ok(output)) => output,
            },
        };

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&stderr);
            }
            return Err(ExecError::Failed {
                code: output.status.code(),
                output: truncate_output(text),
            });
        }
        Ok(truncate_output(text))
    }
}


#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
