//! Subprocess wrapper for the binarization/segmentation tool.
//!
//! The tool is driven purely through file paths and its exit status:
//! `<program> -i <input> <output> <verb>`, exit code 0 on success,
//! diagnostics on stderr otherwise.

use super::Stage;
use crate::config::SegmentConfig;
use crate::error::PipelineError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolVerb {
    Binarize,
    Segment,
}

impl ToolVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binarize => "binarize",
            Self::Segment => "segment",
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Binarize => Stage::Binarizing,
            Self::Segment => Stage::Segmenting,
        }
    }
}

/// External tool invocation policy
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: String,
    timeout: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl ExternalTool {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the tool, retrying failed or timed-out attempts up to the limit.
    ///
    /// The last attempt's error is returned unchanged, stderr included.
    pub async fn invoke(
        &self,
        verb: ToolVerb,
        input: &Path,
        output: &Path,
    ) -> Result<String, PipelineError> {
        let mut attempt = 0;
        loop {
            match self.invoke_once(verb, input, output).await {
                Ok(stdout) => return Ok(stdout),
                Err(error) if attempt < self.retries && is_retryable(&error) => {
                    attempt += 1;
                    tracing::warn!(
                        "{} attempt {} of {} failed, retrying: {}",
                        verb.as_str(),
                        attempt,
                        self.retries + 1,
                        error
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn invoke_once(
        &self,
        verb: ToolVerb,
        input: &Path,
        output: &Path,
    ) -> Result<String, PipelineError> {
        let stage = verb.stage();
        remove_stale(output).await?;
        tracing::info!(
            "Running command: {} -i {} {} {}",
            self.program,
            input.display(),
            output.display(),
            verb.as_str()
        );

        let child = Command::new(&self.program)
            .arg("-i")
            .arg(input)
            .arg(output)
            .arg(verb.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::ToolLaunch {
                stage,
                message: format!("{}: {}", self.program, e),
            })?;

        // Dropping the future on timeout kills the child
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| PipelineError::ToolTimeout {
                stage,
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| PipelineError::ToolLaunch {
                stage,
                message: e.to_string(),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
            tracing::error!("Command failed with error:\n{}", stderr);
            return Err(PipelineError::ExternalTool {
                stage,
                code: result.status.code(),
                stderr,
            });
        }

        if !output.exists() {
            return Err(PipelineError::ExternalTool {
                stage,
                code: result.status.code(),
                stderr: format!(
                    "tool exited successfully but did not create {}",
                    output.display()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&result.stdout).into_owned())
    }
}

impl From<&SegmentConfig> for ExternalTool {
    fn from(config: &SegmentConfig) -> Self {
        Self::new(config.tool.clone(), config.timeout)
            .with_retries(config.retries, config.retry_delay)
    }
}

/// Drop an artifact left by an earlier run so only a fresh file counts as output
pub(crate) async fn remove_stale(path: &Path) -> Result<(), PipelineError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed stale artifact {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

fn is_retryable(error: &PipelineError) -> bool {
    matches!(
        error,
        PipelineError::ExternalTool { .. } | PipelineError::ToolTimeout { .. }
    )
}
