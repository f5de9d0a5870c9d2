use crate::segmentation::Stage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Failed to re-encode image for fingerprinting: {0}")]
    Encoding(String),

    #[error("External tool failed during {stage} ({}):\n{stderr}", exit_status(.code))]
    ExternalTool {
        stage: Stage,
        code: Option<i32>,
        stderr: String,
    },

    #[error("External tool timed out during {stage} after {seconds}s")]
    ToolTimeout { stage: Stage, seconds: u64 },

    #[error("Failed to launch external tool during {stage}: {message}")]
    ToolLaunch { stage: Stage, message: String },

    #[error("Failed to parse segmentation result {path}: {message}")]
    ResultParse { path: PathBuf, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save image {path}: {message}")]
    Save { path: PathBuf, message: String },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failure_message_carries_stderr() {
        let err = PipelineError::ExternalTool {
            stage: Stage::Binarizing,
            code: Some(2),
            stderr: "kraken: no such file".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("binarizing"));
        assert!(message.contains("kraken: no such file"));
        assert!(message.contains("(exit code 2)"));
        assert!(!message.contains("Some"));
    }

    #[test]
    fn test_signal_death_is_named() {
        let err = PipelineError::ExternalTool {
            stage: Stage::Segmenting,
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("(terminated by signal)"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = PipelineError::io(
            "data/cleaned/p1.png",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("data/cleaned/p1.png"));
    }
}
