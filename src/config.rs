use crate::cleaner::ThreadingMode;
use crate::quality::DEFAULT_QUALITY_THRESHOLD;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the `clean` subcommand
#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Root directory of raw scans (searched recursively)
    pub raw_root: PathBuf,

    /// Root directory the cleaned tree is mirrored into
    #[arg(long, env = "PREP_CLEANED_ROOT", default_value = "data/cleaned")]
    pub output: PathBuf,

    /// Pages with intensity variance below this are rejected
    #[arg(long, env = "PREP_QUALITY_THRESHOLD", default_value_t = DEFAULT_QUALITY_THRESHOLD)]
    pub threshold: f64,

    /// Process files one at a time instead of across a worker pool
    #[arg(long)]
    pub no_thread: bool,

    /// Also write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the `segment` subcommand
#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    /// Page image to binarize and segment
    pub input: PathBuf,

    /// Directory receiving the binarized image, result JSON and overlay
    #[arg(long, env = "PREP_OUTPUT_DIR", default_value = "data")]
    pub output_dir: PathBuf,

    /// Segmentation tool executable
    #[arg(long, env = "PREP_SEGMENT_TOOL", default_value = "kraken")]
    pub tool: String,

    /// Per-invocation time limit for the tool, in seconds
    #[arg(long, env = "PREP_TOOL_TIMEOUT", default_value = "300")]
    pub timeout_secs: u64,

    /// Extra attempts after a failed tool invocation
    #[arg(long, env = "PREP_TOOL_RETRIES", default_value = "0")]
    pub retries: u32,
}

/// Arguments for the standalone `overlay` subcommand
#[derive(Args, Debug, Clone)]
pub struct OverlayArgs {
    /// Segmentation result JSON
    pub segmentation: PathBuf,

    /// Image the boxes are drawn over
    pub image: PathBuf,

    /// Where to write the overlay PNG
    pub output: PathBuf,
}

/// Batch cleaning configuration
#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub raw_root: PathBuf,
    pub cleaned_root: PathBuf,
    pub quality_threshold: f64,
    pub threading: ThreadingMode,
}

impl CleanConfig {
    pub fn new(raw_root: impl Into<PathBuf>, cleaned_root: impl Into<PathBuf>) -> Self {
        Self {
            raw_root: raw_root.into(),
            cleaned_root: cleaned_root.into(),
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            threading: ThreadingMode::Parallel,
        }
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_threading(mut self, threading: ThreadingMode) -> Self {
        self.threading = threading;
        self
    }
}

impl From<CleanArgs> for CleanConfig {
    fn from(args: CleanArgs) -> Self {
        let threading = if args.no_thread {
            ThreadingMode::Sequential
        } else {
            ThreadingMode::Parallel
        };
        Self::new(args.raw_root, args.output)
            .with_quality_threshold(args.threshold)
            .with_threading(threading)
    }
}

/// Segmentation orchestration configuration
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    pub output_dir: PathBuf,
    pub tool: String,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl SegmentConfig {
    pub fn new(output_dir: impl Into<PathBuf>, tool: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            tool: tool.into(),
            timeout: Duration::from_secs(300),
            retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

impl From<&SegmentArgs> for SegmentConfig {
    fn from(args: &SegmentArgs) -> Self {
        Self::new(args.output_dir.clone(), args.tool.clone())
            .with_timeout(Duration::from_secs(args.timeout_secs))
            .with_retries(args.retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_thread_selects_sequential() {
        let args = CleanArgs {
            raw_root: PathBuf::from("data/raw"),
            output: PathBuf::from("data/cleaned"),
            threshold: 12.5,
            no_thread: true,
            report: None,
        };
        let config = CleanConfig::from(args);
        assert_eq!(config.threading, ThreadingMode::Sequential);
        assert_eq!(config.quality_threshold, 12.5);
        assert_eq!(config.cleaned_root, PathBuf::from("data/cleaned"));
    }

    #[test]
    fn test_segment_args_map_timeout_and_retries() {
        let args = SegmentArgs {
            input: PathBuf::from("page.png"),
            output_dir: PathBuf::from("out"),
            tool: "kraken".to_string(),
            timeout_secs: 30,
            retries: 2,
        };
        let config = SegmentConfig::from(&args);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retries, 2);
        assert_eq!(config.tool, "kraken");
    }
}
