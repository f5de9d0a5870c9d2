use crate::error::PipelineError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// What happened to a single candidate file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Written to the cleaned tree at this path
    Saved(PathBuf),
    Duplicate,
    LowQuality,
    Unreadable,
    HashError,
    /// Passed every gate but could not be persisted
    WriteError,
}

/// Aggregate counts for one cleaning run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// Candidate images attempted (allow-listed extensions)
    pub processed: usize,
    pub saved: usize,
    pub duplicate: usize,
    pub low_quality: usize,
    pub unreadable: usize,
    pub hash_error: usize,
    pub write_error: usize,
    /// Regular files skipped for their extension
    pub ignored: usize,
    /// Directory entries the walker could not read
    pub walk_errors: usize,
}

impl CleanReport {
    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| PipelineError::io(path, e.into()))?;
        // Dropping a BufWriter discards its flush error
        writer.flush().map_err(|e| PipelineError::io(path, e))
    }
}

/// Lock-free counters shared by cleaning workers
#[derive(Debug, Default)]
pub(crate) struct ReportCounters {
    processed: AtomicUsize,
    saved: AtomicUsize,
    duplicate: AtomicUsize,
    low_quality: AtomicUsize,
    unreadable: AtomicUsize,
    hash_error: AtomicUsize,
    write_error: AtomicUsize,
}

impl ReportCounters {
    pub(crate) fn record(&self, outcome: &FileOutcome) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            FileOutcome::Saved(_) => &self.saved,
            FileOutcome::Duplicate => &self.duplicate,
            FileOutcome::LowQuality => &self.low_quality,
            FileOutcome::Unreadable => &self.unreadable,
            FileOutcome::HashError => &self.hash_error,
            FileOutcome::WriteError => &self.write_error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, ignored: usize, walk_errors: usize) -> CleanReport {
        CleanReport {
            processed: self.processed.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            low_quality: self.low_quality.load(Ordering::Relaxed),
            unreadable: self.unreadable.load(Ordering::Relaxed),
            hash_error: self.hash_error.load(Ordering::Relaxed),
            write_error: self.write_error.load(Ordering::Relaxed),
            ignored,
            walk_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_tally_each_outcome() {
        let counters = ReportCounters::default();
        counters.record(&FileOutcome::Saved(PathBuf::from("a.png")));
        counters.record(&FileOutcome::Duplicate);
        counters.record(&FileOutcome::Duplicate);
        counters.record(&FileOutcome::LowQuality);
        counters.record(&FileOutcome::Unreadable);

        let report = counters.snapshot(3, 1);
        assert_eq!(report.processed, 5);
        assert_eq!(report.saved, 1);
        assert_eq!(report.duplicate, 2);
        assert_eq!(report.low_quality, 1);
        assert_eq!(report.unreadable, 1);
        assert_eq!(report.hash_error, 0);
        assert_eq!(report.ignored, 3);
        assert_eq!(report.walk_errors, 1);
    }

    #[test]
    fn test_report_serializes_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = CleanReport {
            processed: 2,
            saved: 1,
            duplicate: 1,
            ..Default::default()
        };

        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["saved"], 1);
        assert_eq!(value["duplicate"], 1);
        assert_eq!(value["low_quality"], 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_report_write_surfaces_flush_failure() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        // The whole report fits in the buffer, so the failure only shows on flush
        let err = CleanReport::default()
            .write_json(Path::new("/dev/full"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
