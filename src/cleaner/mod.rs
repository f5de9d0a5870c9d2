//! Batch cleaning of a raw scan tree.
//!
//! Every allow-listed image under the raw root is decoded, fingerprinted,
//! deduplicated against the run's `DedupSet`, converted to grayscale and
//! quality-gated. Survivors are written to the same relative path under the
//! cleaned root. Per-file failures are counted and never abort the batch.

pub mod dedup;
pub mod report;
pub mod walk;

pub use dedup::DedupSet;
pub use report::{CleanReport, FileOutcome};
pub use walk::{collect_candidates, Candidates};

use crate::config::CleanConfig;
use crate::error::PipelineError;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::imaging;
use crate::quality::is_low_quality;
use image::{DynamicImage, GrayImage};
use rayon::prelude::*;
use self::report::ReportCounters;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadingMode {
    /// Decoding, hashing and saving are spread over the rayon pool.
    /// Duplicates are settled in sorted order, so the first copy is kept
    Parallel,
    /// Files are processed one at a time in sorted order
    Sequential,
}

/// A decoded page that survived hashing
struct Scanned {
    digest: Fingerprint,
    gray: GrayImage,
    low_quality: bool,
}

/// One cleaning run. The dedup set lives and dies with the cleaner.
pub struct Cleaner {
    config: CleanConfig,
    seen: DedupSet,
    counters: ReportCounters,
}

impl Cleaner {
    pub fn new(config: CleanConfig) -> Self {
        Self {
            config,
            seen: DedupSet::new(),
            counters: ReportCounters::default(),
        }
    }

    /// Fingerprints recorded so far in this run
    pub fn seen(&self) -> &DedupSet {
        &self.seen
    }

    /// Clean the whole raw tree and return the aggregate report
    pub fn run(self) -> Result<CleanReport, PipelineError> {
        if !self.config.raw_root.is_dir() {
            return Err(PipelineError::InvalidInput(format!(
                "raw root is not a directory: {}",
                self.config.raw_root.display()
            )));
        }
        fs::create_dir_all(&self.config.cleaned_root)
            .map_err(|e| PipelineError::io(&self.config.cleaned_root, e))?;

        let candidates = collect_candidates(&self.config.raw_root);
        tracing::info!(
            "Cleaning {} candidate images from {} into {}",
            candidates.files.len(),
            self.config.raw_root.display(),
            self.config.cleaned_root.display()
        );

        match self.config.threading {
            ThreadingMode::Parallel => self.run_parallel(&candidates.files),
            ThreadingMode::Sequential => candidates.files.iter().for_each(|path| {
                self.process_file(path);
            }),
        }

        let report = self
            .counters
            .snapshot(candidates.ignored, candidates.walk_errors);
        tracing::info!(
            "Cleaning finished: {} processed, {} saved, {} duplicate, {} low quality, {} unreadable, {} hash errors",
            report.processed,
            report.saved,
            report.duplicate,
            report.low_quality,
            report.unreadable,
            report.hash_error
        );
        Ok(report)
    }

    /// Hash and gate in parallel, settle duplicates in path order, then save
    /// the survivors in parallel
    fn run_parallel(&self, files: &[PathBuf]) {
        let scans: Vec<Result<(Fingerprint, bool), FileOutcome>> = files
            .par_iter()
            .map(|path| {
                self.scan(path)
                    .map(|scanned| (scanned.digest, scanned.low_quality))
            })
            .collect();

        let mut survivors = Vec::new();
        for (path, scan) in files.iter().zip(scans) {
            let outcome = match scan {
                Err(outcome) => outcome,
                Ok((digest, low_quality)) => match self.admit(path, digest, low_quality) {
                    Some(outcome) => outcome,
                    None => {
                        survivors.push(path);
                        continue;
                    }
                },
            };
            self.counters.record(&outcome);
        }

        // Grayscale pages are rebuilt here rather than held through the
        // ordering pass
        survivors.par_iter().for_each(|path| {
            let outcome = match imaging::decode(path) {
                Ok(image) => self.store(path, imaging::to_grayscale(&image)),
                Err(error) => {
                    tracing::warn!("Skipping unreadable image: {}", error);
                    FileOutcome::Unreadable
                }
            };
            self.counters.record(&outcome);
        });
    }

    /// Run one file through decode, dedup, quality gate and save
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        match imaging::decode(path) {
            Ok(image) => self.process_image(path, &image),
            Err(error) => {
                tracing::warn!("Skipping unreadable image: {}", error);
                self.counters.record(&FileOutcome::Unreadable);
                FileOutcome::Unreadable
            }
        }
    }

    /// Run a page already decoded from `path` through hash, dedup, quality
    /// gate and save
    pub fn process_image(&self, path: &Path, image: &DynamicImage) -> FileOutcome {
        let outcome = match self.inspect(path, image) {
            Ok(scanned) => match self.admit(path, scanned.digest, scanned.low_quality) {
                Some(outcome) => outcome,
                None => self.store(path, scanned.gray),
            },
            Err(outcome) => outcome,
        };
        self.counters.record(&outcome);
        outcome
    }

    fn scan(&self, path: &Path) -> Result<Scanned, FileOutcome> {
        match imaging::decode(path) {
            Ok(image) => self.inspect(path, &image),
            Err(error) => {
                tracing::warn!("Skipping unreadable image: {}", error);
                Err(FileOutcome::Unreadable)
            }
        }
    }

    fn inspect(&self, path: &Path, image: &DynamicImage) -> Result<Scanned, FileOutcome> {
        let digest = fingerprint(image).map_err(|error| {
            tracing::warn!(
                "Error computing hash for {}, skipping: {}",
                path.display(),
                error
            );
            FileOutcome::HashError
        })?;

        let gray = imaging::to_grayscale(image);
        let low_quality = is_low_quality(&gray, self.config.quality_threshold);
        Ok(Scanned {
            digest,
            gray,
            low_quality,
        })
    }

    /// Settle a hashed page against the dedup set and the quality gate.
    /// `None` means the page should be saved.
    fn admit(&self, path: &Path, digest: Fingerprint, low_quality: bool) -> Option<FileOutcome> {
        if !self.seen.insert(digest) {
            tracing::info!("Duplicate found, skipping {}", path.display());
            return Some(FileOutcome::Duplicate);
        }

        // Rejected pages stay in the dedup set so later copies are not retried
        if low_quality {
            tracing::info!("Low quality image detected, skipping: {}", path.display());
            return Some(FileOutcome::LowQuality);
        }
        None
    }

    fn store(&self, path: &Path, gray: GrayImage) -> FileOutcome {
        let destination = match self.destination(path) {
            Some(destination) => destination,
            None => {
                tracing::warn!("{} is outside the raw root", path.display());
                return FileOutcome::WriteError;
            }
        };

        match self.persist(DynamicImage::ImageLuma8(gray), &destination) {
            Ok(()) => {
                tracing::debug!("Saved cleaned image: {}", destination.display());
                FileOutcome::Saved(destination)
            }
            Err(error) => {
                tracing::warn!("Failed to save cleaned image: {}", error);
                FileOutcome::WriteError
            }
        }
    }

    /// Mirror a raw path under the cleaned root
    pub fn destination(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.config.raw_root)
            .ok()
            .map(|relative| self.config.cleaned_root.join(relative))
    }

    fn persist(&self, image: DynamicImage, destination: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = destination.parent() {
            // create_dir_all tolerates directories created by other workers
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        imaging::save_matching_extension(&image, destination)
    }
}

/// Clean `raw_root` into `cleaned_root` with sequential, reproducible ordering
pub fn clean(
    raw_root: &Path,
    cleaned_root: &Path,
    quality_threshold: f64,
) -> Result<CleanReport, PipelineError> {
    let config = CleanConfig::new(raw_root, cleaned_root)
        .with_quality_threshold(quality_threshold)
        .with_threading(ThreadingMode::Sequential);
    Cleaner::new(config).run()
}
