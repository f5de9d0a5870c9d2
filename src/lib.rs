//! Preprocessing and segmentation verification for historical-document OCR.
//!
//! Two independent pipelines share the image I/O conventions in [`imaging`]:
//! the batch [`cleaner`] (dedup, quality gate, grayscale, mirrored output) and
//! the [`segmentation`] orchestrator, which drives an external
//! binarization/segmentation tool and renders an [`overlay`] of the detected
//! line regions.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod imaging;
pub mod overlay;
pub mod quality;
pub mod segmentation;

pub use cleaner::{clean, CleanReport, Cleaner, DedupSet, FileOutcome, ThreadingMode};
pub use config::{CleanConfig, SegmentConfig};
pub use error::PipelineError;
pub use fingerprint::{fingerprint, Fingerprint};
pub use overlay::{render_overlay, render_overlay_file, OverlayReport};
pub use quality::{intensity_variance, is_low_quality, DEFAULT_QUALITY_THRESHOLD};
pub use segmentation::{
    SegmentationArtifacts, SegmentationFailure, SegmentationOrchestrator, SegmentationResult,
    Stage,
};
