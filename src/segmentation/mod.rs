//! Binarization and line segmentation through an external tool.
//!
//! A run moves through `Preparing → Binarizing → Segmenting → Parsing →
//! Rendering`. Each transition requires the previous step to have produced
//! its artifact; the first failure ends the run and reports its stage.

pub mod orchestrator;
pub mod result;
pub mod tool;

pub use orchestrator::{
    OutputPaths, SegmentationArtifacts, SegmentationFailure, SegmentationOrchestrator,
};
pub use result::{LineRegion, RegionError, SegmentationResult};
pub use tool::{ExternalTool, ToolVerb};

use serde::Serialize;
use std::fmt;

/// Step of a segmentation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Preparing,
    Binarizing,
    Segmenting,
    Parsing,
    Rendering,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Binarizing => "binarizing",
            Self::Segmenting => "segmenting",
            Self::Parsing => "parsing",
            Self::Rendering => "rendering",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
