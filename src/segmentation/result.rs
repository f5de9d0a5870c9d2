use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Segmentation output as written by the external tool.
///
/// Only `lines` is read. Other top-level keys are ignored, and each line is
/// kept as raw JSON so one malformed entry cannot fail the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationResult {
    #[serde(default)]
    pub lines: Vec<Value>,
}

/// Line bounding box in pixels, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRegion {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    #[error("line has no bbox")]
    MissingBbox,

    #[error("bbox is not an array")]
    NotAnArray,

    #[error("bbox has {0} values, expected 4")]
    WrongArity(usize),

    #[error("bbox value {0} is not numeric")]
    NonNumeric(usize),
}

impl SegmentationResult {
    /// Read and decode a result file
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let parse_err = |message: String| PipelineError::ResultParse {
            path: path.to_path_buf(),
            message,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| parse_err(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))
    }

    /// Validated regions, in file order
    pub fn regions(&self) -> impl Iterator<Item = Result<LineRegion, RegionError>> + '_ {
        self.lines.iter().map(LineRegion::from_line)
    }
}

impl LineRegion {
    /// Extract the `bbox` of one `lines` entry
    pub fn from_line(line: &Value) -> Result<Self, RegionError> {
        match line.get("bbox") {
            Some(bbox) if !bbox.is_null() => Self::from_bbox(bbox),
            _ => Err(RegionError::MissingBbox),
        }
    }

    /// Parse `[x, y, width, height]`; fractional values truncate toward zero
    pub fn from_bbox(bbox: &Value) -> Result<Self, RegionError> {
        let values = bbox.as_array().ok_or(RegionError::NotAnArray)?;
        if values.len() != 4 {
            return Err(RegionError::WrongArity(values.len()));
        }

        let mut coords = [0i64; 4];
        for (i, value) in values.iter().enumerate() {
            coords[i] = value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
                .ok_or(RegionError::NonNumeric(i))?;
        }

        Ok(Self {
            x: coords[0],
            y: coords[1],
            width: coords[2],
            height: coords[3],
        })
    }
}
