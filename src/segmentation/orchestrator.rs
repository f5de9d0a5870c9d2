use super::result::SegmentationResult;
use super::tool::{remove_stale, ExternalTool, ToolVerb};
use super::Stage;
use crate::config::SegmentConfig;
use crate::error::PipelineError;
use crate::imaging;
use crate::overlay::{render_overlay, OverlayReport};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Artifact locations for one input, keyed by its base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub binarized: PathBuf,
    pub segmentation: PathBuf,
    pub overlay: PathBuf,
}

impl OutputPaths {
    pub fn for_input(input: &Path, output_dir: &Path) -> Result<Self, PipelineError> {
        let base = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                PipelineError::InvalidInput(format!("no usable file name in {}", input.display()))
            })?;

        Ok(Self {
            binarized: output_dir.join(format!("{base}_binarized.png")),
            segmentation: output_dir.join(format!("{base}_segmentation.json")),
            overlay: output_dir.join(format!("{base}_overlay.png")),
        })
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct SegmentationArtifacts {
    pub paths: OutputPaths,
    pub result: SegmentationResult,
    pub overlay: OverlayReport,
}

/// A run that stopped, and the stage it stopped in
#[derive(Error, Debug)]
#[error("segmentation failed while {stage}: {source}")]
pub struct SegmentationFailure {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, SegmentationFailure>;
}

impl<T> AtStage<T> for Result<T, PipelineError> {
    fn at(self, stage: Stage) -> Result<T, SegmentationFailure> {
        self.map_err(|source| SegmentationFailure { stage, source })
    }
}

/// Drives binarize → segment → parse → render for single page images
pub struct SegmentationOrchestrator {
    output_dir: PathBuf,
    tool: ExternalTool,
}

impl SegmentationOrchestrator {
    pub fn new(config: &SegmentConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            tool: ExternalTool::from(config),
        }
    }

    pub fn with_tool(output_dir: impl Into<PathBuf>, tool: ExternalTool) -> Self {
        Self {
            output_dir: output_dir.into(),
            tool,
        }
    }

    /// Run the full pipeline for one input image
    pub async fn segment(&self, input: &Path) -> Result<SegmentationArtifacts, SegmentationFailure> {
        if !input.is_file() {
            return Err(PipelineError::InvalidInput(format!(
                "input image does not exist: {}",
                input.display()
            )))
            .at(Stage::Preparing);
        }
        let paths = OutputPaths::for_input(input, &self.output_dir).at(Stage::Preparing)?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PipelineError::io(&self.output_dir, e))
            .at(Stage::Preparing)?;
        remove_stale(&paths.overlay).await.at(Stage::Preparing)?;
        tracing::info!(
            "Segmenting {} with {}",
            input.display(),
            self.tool.program()
        );

        self.tool
            .invoke(ToolVerb::Binarize, input, &paths.binarized)
            .await
            .at(Stage::Binarizing)?;
        tracing::info!("Binarized image saved to {}", paths.binarized.display());

        self.tool
            .invoke(ToolVerb::Segment, &paths.binarized, &paths.segmentation)
            .await
            .at(Stage::Segmenting)?;
        tracing::info!("Segmentation JSON saved to {}", paths.segmentation.display());

        let result = SegmentationResult::load(&paths.segmentation).at(Stage::Parsing)?;
        tracing::info!("Found {} segmented lines", result.lines.len());

        // Decoding and encoding the page are CPU bound
        let (job_paths, job_result) = (paths.clone(), result.clone());
        let overlay = tokio::task::spawn_blocking(move || render_to(&job_paths, &job_result))
            .await
            .map_err(|e| PipelineError::Save {
                path: paths.overlay.clone(),
                message: format!("render task failed: {e}"),
            })
            .and_then(|rendered| rendered)
            .at(Stage::Rendering)?;
        tracing::info!(
            "Overlay image saved as {} ({} drawn, {} skipped)",
            paths.overlay.display(),
            overlay.drawn,
            overlay.skipped.len()
        );

        Ok(SegmentationArtifacts {
            paths,
            result,
            overlay,
        })
    }
}

fn render_to(
    paths: &OutputPaths,
    result: &SegmentationResult,
) -> Result<OverlayReport, PipelineError> {
    let mut canvas = imaging::decode(&paths.binarized)?.to_rgb8();
    let report = render_overlay(&mut canvas, result);
    imaging::save_png(&DynamicImage::ImageRgb8(canvas), &paths.overlay)?;
    Ok(report)
}
