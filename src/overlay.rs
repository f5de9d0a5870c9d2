//! Line-region overlay rendering for visual verification of segmentation.
//!
//! Boxes are outlined in pure green, 2 px wide. The outer edge runs through
//! `(x, y)` and `(x + w, y + h)` inclusive and the stroke grows inward.

use crate::error::PipelineError;
use crate::imaging;
use crate::segmentation::{LineRegion, RegionError, SegmentationResult};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;
use std::path::Path;

pub const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const STROKE_WIDTH: u32 = 2;

/// A `lines` entry that was not drawn
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRegion {
    pub index: usize,
    pub reason: RegionError,
}

/// What the renderer drew and what it skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayReport {
    pub drawn: usize,
    pub skipped: Vec<SkippedRegion>,
}

#[derive(Serialize)]
struct SkippedNote<'a> {
    index: usize,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<&'a serde_json::Value>,
}

/// Draw every valid region onto `image` in result order; later boxes draw on top
pub fn render_overlay(image: &mut RgbImage, result: &SegmentationResult) -> OverlayReport {
    let mut report = OverlayReport::default();

    for (index, region) in result.regions().enumerate() {
        match region {
            Ok(region) => {
                draw_region(image, &region);
                report.drawn += 1;
            }
            Err(reason) => {
                let note = SkippedNote {
                    index,
                    reason: reason.to_string(),
                    line: result.lines.get(index),
                };
                tracing::warn!(
                    "Skipping a line segment with invalid bbox: {}",
                    serde_json::to_string(&note).unwrap_or_else(|_| reason.to_string())
                );
                report.skipped.push(SkippedRegion { index, reason });
            }
        }
    }

    report
}

/// Outline one region, clipped to the image
pub fn draw_region(image: &mut RgbImage, region: &LineRegion) {
    let (width, height) = image.dimensions();
    let stroke = STROKE_WIDTH as i64;

    // Edges beyond these bounds are off-canvas for every stroke ring
    let clamp_x = |v: i64| v.clamp(-stroke, width as i64 - 1 + stroke);
    let clamp_y = |v: i64| v.clamp(-stroke, height as i64 - 1 + stroke);

    let (x_end, y_end) = (
        region.x.saturating_add(region.width),
        region.y.saturating_add(region.height),
    );
    let left = clamp_x(region.x.min(x_end));
    let right = clamp_x(region.x.max(x_end));
    let top = clamp_y(region.y.min(y_end));
    let bottom = clamp_y(region.y.max(y_end));

    for ring in 0..stroke {
        let (l, r, t, b) = (left + ring, right - ring, top + ring, bottom - ring);
        if l > r || t > b {
            break;
        }
        let rect = Rect::at(l as i32, t as i32).of_size((r - l + 1) as u32, (b - t + 1) as u32);
        draw_hollow_rect_mut(image, rect, OVERLAY_COLOR);
    }
}

/// Standalone entry point: draw `segmentation` over `image` and save a PNG
pub fn render_overlay_file(
    segmentation: &Path,
    image: &Path,
    output: &Path,
) -> Result<OverlayReport, PipelineError> {
    let result = SegmentationResult::load(segmentation)?;
    tracing::info!("Found {} line segments", result.lines.len());

    let mut canvas = imaging::decode(image)?.to_rgb8();
    let report = render_overlay(&mut canvas, &result);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    imaging::save_png(&DynamicImage::ImageRgb8(canvas), output)?;
    tracing::info!("Overlay image saved as {}", output.display());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn result(value: serde_json::Value) -> SegmentationResult {
        serde_json::from_value(value).unwrap()
    }

    /// Pixels on the two perimeter rings of (x0, y0)-(x1, y1)
    fn ring_pixels(x0: u32, y0: u32, x1: u32, y1: u32) -> HashSet<(u32, u32)> {
        let mut set = HashSet::new();
        for ring in 0..STROKE_WIDTH {
            let (l, t, r, b) = (x0 + ring, y0 + ring, x1 - ring, y1 - ring);
            for x in l..=r {
                set.insert((x, t));
                set.insert((x, b));
            }
            for y in t..=b {
                set.insert((l, y));
                set.insert((r, y));
            }
        }
        set
    }

    #[test]
    fn test_single_box_changes_only_its_outline() {
        let mut img = RgbImage::from_pixel(50, 50, WHITE);
        let report = render_overlay(&mut img, &result(json!({"lines": [{"bbox": [5, 5, 20, 10]}]})));

        assert_eq!(report.drawn, 1);
        assert!(report.skipped.is_empty());

        let expected = ring_pixels(5, 5, 25, 15);
        for (x, y, pixel) in img.enumerate_pixels() {
            if expected.contains(&(x, y)) {
                assert_eq!(*pixel, OVERLAY_COLOR, "expected outline at ({x}, {y})");
            } else {
                assert_eq!(*pixel, WHITE, "unexpected change at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_invalid_boxes_are_skipped_not_fatal() {
        let mut img = RgbImage::from_pixel(40, 40, WHITE);
        let report = render_overlay(
            &mut img,
            &result(json!({
                "lines": [
                    {"bbox": [10, 20, 30]},
                    {"baseline": [[0, 0], [1, 1]]},
                    {"bbox": [2, 2, 5, 5]}
                ]
            })),
        );

        assert_eq!(report.drawn, 1);
        assert_eq!(
            report.skipped,
            vec![
                SkippedRegion { index: 0, reason: RegionError::WrongArity(3) },
                SkippedRegion { index: 1, reason: RegionError::MissingBbox },
            ]
        );
        assert_eq!(*img.get_pixel(2, 2), OVERLAY_COLOR);
    }

    #[test]
    fn test_box_past_the_edge_is_clipped() {
        let mut img = RgbImage::from_pixel(20, 20, WHITE);
        draw_region(&mut img, &LineRegion { x: 15, y: -5, width: 1000, height: 10 });

        assert_eq!(*img.get_pixel(15, 0), OVERLAY_COLOR);
        assert_eq!(*img.get_pixel(16, 5), OVERLAY_COLOR);
        assert_eq!(*img.get_pixel(19, 5), OVERLAY_COLOR);
        assert_eq!(*img.get_pixel(18, 3), WHITE);
    }

    #[test]
    fn test_tiny_box_fills_without_panicking() {
        let mut img = RgbImage::from_pixel(10, 10, WHITE);
        draw_region(&mut img, &LineRegion { x: 3, y: 3, width: 0, height: 1 });

        assert_eq!(*img.get_pixel(3, 3), OVERLAY_COLOR);
        assert_eq!(*img.get_pixel(3, 4), OVERLAY_COLOR);
        assert_eq!(*img.get_pixel(4, 3), WHITE);
    }

    #[test]
    fn test_overlay_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let seg = dir.path().join("seg.json");
        let page = dir.path().join("page.png");
        let out = dir.path().join("nested/overlay.png");
        std::fs::write(&seg, r#"{"lines": [{"bbox": [1, 1, 4, 4]}, {"bbox": [1]}]}"#).unwrap();
        image::GrayImage::from_pixel(10, 10, image::Luma([255])).save(&page).unwrap();

        let report = render_overlay_file(&seg, &page, &out).unwrap();

        assert_eq!(report.drawn, 1);
        assert_eq!(report.skipped.len(), 1);
        let overlay = image::open(&out).unwrap().to_rgb8();
        assert_eq!(*overlay.get_pixel(1, 1), OVERLAY_COLOR);
        assert_eq!(*overlay.get_pixel(0, 0), WHITE);
    }
}
