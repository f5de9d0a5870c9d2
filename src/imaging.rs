//! Image I/O conventions shared by the cleaning and segmentation pipelines.

use crate::error::PipelineError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Extensions (lowercase) accepted as raw scan input
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

/// JPEG quality used when a cleaned image must keep a `.jpg` name
const JPEG_QUALITY: u8 = 100;

/// Returns true when the file extension is on the input allow-list
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|candidate| *candidate == lower)
        })
        .unwrap_or(false)
}

/// Decode an image file, sniffing the format from its content
pub fn decode(path: &Path) -> Result<DynamicImage, PipelineError> {
    let decode_err = |message: String| PipelineError::Decode {
        path: path.to_path_buf(),
        message,
    };

    image::ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}

/// Convert to single-channel 8-bit grayscale.
///
/// Colour pages use the BT.601 weights (0.299 R + 0.587 G + 0.114 B) in
/// 14-bit fixed point, rounded. Grayscale inputs keep their values and any
/// alpha channel is dropped.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if !image.color().has_color() {
        return image.to_luma8();
    }

    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let weighted = u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868;
        Luma([((weighted + (1 << 13)) >> 14) as u8])
    })
}

/// Persist an image using the codec implied by the destination extension.
///
/// PNG and TIFF are lossless. JPEG destinations are written at maximum
/// quality so the mirrored file name stays valid for its container.
pub fn save_matching_extension(image: &DynamicImage, path: &Path) -> Result<(), PipelineError> {
    let save_err = |message: String| PipelineError::Save {
        path: path.to_path_buf(),
        message,
    };

    let format = ImageFormat::from_path(path).map_err(|e| save_err(e.to_string()))?;
    match format {
        ImageFormat::Jpeg => {
            let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
            let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
            image
                .write_with_encoder(encoder)
                .map_err(|e| save_err(e.to_string()))
        }
        _ => image
            .save_with_format(path, format)
            .map_err(|e| save_err(e.to_string())),
    }
}

/// Persist an image as PNG regardless of the destination extension
pub fn save_png(image: &DynamicImage, path: &Path) -> Result<(), PipelineError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| PipelineError::Save {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
