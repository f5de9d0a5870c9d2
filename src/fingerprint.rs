//! Content fingerprints for exact-duplicate detection.
//!
//! A fingerprint is the SHA-256 of the image converted to 8-bit RGB and
//! re-encoded as PNG, so two files that show the same pixels match regardless
//! of name, path, source container, or stored colour type.

use crate::error::PipelineError;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Cursor;

/// Lowercase hex digest of an image's canonical PNG encoding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a decoded image
pub fn fingerprint(image: &DynamicImage) -> Result<Fingerprint, PipelineError> {
    let canonical = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut encoded = Vec::new();
    canonical
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .map_err(|e| PipelineError::Encoding(e.to_string()))?;

    Ok(Fingerprint(hash_bytes(&encoded)))
}

fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(32, 16, |x, y| Luma([(x * 7 + y * 3) as u8])))
    }

    #[test]
    fn test_fingerprint_is_stable_across_calls() {
        let img = page();
        assert_eq!(fingerprint(&img).unwrap(), fingerprint(&img.clone()).unwrap());
    }

    #[test]
    fn test_fingerprint_is_fixed_length_hex() {
        let digest = fingerprint(&page()).unwrap();
        assert_eq!(digest.as_str().len(), 64);
        assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_single_pixel_change_alters_fingerprint() {
        let original = page();
        let mut altered = original.to_luma8();
        altered.put_pixel(0, 0, Luma([255]));

        assert_ne!(
            fingerprint(&original).unwrap(),
            fingerprint(&DynamicImage::ImageLuma8(altered)).unwrap()
        );
    }

    #[test]
    fn test_grayscale_and_rgb_copies_match() {
        let gray = page();
        let rgb = DynamicImage::ImageRgb8(gray.to_rgb8());
        assert_eq!(fingerprint(&gray).unwrap(), fingerprint(&rgb).unwrap());
    }

    #[test]
    fn test_empty_image_is_encoding_error() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let err = fingerprint(&empty).unwrap_err();
        assert!(matches!(err, PipelineError::Encoding(_)));
    }

    #[test]
    fn test_same_pixels_from_different_files_match() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::from_fn(12, 12, |x, y| Rgb([x as u8 * 20, y as u8 * 20, 7]));
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.tiff");
        img.save(&first).unwrap();
        img.save(&second).unwrap();

        let a = crate::imaging::decode(&first).unwrap();
        let b = crate::imaging::decode(&second).unwrap();
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }
}
