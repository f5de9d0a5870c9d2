//! Low-information page detection.
//!
//! Blank pages and solid scanner artifacts have almost no intensity spread,
//! so the population variance of a grayscale page is used as the signal.

use image::GrayImage;

/// Variance below which a page is rejected
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 10.0;

/// Population variance of pixel intensities (0.0 for an empty image)
pub fn intensity_variance(image: &GrayImage) -> f64 {
    let count = image.width() as usize * image.height() as usize;
    if count == 0 {
        return 0.0;
    }

    let n = count as f64;
    let mean = image.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
    image
        .pixels()
        .map(|p| {
            let d = p.0[0] as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

/// True when the page should be rejected (variance strictly below threshold)
pub fn is_low_quality(image: &GrayImage, threshold: f64) -> bool {
    intensity_variance(image) < threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Half the pixels at `low`, half at `high`; variance is ((high - low) / 2)^2
    fn two_tone(low: u8, high: u8) -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([low]) } else { Luma([high]) })
    }

    #[test]
    fn test_solid_gray_is_rejected() {
        let img = GrayImage::from_pixel(100, 100, Luma([128]));
        assert_eq!(intensity_variance(&img), 0.0);
        assert!(is_low_quality(&img, DEFAULT_QUALITY_THRESHOLD));
    }

    #[test]
    fn test_variance_at_threshold_is_kept() {
        let img = two_tone(0, 6);
        assert_eq!(intensity_variance(&img), 9.0);
        assert!(!is_low_quality(&img, 9.0));
    }

    #[test]
    fn test_variance_just_below_threshold_is_rejected() {
        let img = two_tone(0, 6);
        assert!(is_low_quality(&img, 9.000_001));
        assert!(is_low_quality(&two_tone(0, 4), 9.0));
    }

    #[test]
    fn test_text_like_page_passes_default() {
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20]));
        }
        assert!(!is_low_quality(&img, DEFAULT_QUALITY_THRESHOLD));
    }

    #[test]
    fn test_empty_image_has_zero_variance() {
        assert_eq!(intensity_variance(&GrayImage::new(0, 0)), 0.0);
    }
}
