//! Post-processing and encoding of captured screen regions.
//!
//! Captures leave the service as base64 text of a PNG file. Before encoding
//! the controller may ask for grayscale, or for a black/white image
//! thresholded with Otsu's method (which implies grayscale).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, Luma, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Processing requested for a capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageOptions {
    pub grayscale: bool,
    pub binarize: bool,
}

/// Applies `options` to `image` and returns the PNG file bytes.
pub fn encode_png(image: &RgbaImage, options: ImageOptions) -> Result<Vec<u8>, ImagingError> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);

    if options.grayscale || options.binarize {
        let mut gray = DynamicImage::ImageRgba8(image.clone()).to_luma8();
        if options.binarize {
            let threshold = otsu_threshold(&gray);
            binarize(&mut gray, threshold);
        }
        encoder.write_image(gray.as_raw(), gray.width(), gray.height(), ExtendedColorType::L8)?;
    } else {
        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )?;
    }
    Ok(buffer)
}

/// Standard (padded) base64 of `bytes`.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encodes a capture straight to base64 PNG.
pub fn encode_base64_png(image: &RgbaImage, options: ImageOptions) -> Result<String, ImagingError> {
    encode_png(image, options).map(|png| to_base64(&png))
}

/// Otsu's threshold: the gray level that maximises the between-class variance
/// of the histogram. Pixels strictly above it are foreground.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for Luma([value]) in gray.pixels() {
        histogram[*value as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_variance = 0.0f64;
    let mut background_count = 0u64;
    let mut background_sum = 0.0f64;

    for (level, &count) in histogram.iter().enumerate() {
        background_count += count;
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }
        background_sum += level as f64 * count as f64;

        let background_mean = background_sum / background_count as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_count as f64;
        let spread = background_mean - foreground_mean;
        let variance = background_count as f64 * foreground_count as f64 * spread * spread;

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }
    best_level
}

/// Maps every pixel above `threshold` to 255 and the rest to 0.
pub fn binarize(gray: &mut GrayImage, threshold: u8) {
    for Luma([value]) in gray.pixels_mut() {
        *value = if *value > threshold { 255 } else { 0 };
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
