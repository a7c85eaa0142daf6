//! Fidelity and size metrics of a reconstructed image.
//!
//! The compressed size counts one codeword index per pixel against three
//! bytes per original pixel.

use image::RgbImage;
use serde::Serialize;

use crate::error::{Result, VqError};

const PEAK: f64 = 255.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CompressionMetrics {
    pub mse: f64,
    /// `+inf` for identical images (serialized as `null`).
    pub psnr: f64,
    pub compression_ratio: f64,
}

impl CompressionMetrics {
    pub fn compute(original: &RgbImage, compressed: &RgbImage) -> Result<Self> {
        let mse = mse(original, compressed)?;
        Ok(Self {
            mse,
            psnr: psnr(mse),
            compression_ratio: compression_ratio(original, compressed),
        })
    }
}

/// Mean squared error over every sample of every channel.
pub fn mse(original: &RgbImage, compressed: &RgbImage) -> Result<f64> {
    if original.dimensions() != compressed.dimensions() {
        let (expected_width, expected_height) = original.dimensions();
        let (actual_width, actual_height) = compressed.dimensions();
        return Err(VqError::DimensionMismatch {
            expected_width,
            expected_height,
            actual_width,
            actual_height,
        });
    }

    let samples = original.as_raw().len();
    if samples == 0 {
        return Ok(0.0);
    }
    let sum: f64 = original
        .as_raw()
        .iter()
        .zip(compressed.as_raw())
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum();
    Ok(sum / samples as f64)
}

pub fn psnr(mse: f64) -> f64 {
    if mse == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (PEAK * PEAK / mse).log10()
}

pub fn compression_ratio(original: &RgbImage, compressed: &RgbImage) -> f64 {
    let original_size = original.width() as u64 * original.height() as u64 * 3;
    let compressed_size = compressed.width() as u64 * compressed.height() as u64;
    original_size as f64 / compressed_size as f64
}
