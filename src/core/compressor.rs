use image::RgbImage;
use serde::Serialize;

use crate::error::Result;

use super::codebook::ChannelCodebooks;
use super::color;
use super::quantizer::Quantizer;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompressionPath {
    /// Quantize the RGB samples directly.
    Rgb,
    /// Forward transform, 2x chroma subsample, quantize, then invert.
    Yuv,
}

impl CompressionPath {
    pub const ALL: [CompressionPath; 2] = [CompressionPath::Rgb, CompressionPath::Yuv];

    pub const fn name(self) -> &'static str {
        match self {
            CompressionPath::Rgb => "rgb",
            CompressionPath::Yuv => "yuv",
        }
    }
}

pub struct ImageCompressor<'a> {
    rgb: Quantizer<'a>,
    yuv: Quantizer<'a>,
}

impl<'a> ImageCompressor<'a> {
    /// `yuv_codebooks` may be the RGB set itself.
    pub fn new(rgb_codebooks: &'a ChannelCodebooks, yuv_codebooks: &'a ChannelCodebooks) -> Self {
        Self {
            rgb: Quantizer::new(rgb_codebooks),
            yuv: Quantizer::new(yuv_codebooks),
        }
    }

    pub fn compress(&self, image: &RgbImage, path: CompressionPath) -> Result<RgbImage> {
        match path {
            CompressionPath::Rgb => self.compress_rgb(image),
            CompressionPath::Yuv => self.compress_yuv(image),
        }
    }

    pub fn compress_rgb(&self, image: &RgbImage) -> Result<RgbImage> {
        self.rgb.quantize(image)
    }

    /// The subsampled image must itself tile into 2x2 blocks, so the input
    /// needs dimensions divisible by 4.
    pub fn compress_yuv(&self, image: &RgbImage) -> Result<RgbImage> {
        let quantized = self.yuv.quantize(&subsampled_yuv(image))?;
        Ok(color::yuv_to_rgb(&color::upsample(&quantized)))
    }
}

/// The image as the YUV path quantizes it: transformed, then subsampled.
pub fn subsampled_yuv(image: &RgbImage) -> RgbImage {
    color::subsample(&color::rgb_to_yuv(image))
}
