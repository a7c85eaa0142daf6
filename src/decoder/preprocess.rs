use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;

/// Resizes decoded images to the canonical resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preprocessor {
    width: u32,
    height: u32,
}

impl Preprocessor {
    /// Odd target dimensions are rounded up so blocks tile exactly.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width + width % 2,
            height: height + height % 2,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bilinear resize; images already at the target size are returned as-is.
    pub fn process(&self, image: RgbImage) -> Result<RgbImage> {
        if image.dimensions() == (self.width, self.height) {
            return Ok(image);
        }

        let (src_w, src_h) = image.dimensions();
        let src = Image::from_vec_u8(src_w, src_h, image.into_raw(), PixelType::U8x3)
            .context("Failed to wrap source image for resizing")?;
        let mut dst = Image::new(self.width, self.height, PixelType::U8x3);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        Resizer::new()
            .resize(&src, &mut dst, &options)
            .with_context(|| {
                format!("Failed to resize {}x{} to {}x{}", src_w, src_h, self.width, self.height)
            })?;

        RgbImage::from_raw(self.width, self.height, dst.into_vec())
            .context("Resized buffer has unexpected length")
    }
}
