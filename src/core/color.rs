//! RGB <-> YUV conversion and 2x chroma subsampling.
//!
//! YUV images reuse the `Rgb<u8>` pixel layout: Y in the first sample,
//! U + 128 and V + 128 in the second and third.

use image::{Rgb, RgbImage};

const CHROMA_OFFSET: i32 = 128;

/// Forward transform of one pixel. Components are truncated toward zero.
#[inline]
pub fn rgb_to_yuv_pixel(px: &Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = px.0.map(f64::from);

    let y = (0.299 * r + 0.587 * g + 0.114 * b) as i32;
    let u = (-0.147 * r - 0.289 * g + 0.436 * b) as i32;
    let v = (0.615 * r - 0.515 * g - 0.100 * b) as i32;

    // V spans [-157, 157]; the 8-bit plane saturates at its edges.
    Rgb([
        to_sample(y),
        to_sample(u + CHROMA_OFFSET),
        to_sample(v + CHROMA_OFFSET),
    ])
}

/// Inverse transform of one pixel, truncated then clamped to 0..=255.
#[inline]
pub fn yuv_to_rgb_pixel(px: &Rgb<u8>) -> Rgb<u8> {
    let y = px.0[0] as f64;
    let u = (px.0[1] as i32 - CHROMA_OFFSET) as f64;
    let v = (px.0[2] as i32 - CHROMA_OFFSET) as f64;

    let r = (y + 1.140 * v) as i32;
    let g = (y - 0.395 * u - 0.581 * v) as i32;
    let b = (y + 2.032 * u) as i32;

    Rgb([to_sample(r), to_sample(g), to_sample(b)])
}

#[inline(always)]
fn to_sample(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

pub fn rgb_to_yuv(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        rgb_to_yuv_pixel(image.get_pixel(x, y))
    })
}

pub fn yuv_to_rgb(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        yuv_to_rgb_pixel(image.get_pixel(x, y))
    })
}

/// Halves both dimensions by keeping the pixel at every even `(x, y)`.
pub fn subsample(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width() / 2, image.height() / 2, |x, y| {
        *image.get_pixel(x * 2, y * 2)
    })
}

/// Doubles both dimensions; each source pixel fills a 2x2 block.
pub fn upsample(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width() * 2, image.height() * 2, |x, y| {
        *image.get_pixel(x / 2, y / 2)
    })
}
