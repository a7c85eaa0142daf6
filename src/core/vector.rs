//! 2x2 block vector extraction and the distance used for codeword search.
//!
//! A vector holds the four single-channel samples of one block in raster
//! order: top-left, top-right, bottom-left, bottom-right.

use image::RgbImage;

use super::channel::Channel;

/// Block edge length in pixels.
pub const BLOCK_SIZE: u32 = 2;

/// Samples per vector (`BLOCK_SIZE * BLOCK_SIZE`).
pub const VECTOR_DIM: usize = 4;

pub type Vector = [f64; VECTOR_DIM];

/// Pixel offsets of a block's samples, in vector order.
const BLOCK_OFFSETS: [(u32, u32); VECTOR_DIM] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Origins of every complete 2x2 block, row by row.
///
/// A trailing odd row or column is skipped.
pub fn block_origins(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let blocks_x = width / BLOCK_SIZE;
    let blocks_y = height / BLOCK_SIZE;
    (0..blocks_y).flat_map(move |by| {
        (0..blocks_x).map(move |bx| (bx * BLOCK_SIZE, by * BLOCK_SIZE))
    })
}

/// Samples of `channel` in the block whose top-left corner is `(x, y)`.
pub fn extract(image: &RgbImage, x: u32, y: u32, channel: Channel) -> Vector {
    let mut vector = [0.0; VECTOR_DIM];
    for (slot, &(dx, dy)) in vector.iter_mut().zip(BLOCK_OFFSETS.iter()) {
        *slot = channel.sample(image.get_pixel(x + dx, y + dy)) as f64;
    }
    vector
}

/// Per-channel vectors of one block, indexed by `Channel::index`.
pub fn extract_all(image: &RgbImage, x: u32, y: u32) -> [Vector; 3] {
    let mut vectors = [[0.0; VECTOR_DIM]; 3];
    for (i, &(dx, dy)) in BLOCK_OFFSETS.iter().enumerate() {
        let px = image.get_pixel(x + dx, y + dy);
        for channel in Channel::ALL {
            vectors[channel.index()][i] = channel.sample(px) as f64;
        }
    }
    vectors
}

/// Lazily walks every block of `image` for one channel.
pub fn vectors(image: &RgbImage, channel: Channel) -> impl Iterator<Item = Vector> + '_ {
    block_origins(image.width(), image.height()).map(move |(x, y)| extract(image, x, y, channel))
}

/// Writes `values` (one per channel, truncated) into the block at `(x, y)`.
pub(crate) fn write_block(image: &mut RgbImage, x: u32, y: u32, values: [&Vector; 3]) {
    for (i, &(dx, dy)) in BLOCK_OFFSETS.iter().enumerate() {
        let px = image.get_pixel_mut(x + dx, y + dy);
        for channel in Channel::ALL {
            // Codewords are centroids of 0..=255 samples, so they stay in range.
            px.0[channel.index()] = values[channel.index()][i] as u8;
        }
    }
}

/// Squared Euclidean distance.
#[inline]
pub fn squared_distance(a: &Vector, b: &Vector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean distance.
#[inline]
pub fn distance(a: &Vector, b: &Vector) -> f64 {
    squared_distance(a, b).sqrt()
}
