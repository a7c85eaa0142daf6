use image::RgbImage;

use crate::error::{Result, VqError};

use super::channel::Channel;
use super::codebook::ChannelCodebooks;
use super::vector::{self, BLOCK_SIZE};

/// Codeword indices of an image, one byte per block per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major block indices, in `Channel::ALL` order.
    pub indices: [Vec<u8>; 3],
}

impl EncodedImage {
    pub fn channel(&self, channel: Channel) -> &[u8] {
        &self.indices[channel.index()]
    }
}

/// Block quantizer over a fixed set of per-channel codebooks.
///
/// It does not care whether the samples are RGB or luma/chroma.
pub struct Quantizer<'a> {
    codebooks: &'a ChannelCodebooks,
}

impl<'a> Quantizer<'a> {
    pub fn new(codebooks: &'a ChannelCodebooks) -> Self {
        Self { codebooks }
    }

    pub fn encode(&self, image: &RgbImage) -> Result<EncodedImage> {
        let (width, height) = image.dimensions();
        ensure_even(width, height)?;

        let blocks = ((width / BLOCK_SIZE) * (height / BLOCK_SIZE)) as usize;
        let mut indices: [Vec<u8>; 3] = Default::default();
        for plane in indices.iter_mut() {
            plane.reserve_exact(blocks);
        }

        for (x, y) in vector::block_origins(width, height) {
            let vectors = vector::extract_all(image, x, y);
            for channel in Channel::ALL {
                let idx = self.codebooks[channel].nearest(&vectors[channel.index()]);
                indices[channel.index()].push(idx);
            }
        }

        Ok(EncodedImage {
            width,
            height,
            indices,
        })
    }

    /// Rebuilds pixels from codeword values.
    ///
    /// Components are truncated, not clamped: codewords trained on 0..=255
    /// samples never leave that range.
    pub fn decode(&self, encoded: &EncodedImage) -> RgbImage {
        let mut out = RgbImage::new(encoded.width, encoded.height);
        let origins = vector::block_origins(encoded.width, encoded.height);
        for (block, (x, y)) in origins.enumerate() {
            let codewords = Channel::ALL.map(|channel| {
                self.codebooks[channel].codeword(encoded.channel(channel)[block])
            });
            vector::write_block(&mut out, x, y, codewords);
        }
        out
    }

    /// Encode then decode.
    pub fn quantize(&self, image: &RgbImage) -> Result<RgbImage> {
        let encoded = self.encode(image)?;
        Ok(self.decode(&encoded))
    }
}

fn ensure_even(width: u32, height: u32) -> Result<()> {
    if width % BLOCK_SIZE != 0 || height % BLOCK_SIZE != 0 {
        return Err(VqError::OddDimensions { width, height });
    }
    Ok(())
}
