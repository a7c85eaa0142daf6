pub mod channel;
pub mod codebook;
pub mod color;
pub mod compressor;
pub mod quantizer;
pub mod sampler;
pub mod trainer;
pub mod vector;
