use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum VqError {
    // Training errors
    #[error("cannot train a codebook from an empty vector set")]
    EmptyTrainingSet,

    // Validation errors
    #[error("image dimensions must be even for 2x2 block tiling, got {width}x{height}")]
    OddDimensions { width: u32, height: u32 },

    #[error("dimension mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    // Config errors
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VqError>;
