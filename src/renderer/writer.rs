use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::compressor::CompressionPath;

/// `<output>/<path>/<category>_<index>_compressed.png`
pub fn output_path(output: &Path, path: CompressionPath, category: &str, index: usize) -> PathBuf {
    output
        .join(path.name())
        .join(format!("{}_{}_compressed.png", category, index))
}

pub fn write_png(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}
