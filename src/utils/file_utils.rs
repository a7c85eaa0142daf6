use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Creates `<training>/<category>`, `<test>/<category>` and the
/// `rgb`/`yuv` output folders. Existing directories are left alone.
pub fn create_layout(
    training: &Path,
    test: &Path,
    output: &Path,
    categories: &[String],
) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::with_capacity(categories.len() * 2 + 2);
    for category in categories {
        dirs.push(training.join(category));
        dirs.push(test.join(category));
    }
    dirs.push(output.join("rgb"));
    dirs.push(output.join("yuv"));

    for dir in &dirs {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(dirs)
}

pub fn is_image_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Image files directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Directory not found: {}", dir.display());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();

    files.sort();
    Ok(files)
}
