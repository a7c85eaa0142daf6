use anyhow::{Context, Result};
use image::RgbImage;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::preprocess::Preprocessor;
use crate::utils::file_utils;

/// Category name to its images, in file-name order.
pub type ImageSet = BTreeMap<String, Vec<RgbImage>>;

pub fn total_images(set: &ImageSet) -> usize {
    set.values().map(Vec::len).sum()
}

/// Loads a fixed number of images from each category directory.
pub struct ImageLoader {
    categories: Vec<String>,
    preprocessor: Preprocessor,
}

impl ImageLoader {
    pub fn new(categories: Vec<String>, preprocessor: Preprocessor) -> Self {
        Self {
            categories,
            preprocessor,
        }
    }

    /// Takes the first `limit` images of `<base>/<category>` for every
    /// category; fails if any directory is missing or holds fewer.
    pub fn load(&self, base: &Path, limit: usize) -> Result<ImageSet> {
        let start = Instant::now();
        let (width, height) = self.preprocessor.dimensions();
        let mut set = ImageSet::new();

        for category in &self.categories {
            let dir = base.join(category);
            info!(category = %category, dir = %dir.display(), "loading images");
            let images = self.load_directory(&dir, limit)?;
            set.insert(category.clone(), images);
        }

        info!(
            images = total_images(&set),
            elapsed_ms = start.elapsed().as_millis() as u64,
            base = %base.display(),
            width,
            height,
            "images loaded"
        );
        Ok(set)
    }

    fn load_directory(&self, dir: &Path, limit: usize) -> Result<Vec<RgbImage>> {
        let files = file_utils::list_images(dir)?;
        if files.len() < limit {
            anyhow::bail!(
                "Not enough images in directory: {}. Required: {}, Found: {}",
                dir.display(),
                limit,
                files.len()
            );
        }

        files[..limit]
            .par_iter()
            .map(|path| self.load_file(path))
            .collect()
    }

    /// Decodes one file and brings it to the canonical resolution.
    pub fn load_file(&self, path: &Path) -> Result<RgbImage> {
        let decoded = image::open(path)
            .with_context(|| format!("Error loading image {}", path.display()))?
            .to_rgb8();
        debug!(file = %path.display(), width = decoded.width(), height = decoded.height(), "decoded");
        self.preprocessor
            .process(decoded)
            .with_context(|| format!("Error preprocessing image {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::fs;

    fn write_png(dir: &Path, name: &str, value: u8) {
        RgbImage::from_pixel(8, 4, Rgb([value, value, value]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_load_takes_first_images_in_order() {
        let root = tempfile::tempdir().unwrap();
        let cat = root.path().join("faces");
        fs::create_dir(&cat).unwrap();
        write_png(&cat, "c.png", 30);
        write_png(&cat, "a.png", 10);
        write_png(&cat, "b.png", 20);

        let loader = ImageLoader::new(vec!["faces".into()], Preprocessor::new(8, 4));
        let set = loader.load(root.path(), 2).unwrap();

        let faces = &set["faces"];
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].dimensions(), (8, 4));
        assert_eq!(faces[0].get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(faces[1].get_pixel(0, 0), &Rgb([20, 20, 20]));
        assert_eq!(total_images(&set), 2);
    }

    #[test]
    fn test_load_fails_when_too_few_images() {
        let root = tempfile::tempdir().unwrap();
        let cat = root.path().join("nature");
        fs::create_dir(&cat).unwrap();
        write_png(&cat, "only.png", 1);

        let loader = ImageLoader::new(vec!["nature".into()], Preprocessor::new(8, 4));
        let err = loader.load(root.path(), 2).unwrap_err();
        assert!(err.to_string().contains("Required: 2, Found: 1"));
    }

    #[test]
    fn test_load_fails_on_missing_category() {
        let root = tempfile::tempdir().unwrap();
        let loader = ImageLoader::new(vec!["animals".into()], Preprocessor::new(8, 4));
        assert!(loader.load(root.path(), 1).is_err());
    }

    #[test]
    fn test_load_reports_undecodable_file() {
        let root = tempfile::tempdir().unwrap();
        let cat = root.path().join("faces");
        fs::create_dir(&cat).unwrap();
        fs::write(cat.join("broken.png"), b"not a png").unwrap();

        let loader = ImageLoader::new(vec!["faces".into()], Preprocessor::new(8, 4));
        let err = loader.load(root.path(), 1).unwrap_err();
        assert!(format!("{err:#}").contains("broken.png"));
    }
}
