//! End-to-end run: load, train, compress every test image along both paths.

use anyhow::{Context, Result};
use image::RgbImage;
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::config::{Config, YuvCodebooks};
use crate::core::channel::Channel;
use crate::core::codebook::ChannelCodebooks;
use crate::core::compressor::{self, CompressionPath, ImageCompressor};
use crate::core::trainer::{CodebookTrainer, TrainedCodebooks};
use crate::decoder::loader::total_images;
use crate::decoder::{ImageLoader, ImageSet, Preprocessor};
use crate::renderer::{report, writer, CompressionMetrics};

/// Codebooks for both paths; the YUV set is absent when shared.
pub struct TrainedSet {
    pub rgb: TrainedCodebooks,
    pub yuv: Option<TrainedCodebooks>,
}

impl TrainedSet {
    pub fn yuv_codebooks(&self) -> &ChannelCodebooks {
        self.yuv.as_ref().map_or(&self.rgb.codebooks, |t| &t.codebooks)
    }

    pub fn compressor(&self) -> ImageCompressor<'_> {
        ImageCompressor::new(&self.rgb.codebooks, self.yuv_codebooks())
    }

    pub fn summaries(&self) -> Vec<CodebookSummary> {
        let mut out = CodebookSummary::from_trained(CompressionPath::Rgb, &self.rgb);
        if let Some(yuv) = &self.yuv {
            out.extend(CodebookSummary::from_trained(CompressionPath::Yuv, yuv));
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CodebookSummary {
    pub set: CompressionPath,
    pub channel: Channel,
    pub training_vectors: usize,
    pub iterations: usize,
    pub converged: bool,
    pub dead_codewords: usize,
    pub final_distortion: Option<f64>,
}

impl CodebookSummary {
    fn from_trained(set: CompressionPath, trained: &TrainedCodebooks) -> Vec<Self> {
        Channel::ALL
            .iter()
            .map(|&channel| {
                let report = trained.report(channel);
                Self {
                    set,
                    channel,
                    training_vectors: report.training_vectors,
                    iterations: report.iterations,
                    converged: report.converged,
                    dead_codewords: report.dead_codewords(),
                    final_distortion: report.distortion.last().copied(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    pub category: String,
    pub index: usize,
    pub path: CompressionPath,
    pub output: PathBuf,
    pub metrics: CompressionMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub training_images: usize,
    pub test_images: usize,
    pub codebooks: Vec<CodebookSummary>,
    pub results: Vec<ImageResult>,
    pub elapsed_ms: u64,
}

fn loader(config: &Config) -> ImageLoader {
    ImageLoader::new(
        config.dataset.categories.clone(),
        Preprocessor::new(config.dataset.width, config.dataset.height),
    )
}

/// Trains the RGB codebooks, plus a YUV set when configured.
pub fn train_codebooks<R: Rng + ?Sized>(
    config: &Config,
    training: &ImageSet,
    rng: &mut R,
) -> Result<TrainedSet> {
    let trainer = CodebookTrainer::new(config.training.trainer_config());
    let start = Instant::now();

    let rgb = trainer
        .train(training.values().flatten(), rng)
        .context("Failed to train RGB codebooks")?;

    let yuv = match config.training.yuv_codebooks {
        YuvCodebooks::Shared => None,
        YuvCodebooks::Dedicated => {
            let views: Vec<RgbImage> = training
                .values()
                .flatten()
                .map(compressor::subsampled_yuv)
                .collect();
            Some(
                trainer
                    .train(&views, rng)
                    .context("Failed to train YUV codebooks")?,
            )
        }
    };

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        max_iterations = trainer.config().max_iterations,
        yuv_codebooks = ?config.training.yuv_codebooks,
        "codebooks generated"
    );
    Ok(TrainedSet { rgb, yuv })
}

/// Runs both paths over every test image, writing PNGs and printing metrics
/// grouped by path.
pub fn compress_all(config: &Config, trained: &TrainedSet, test: &ImageSet) -> Result<Vec<ImageResult>> {
    let compressor = trained.compressor();
    let mut results = Vec::with_capacity(total_images(test) * CompressionPath::ALL.len());

    for (category, images) in test {
        for (index, original) in images.iter().enumerate() {
            for path in CompressionPath::ALL {
                let compressed = compressor
                    .compress(original, path)
                    .with_context(|| format!("Failed to compress {} image {}", category, index))?;

                let output = writer::output_path(&config.paths.output, path, category, index);
                writer::write_png(&compressed, &output)?;

                results.push(ImageResult {
                    category: category.clone(),
                    index,
                    path,
                    output,
                    metrics: CompressionMetrics::compute(original, &compressed)?,
                });
            }
        }
    }

    for path in CompressionPath::ALL {
        report::print_section(&format!("{} Compression Results:", path.name().to_uppercase()));
        for result in results.iter().filter(|r| r.path == path) {
            report::print_image_metrics(&result.category, result.index, &result.metrics);
        }
    }

    Ok(results)
}

pub fn run<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<RunReport> {
    let start = Instant::now();
    let loader = loader(config);

    let training = loader.load(&config.paths.training, config.dataset.training_per_category)?;
    let test = loader.load(&config.paths.test, config.dataset.test_per_category)?;

    let trained = train_codebooks(config, &training, rng)?;
    let results = compress_all(config, &trained, &test)?;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(elapsed_ms, images = results.len(), "run complete");

    Ok(RunReport {
        training_images: total_images(&training),
        test_images: total_images(&test),
        codebooks: trained.summaries(),
        results,
        elapsed_ms,
    })
}

/// Trains from the configured corpus and compresses a single file.
pub fn compress_file<R: Rng + ?Sized>(
    config: &Config,
    input: &Path,
    output: &Path,
    path: CompressionPath,
    rng: &mut R,
) -> Result<CompressionMetrics> {
    let loader = loader(config);
    let original = loader.load_file(input)?;
    let training = loader.load(&config.paths.training, config.dataset.training_per_category)?;
    let trained = train_codebooks(config, &training, rng)?;

    let compressed = trained
        .compressor()
        .compress(&original, path)
        .with_context(|| format!("Failed to compress {}", input.display()))?;
    writer::write_png(&compressed, output)?;

    let metrics = CompressionMetrics::compute(&original, &compressed)?;
    info!(input = %input.display(), output = %output.display(), path = path.name(), "image compressed");
    Ok(metrics)
}
