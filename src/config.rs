use crate::core::sampler::SamplingPolicy;
use crate::core::trainer::{TrainerConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_SAMPLE_CAP};
use crate::error::{Result, VqError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_training_dir")]
    pub training: PathBuf,
    #[serde(default = "default_test_dir")]
    pub test: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_training_per_category")]
    pub training_per_category: usize,
    #[serde(default = "default_test_per_category")]
    pub test_per_category: usize,
    /// Canonical resolution every image is resized to.
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

/// Which codebooks quantize the YUV path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YuvCodebooks {
    /// Reuse the RGB codebooks.
    #[default]
    Shared,
    /// Train a second set on transformed, subsampled training images.
    Dedicated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,
    #[serde(default)]
    pub sampling: SamplingPolicy,
    /// Fixed RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub yuv_codebooks: YuvCodebooks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_training_dir() -> PathBuf {
    std::env::var("VQ_TRAINING_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data/training"))
}
fn default_test_dir() -> PathBuf {
    std::env::var("VQ_TEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data/test"))
}
fn default_output_dir() -> PathBuf {
    std::env::var("VQ_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./output"))
}
fn default_categories() -> Vec<String> {
    vec!["nature".into(), "faces".into(), "animals".into()]
}
fn default_training_per_category() -> usize {
    10
}
fn default_test_per_category() -> usize {
    5
}
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_sample_cap() -> usize {
    DEFAULT_SAMPLE_CAP
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    std::env::var("VQ_LOG_FORMAT").unwrap_or_else(|_| "text".to_string())
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            training: default_training_dir(),
            test: default_test_dir(),
            output: default_output_dir(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            training_per_category: default_training_per_category(),
            test_per_category: default_test_per_category(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            sample_cap: default_sample_cap(),
            sampling: SamplingPolicy::default(),
            seed: None,
            yuv_codebooks: YuvCodebooks::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TrainingConfig {
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            max_iterations: self.max_iterations,
            sample_cap: self.sample_cap,
            sampling: self.sampling,
        }
    }
}

impl Config {
    /// Load config from a TOML file, falling back to defaults.
    /// Env var overrides are applied afterwards, so
    /// env var > TOML file > defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|e| {
                    VqError::Config(format!("failed to read config file {p}: {e}"))
                })?;
                Self::from_toml(&content)?
            }
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VqError::Config(format!("failed to parse config: {e}")))
    }

    fn apply_env_overrides(&mut self) {
        // Paths
        if let Ok(v) = std::env::var("VQ_TRAINING_DIR") {
            self.paths.training = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("VQ_TEST_DIR") {
            self.paths.test = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("VQ_OUTPUT_DIR") {
            self.paths.output = PathBuf::from(v);
        }

        // Training
        if let Some(v) = std::env::var("VQ_SEED").ok().and_then(|v| v.parse().ok()) {
            self.training.seed = Some(v);
        }
        if let Some(v) = std::env::var("VQ_MAX_ITERATIONS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.training.max_iterations = v;
        }

        // Logging
        if let Ok(v) = std::env::var("VQ_LOG_FORMAT") {
            self.logging.format = v;
        }
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.training.max_iterations == 0 {
            return Err(VqError::Config("training.max_iterations must be > 0".into()));
        }
        if self.training.sample_cap == 0 {
            return Err(VqError::Config("training.sample_cap must be > 0".into()));
        }
        if self.dataset.categories.is_empty() {
            return Err(VqError::Config("dataset.categories must not be empty".into()));
        }
        if self.dataset.training_per_category == 0 {
            return Err(VqError::Config(
                "dataset.training_per_category must be > 0".into(),
            ));
        }
        // The YUV path quantizes a half-size image, which must still tile.
        if self.dataset.width == 0
            || self.dataset.height == 0
            || self.dataset.width % 4 != 0
            || self.dataset.height % 4 != 0
        {
            return Err(VqError::Config(format!(
                "dataset resolution must be a non-zero multiple of 4, got {}x{}",
                self.dataset.width, self.dataset.height
            )));
        }
        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(VqError::Config(format!(
                "logging.format must be \"text\" or \"json\", got {other:?}"
            ))),
        }
    }
}
