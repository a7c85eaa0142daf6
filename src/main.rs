mod config;
mod core;
mod decoder;
mod error;
mod pipeline;
mod renderer;
mod startup;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use crate::config::Config;
use crate::core::compressor::CompressionPath;
use crate::core::sampler::SamplingPolicy;
use crate::renderer::report;

#[derive(Parser)]
#[command(author, version, about = "Vector-quantization image compression", long_about = None)]
struct Cli {
    /// Configuration file (falls back to VQ_CONFIG, then ./vq.toml)
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the training, test and output directories
    Init,
    /// Train codebooks and compress every test image along both paths
    Run {
        #[arg(long)]
        training: Option<PathBuf>,
        #[arg(long)]
        test: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum)]
        sampling: Option<SamplingPolicy>,
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Also print the run report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Train from the training corpus and compress a single image
    Compress {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value_t = CompressionPath::Rgb)]
        path: CompressionPath,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = startup::resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(config_path.as_deref())?;

    match cli.command {
        Commands::Init => {
            let dirs = utils::file_utils::create_layout(
                &config.paths.training,
                &config.paths.test,
                &config.paths.output,
                &config.dataset.categories,
            )?;
            for dir in dirs {
                println!("{}", dir.display());
            }
            println!(
                "Put {} training and {} test images (.jpg/.jpeg/.png) in each category directory.",
                config.dataset.training_per_category, config.dataset.test_per_category
            );
        }
        Commands::Run {
            training,
            test,
            output,
            seed,
            sampling,
            max_iterations,
            json,
        } => {
            if let Some(dir) = training {
                config.paths.training = dir;
            }
            if let Some(dir) = test {
                config.paths.test = dir;
            }
            if let Some(dir) = output {
                config.paths.output = dir;
            }
            if seed.is_some() {
                config.training.seed = seed;
            }
            if let Some(policy) = sampling {
                config.training.sampling = policy;
            }
            if let Some(n) = max_iterations {
                config.training.max_iterations = n;
            }
            let mut rng = prepare(&config)?;

            let run = pipeline::run(&config, &mut rng)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&run)?);
            }
        }
        Commands::Compress {
            input,
            output,
            path,
            seed,
        } => {
            if seed.is_some() {
                config.training.seed = seed;
            }
            let mut rng = prepare(&config)?;

            let metrics = pipeline::compress_file(&config, &input, &output, path, &mut rng)
                .with_context(|| format!("Failed to compress {}", input.display()))?;
            println!("Wrote {}", output.display());
            println!("{}", report::format_metrics(&metrics));
        }
        Commands::Config => {
            config.validate()?;
            println!(
                "{}",
                json!({
                    "source": config_path,
                    "config": config,
                })
            );
        }
    }

    Ok(())
}

/// Validates the config, starts logging and builds the training RNG.
fn prepare(config: &Config) -> Result<rand::rngs::StdRng> {
    config.validate()?;
    startup::init_logging(&config.logging);
    Ok(startup::training_rng(config))
}
