//! Process bootstrap: config discovery, logging and the training RNG.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Resolve the configuration file path.
///
/// Priority:
/// 1. explicit `--config` argument
/// 2. `VQ_CONFIG` environment variable
/// 3. `./vq.toml` if it exists
/// 4. None (use defaults)
pub fn resolve_config_path(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var("VQ_CONFIG").ok())
        .or_else(|| {
            let default = "vq.toml";
            std::path::Path::new(default)
                .exists()
                .then(|| default.to_string())
        })
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` wins over `config.level` when set.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Seeded when the config pins a seed, entropy-seeded otherwise.
pub fn training_rng(config: &Config) -> StdRng {
    match config.training.seed {
        Some(seed) => {
            tracing::info!(seed, "using fixed training seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}
