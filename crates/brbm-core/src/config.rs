//! Training configuration for brbm.
//!
//! Settings can be supplied via:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`BRBM_*`)
//! 3. Config file (`--config-file`, `BRBM_CONFIG_FILE`, or `~/.config/brbm/config.toml`)
//! 4. Built-in defaults
//!
//! # Example
//!
//! ```ignore
//! use brbm_core::config::TrainingConfig;
//!
//! // Parse from CLI args
//! let config = TrainingConfig::from_args()?;
//!
//! // Or programmatically
//! let config = TrainingConfig::builder()
//!     .latent_size(32)
//!     .batch_size(10)
//!     .build()?;
//! ```
//!
//! # Example TOML
//!
//! ```toml
//! latent_size = 64
//! batch_size = 128
//! optimizer = "adam"
//! init = "hinton"
//! learning_rate = 0.001
//! data_dir = "/Volumes/ExternalDisk/mnist"
//! ```

use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BrbmError, Result};

/// Parameter initialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InitStrategy {
    /// Glorot-normal kernel, inverse-mean ambient bias.
    Glorot,
    /// Small Gaussian kernel, logit ambient bias.
    #[default]
    Hinton,
}

/// Which optimizer applies the contrastive-divergence gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

/// CLI arguments for training configuration
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Train a Bernoulli RBM with persistent contrastive divergence")]
pub struct TrainArgs {
    /// Path to config file
    #[arg(long, env = "BRBM_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Directory holding the training data
    #[arg(long, env = "BRBM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Number of hidden units
    #[arg(long, env = "BRBM_LATENT_SIZE")]
    pub latent_size: Option<usize>,

    /// Batch size (also the number of persistent fantasy particles)
    #[arg(long, short = 'b', env = "BRBM_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Passes over the dataset
    #[arg(long, short = 'e', env = "BRBM_EPOCHS")]
    pub epochs: Option<usize>,

    /// Gibbs steps per chain update
    #[arg(long, env = "BRBM_MC_STEPS")]
    pub mc_steps: Option<usize>,

    /// Record diagnostics every N steps
    #[arg(long, env = "BRBM_LOG_EVERY")]
    pub log_every: Option<usize>,

    /// Optimizer step size
    #[arg(long, short = 'l', env = "BRBM_LR")]
    pub learning_rate: Option<f64>,

    #[arg(long, value_enum, env = "BRBM_OPTIMIZER")]
    pub optimizer: Option<OptimizerKind>,

    /// Momentum for SGD (0 = no momentum)
    #[arg(long, env = "BRBM_MOMENTUM")]
    pub momentum: Option<f64>,

    #[arg(long, value_enum, env = "BRBM_INIT")]
    pub init: Option<InitStrategy>,

    /// Numerical floor used by the bias initializers
    #[arg(long, env = "BRBM_EPS")]
    pub eps: Option<f64>,

    /// Images are downsampled to side x side before binarization
    #[arg(long, env = "BRBM_IMAGE_SIDE")]
    pub image_side: Option<usize>,

    /// Number of rows shuffled together per pass
    #[arg(long, env = "BRBM_SHUFFLE_BUFFER")]
    pub shuffle_buffer: Option<usize>,

    #[arg(long, env = "BRBM_SEED")]
    pub seed: Option<u64>,
}

/// Training configuration as stored in a TOML file. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfigFile {
    pub data_dir: Option<PathBuf>,
    pub latent_size: Option<usize>,
    pub batch_size: Option<usize>,
    pub epochs: Option<usize>,
    pub mc_steps: Option<usize>,
    pub log_every: Option<usize>,
    pub learning_rate: Option<f64>,
    pub optimizer: Option<OptimizerKind>,
    pub momentum: Option<f64>,
    pub init: Option<InitStrategy>,
    pub eps: Option<f64>,
    pub image_side: Option<usize>,
    pub shuffle_buffer: Option<usize>,
    pub seed: Option<u64>,
}

/// Fully resolved training configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingConfig {
    pub data_dir: PathBuf,
    pub latent_size: usize,
    pub batch_size: usize,
    pub epochs: usize,
    pub mc_steps: usize,
    pub log_every: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub momentum: f64,
    pub init: InitStrategy,
    pub eps: f64,
    pub image_side: usize,
    pub shuffle_buffer: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            data_dir: Self::default_data_dir(),
            latent_size: 64,
            batch_size: 128,
            epochs: 10,
            mc_steps: 1,
            log_every: 10,
            learning_rate: 1e-3,
            optimizer: OptimizerKind::Adam,
            momentum: 0.0,
            init: InitStrategy::Hinton,
            eps: 1e-8,
            image_side: 16,
            shuffle_buffer: 10_000,
            seed: 0,
        }
    }
}

impl TrainingConfig {
    /// Parse configuration from CLI arguments
    ///
    /// Priority order:
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults
    pub fn from_args() -> Result<Self> {
        Self::from_train_args(TrainArgs::parse())
    }

    /// Create configuration from TrainArgs
    ///
    /// Use this when you have a flattened TrainArgs in your own CLI parser.
    pub fn from_train_args(args: TrainArgs) -> Result<Self> {
        let file = match args.config_file.as_deref() {
            Some(path) => Self::load_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_file(&path)?,
                _ => TrainingConfigFile::default(),
            },
        };

        let defaults = TrainingConfig::default();
        let config = TrainingConfig {
            data_dir: args
                .data_dir
                .or(file.data_dir)
                .unwrap_or(defaults.data_dir),
            latent_size: args
                .latent_size
                .or(file.latent_size)
                .unwrap_or(defaults.latent_size),
            batch_size: args
                .batch_size
                .or(file.batch_size)
                .unwrap_or(defaults.batch_size),
            epochs: args.epochs.or(file.epochs).unwrap_or(defaults.epochs),
            mc_steps: args.mc_steps.or(file.mc_steps).unwrap_or(defaults.mc_steps),
            log_every: args
                .log_every
                .or(file.log_every)
                .unwrap_or(defaults.log_every),
            learning_rate: args
                .learning_rate
                .or(file.learning_rate)
                .unwrap_or(defaults.learning_rate),
            optimizer: args
                .optimizer
                .or(file.optimizer)
                .unwrap_or(defaults.optimizer),
            momentum: args.momentum.or(file.momentum).unwrap_or(defaults.momentum),
            init: args.init.or(file.init).unwrap_or(defaults.init),
            eps: args.eps.or(file.eps).unwrap_or(defaults.eps),
            image_side: args
                .image_side
                .or(file.image_side)
                .unwrap_or(defaults.image_side),
            shuffle_buffer: args
                .shuffle_buffer
                .or(file.shuffle_buffer)
                .unwrap_or(defaults.shuffle_buffer),
            seed: args.seed.or(file.seed).unwrap_or(defaults.seed),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create a new builder for custom configuration
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::new()
    }

    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("latent_size", self.latent_size),
            ("batch_size", self.batch_size),
            ("epochs", self.epochs),
            ("log_every", self.log_every),
            ("image_side", self.image_side),
            ("shuffle_buffer", self.shuffle_buffer),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(BrbmError::Config(format!("{name} must be positive")));
            }
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(BrbmError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(BrbmError::Config(format!(
                "momentum must lie in [0, 1), got {}",
                self.momentum
            )));
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(BrbmError::Config(format!(
                "eps must be positive, got {}",
                self.eps
            )));
        }
        Ok(())
    }

    /// Load a config file, failing if it is missing or malformed.
    pub fn load_file(path: &Path) -> Result<TrainingConfigFile> {
        let contents = fs::read_to_string(path)?;
        toml::from_str::<TrainingConfigFile>(&contents)
            .map_err(|e| BrbmError::Config(format!("{}: {e}", path.display())))
    }

    /// Save current configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|e| BrbmError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml_str)?;
        Ok(())
    }

    /// Emit the resolved configuration as a structured log event.
    pub fn log_summary(&self) {
        tracing::info!(
            data_dir = %self.data_dir.display(),
            latent_size = self.latent_size,
            batch_size = self.batch_size,
            epochs = self.epochs,
            mc_steps = self.mc_steps,
            learning_rate = self.learning_rate,
            optimizer = ?self.optimizer,
            init = ?self.init,
            seed = self.seed,
            "training configuration"
        );
    }

    fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "brbm").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Default data directory based on OS conventions
    fn default_data_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "brbm") {
            proj_dirs.data_dir().to_path_buf()
        } else {
            // Fallback to current directory
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            cwd.join(".brbm/data")
        }
    }
}

/// Builder for TrainingConfig
#[derive(Debug, Clone)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl Default for TrainingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingConfigBuilder {
    pub fn new() -> Self {
        TrainingConfigBuilder {
            config: TrainingConfig::default(),
        }
    }

    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub const fn latent_size(mut self, n: usize) -> Self {
        self.config.latent_size = n;
        self
    }

    pub const fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n;
        self
    }

    pub const fn epochs(mut self, n: usize) -> Self {
        self.config.epochs = n;
        self
    }

    pub const fn mc_steps(mut self, n: usize) -> Self {
        self.config.mc_steps = n;
        self
    }

    pub const fn log_every(mut self, n: usize) -> Self {
        self.config.log_every = n;
        self
    }

    pub const fn learning_rate(mut self, lr: f64) -> Self {
        self.config.learning_rate = lr;
        self
    }

    pub const fn optimizer(mut self, kind: OptimizerKind) -> Self {
        self.config.optimizer = kind;
        self
    }

    pub const fn momentum(mut self, m: f64) -> Self {
        self.config.momentum = m;
        self
    }

    pub const fn init(mut self, strategy: InitStrategy) -> Self {
        self.config.init = strategy;
        self
    }

    pub const fn eps(mut self, eps: f64) -> Self {
        self.config.eps = eps;
        self
    }

    pub const fn image_side(mut self, side: usize) -> Self {
        self.config.image_side = side;
        self
    }

    pub const fn shuffle_buffer(mut self, n: usize) -> Self {
        self.config.shuffle_buffer = n;
        self
    }

    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Build and validate the TrainingConfig
    pub fn build(self) -> Result<TrainingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
