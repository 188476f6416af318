//! Train a Bernoulli RBM on binarized, downsampled MNIST.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -p brbm-examples --example train_mnist -- \
//!     --data-dir /path/to/mnist --latent-size 64 --epochs 10
//!
//! # Or through the environment / a config file:
//! BRBM_LEARNING_RATE=0.01 cargo run --release -p brbm-examples --example train_mnist
//! cargo run --release -p brbm-examples --example train_mnist -- --config-file brbm.toml
//! ```
//!
//! The data directory must contain `train-images-idx3-ubyte` or `mnist_train.npy`.

use std::time::Instant;

use anyhow::Context;
use brbm_core::backend::{cpu_device, to_host, CpuBackend};
use brbm_core::config::{TrainArgs, TrainingConfig};
use brbm_examples::{load_mnist, mnist_search_paths, render_ascii};
use brbm_models::{
    build_optimizer, init_fantasy_latent, prob_ambient_given_latent, train, BernoulliRBM,
    Initializer, TrainOptions,
};
use brbm_observers::History;
use brbm_samplers::{activate, Activation, RngKey};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Train a Bernoulli RBM on MNIST with persistent contrastive divergence
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    train: TrainArgs,

    /// Number of fantasy samples to print as ASCII art after training
    #[arg(long, default_value = "2")]
    show_samples: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = TrainingConfig::from_train_args(cli.train)?;
    config.log_summary();

    let device = cpu_device();
    let data_dir = mnist_search_paths(&config.data_dir)
        .into_iter()
        .find(|p| p.exists())
        .with_context(|| format!("MNIST directory {} not found", config.data_dir.display()))?;
    let dataset = load_mnist(&data_dir, config.image_side)
        .with_context(|| format!("loading MNIST from {}", data_dir.display()))?;

    let keys = RngKey::new(config.seed).split(4);
    let (init_key, chain_key, data_key, train_key) = (keys[0], keys[1], keys[2], keys[3]);

    let ambient_size = dataset.width();
    let initializer = Initializer::new(config.init, dataset.to_tensor::<CpuBackend>(&device), config.eps)?;
    let mut rbm =
        BernoulliRBM::<CpuBackend>::new(ambient_size, config.latent_size, &initializer, init_key, &device)?;
    let fantasy = init_fantasy_latent(&rbm, config.batch_size, chain_key)?;
    let mut optimizer = build_optimizer::<CpuBackend>(&config);
    let mut history = History::new();

    let batches = dataset.batches::<CpuBackend>(
        config.batch_size,
        config.epochs,
        config.shuffle_buffer,
        data_key,
        &device,
    )?;
    tracing::info!(
        images = dataset.len(),
        ambient_size,
        num_params = rbm.num_params(),
        steps = batches.len(),
        "Dataset ready"
    );

    let start = Instant::now();
    let fantasy = train(
        &mut rbm,
        optimizer.as_mut(),
        batches,
        fantasy,
        &TrainOptions::from(&config),
        Some(&mut history),
        train_key,
    )?;
    tracing::info!(elapsed = ?start.elapsed(), "Training complete");

    if cli.show_samples > 0 {
        let samples = activate(prob_ambient_given_latent(&rbm, fantasy)?, Activation::Deterministic)?;
        let pixels = to_host(samples)?;
        for (i, image) in pixels.chunks(ambient_size).take(cli.show_samples).enumerate() {
            println!("fantasy sample {i}:\n{}\n", render_ascii(image, config.image_side));
        }
    }

    Ok(())
}
