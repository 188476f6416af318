//! Learn a single binary pattern, then clean up a corrupted copy with `relax`.
//!
//! Run with: cargo run -p brbm-examples --example denoise_pattern

use anyhow::Context;
use brbm_core::backend::{cpu_device, to_host, CpuBackend};
use brbm_core::stats::fraction_equal;
use brbm_examples::{render_ascii, repeated_pattern};
use brbm_models::{
    init_fantasy_latent, relax, train, Adam, BernoulliRBM, Diagnostics, InitStrategy, Initializer,
    TrainOptions, DEFAULT_EPS,
};
use brbm_models::BinaryDataset;
use brbm_observers::History;
use brbm_samplers::RngKey;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const SIDE: usize = 6;

#[rustfmt::skip]
const CROSS: [f32; SIDE * SIDE] = [
    0., 0., 1., 1., 0., 0.,
    0., 0., 1., 1., 0., 0.,
    1., 1., 1., 1., 1., 1.,
    1., 1., 1., 1., 1., 1.,
    0., 0., 1., 1., 0., 0.,
    0., 0., 1., 1., 0., 0.,
];

#[derive(Parser, Debug)]
#[command(about = "Denoise a corrupted pattern with a trained RBM")]
struct Args {
    /// Hidden units
    #[arg(long, default_value = "8")]
    latent_size: usize,

    /// Training steps (batches of 16)
    #[arg(long, default_value = "200")]
    steps: usize,

    /// Pixels to flip in the corrupted copy
    #[arg(long, default_value = "6")]
    flips: usize,

    #[arg(long, default_value = "0", env = "BRBM_SEED")]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let device = cpu_device();
    let keys = RngKey::new(args.seed).split(5);

    let batch_size = 16;
    let dataset = repeated_pattern(&CROSS, batch_size * 4)?;
    let initializer = Initializer::new(InitStrategy::Hinton, dataset.to_tensor::<CpuBackend>(&device), DEFAULT_EPS)?;
    let mut rbm = BernoulliRBM::<CpuBackend>::new(SIDE * SIDE, args.latent_size, &initializer, keys[0], &device)?;
    let fantasy = init_fantasy_latent(&rbm, batch_size, keys[1])?;

    let epochs = (args.steps * batch_size).div_ceil(dataset.len());
    let batches = dataset
        .batches::<CpuBackend>(batch_size, epochs, dataset.len(), keys[2], &device)?
        .take(args.steps);
    let mut optimizer = Adam::<CpuBackend>::new(0.05);
    let mut history = History::new();
    train(
        &mut rbm,
        &mut optimizer,
        batches,
        fantasy,
        &TrainOptions { mc_steps: 1, log_every: 50 },
        Some(&mut history),
        keys[3],
    )?;

    // Flip distinct pixels chosen by the last key
    let mut corrupted = CROSS.to_vec();
    let mut order: Vec<usize> = (0..corrupted.len()).collect();
    let draws = keys[4].uniform(order.len());
    order.sort_by(|&a, &b| draws[a].total_cmp(&draws[b]));
    for &i in order.iter().take(args.flips) {
        corrupted[i] = 1.0 - corrupted[i];
    }
    let noisy = BinaryDataset::new(corrupted.clone(), SIDE * SIDE)?;

    let (clean, steps) = relax(&rbm, noisy.to_tensor::<CpuBackend>(&device), 20, 0.5)?;
    let clean = to_host(clean)?;

    println!("original:\n{}\n", render_ascii(&CROSS, SIDE));
    println!("corrupted ({} flips):\n{}\n", args.flips, render_ascii(&corrupted, SIDE));
    println!("relaxed after {steps} steps:\n{}\n", render_ascii(&clean, SIDE));
    println!(
        "{:.1}% of pixels match the original (corrupted copy: {:.1}%)",
        100.0 * fraction_equal(&clean, &CROSS),
        100.0 * fraction_equal(&corrupted, &CROSS)
    );

    let final_check = Diagnostics::compute(&rbm, dataset.head(batch_size).to_tensor::<CpuBackend>(&device))
        .context("final diagnostics")?;
    tracing::info!(recon_accuracy = final_check.recon_accuracy, "Training set reconstruction");
    Ok(())
}
