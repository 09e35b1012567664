//! # CartPole DQN trainer
//!
//! Trains a DQN agent on the bundled cart-pole environment and reports how
//! the greedy policy does afterwards.
//!
//! ```text
//! cartpole --config run.json --episodes 300 --eval-episodes 10
//! ```
//!
//! Set `RUST_LOG=debug` to see individual train steps and target syncs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cartpole_dqn::agent::DqnAgent;
use cartpole_dqn::config::DqnConfig;
use cartpole_dqn::env::{CartPole, CartPoleParams};

#[derive(Debug, Parser)]
#[command(name = "cartpole", about = "Train a Deep Q-Network to balance a pole on a cart")]
struct Args {
    /// JSON file with hyperparameters; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Force hard target synchronization
    #[arg(long, conflicts_with = "tau")]
    hard_sync: bool,

    /// Soft synchronization blend factor
    #[arg(long)]
    tau: Option<f32>,

    /// Greedy evaluation episodes after training
    #[arg(long, default_value_t = 10)]
    eval_episodes: usize,

    /// Step limit of the cart-pole environment
    #[arg(long, default_value_t = 500)]
    max_env_steps: usize,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> Result<DqnConfig> {
    let mut config = match &args.config {
        Some(path) => DqnConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => DqnConfig::default(),
    };

    if let Some(episodes) = args.episodes {
        config.num_episodes = episodes;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.hard_sync {
        config.soft_update = false;
    }
    if let Some(tau) = args.tau {
        config.soft_update = true;
        config.tau = tau;
    }

    config.validate().context("invalid hyperparameters")?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut env = CartPole::with_params(CartPoleParams {
        max_steps: args.max_env_steps,
        ..CartPoleParams::default()
    });
    let mut agent = DqnAgent::new(config).context("failed to build agent")?;

    let report = agent.train(&mut env).context("training aborted")?;
    let stats = report.reward_statistics();
    tracing::info!(
        episodes = report.num_episodes(),
        mean_reward = stats.mean,
        max_reward = stats.max,
        "training summary"
    );
    if let Some(best) = report.best_episode() {
        tracing::info!(episode = best.episode, reward = best.total_reward, "best episode");
    }

    if args.eval_episodes > 0 {
        let eval = agent
            .evaluate(&mut env, args.eval_episodes)
            .context("evaluation failed")?;
        tracing::info!(
            episodes = eval.count,
            mean_reward = eval.mean,
            std = eval.std,
            min = eval.min,
            max = eval.max,
            "greedy evaluation"
        );
    }

    Ok(())
}
