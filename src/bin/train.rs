use clap::Parser;
use log::info;
use std::path::PathBuf;

use signal_dqn::config::TrainingConfig;
use signal_dqn::env::IntersectionEnv;
use signal_dqn::error::Result;
use signal_dqn::trainer::TrainingSession;

/// Train a signal-control DQN agent on the built-in intersection model.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON training configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of episodes
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Seed for the agent and the environment
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where to write the trained agent
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Where to write the episode history as JSON
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_default_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        TrainingConfig::default().save(path)?;
        info!("default configuration written to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => TrainingConfig::load(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(episodes) = args.episodes {
        config.trainer.num_episodes = episodes;
    }
    if let Some(seed) = args.seed {
        config.agent.seed = Some(seed);
        config.env.seed = Some(seed.wrapping_add(1));
    }
    config.validate()?;

    let env = IntersectionEnv::new(config.env.clone())?;
    info!(
        "training on {} signals: state_dim = {}, action_dim = {}",
        config.env.num_signals,
        config.env.state_dim(),
        config.env.action_dim()
    );

    let mut session = TrainingSession::from_config(env, &config)?;
    let summary = session.run()?;
    info!(
        "final epsilon = {:.3}, target syncs = {}",
        summary.final_epsilon, summary.target_syncs
    );

    if let Some(path) = &args.metrics {
        session.metrics().save(path)?;
        info!("metrics written to {}", path.display());
    }
    if let Some(path) = &args.checkpoint {
        session.agent().save(path)?;
        info!("checkpoint written to {}", path.display());
    }
    Ok(())
}
