//! Run a self-play training session.
//!
//! Usage: cargo run --release --bin selfplay -- --config run.json --max-steps 100

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use az_selfplay::core::Config;
use az_selfplay::error::{ConfigError, LoopError};
use az_selfplay::games::mpg::MeanPayoffGame;
use az_selfplay::nn::LinearModel;
use az_selfplay::training::alpha_zero;

/// AlphaZero-style self-play training
#[derive(Parser, Debug)]
#[command(name = "selfplay")]
#[command(about = "Train a model by self-play", long_about = None)]
struct Args {
    /// JSON config file; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for checkpoints and learner.jsonl
    #[arg(long)]
    path: Option<PathBuf>,

    /// Learner steps to run (0 = forever)
    #[arg(long)]
    max_steps: Option<i64>,

    #[arg(long)]
    actors: Option<usize>,

    #[arg(long)]
    evaluators: Option<usize>,

    /// Algorithm version (1 or 2)
    #[arg(long)]
    version: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Vertices of the mean-payoff graph
    #[arg(long, default_value_t = 10)]
    nodes: usize,
}

impl Args {
    fn into_config(self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(path) = self.path {
            config.path = path;
        }
        if let Some(steps) = self.max_steps {
            config.max_steps = steps;
        }
        if let Some(actors) = self.actors {
            config.actors = actors;
        }
        if let Some(evaluators) = self.evaluators {
            config.evaluators = evaluators;
        }
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: Args) -> Result<(), LoopError> {
    let nodes = args.nodes;
    let config = args.into_config()?;

    match config.game.as_str() {
        "mpg" => {
            let game = MeanPayoffGame::new().nodes(nodes);
            let summary = alpha_zero(&config, game.clone(), || LinearModel::for_game(&game, &config))?;
            log::info!(
                "Done: {} steps, {} states, final {}",
                summary.learner.steps,
                summary.learner.total_states,
                summary.learner.losses
            );
            Ok(())
        }
        other => Err(ConfigError::UnknownGame(other.to_string()).into()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
