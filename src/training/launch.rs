//! Thread wiring for a full training run.
//!
//! Every worker gets its own model instance and its own channels; nothing
//! else is shared. When the learner returns it drops its receivers and the
//! broadcaster, and every worker exits at its next game boundary.

use std::thread::{self, JoinHandle};

use crossbeam_channel::unbounded;

use crate::core::Config;
use crate::error::LoopError;
use crate::nn::{Broadcaster, Model};
use crate::rules::Game;

use super::actor::{Actor, ActorSummary};
use super::evaluation::EvaluationWorker;
use super::feed::CheckpointFeed;
use super::learner::{Learner, LearnerSummary};

/// Outcome of `alpha_zero`.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub learner: LearnerSummary,
    pub actors: Vec<ActorSummary>,
    pub evaluation_games: u64,
}

type Worker<T> = JoinHandle<Result<T, LoopError>>;

fn spawn<T, F>(name: String, f: F) -> Result<Worker<T>, LoopError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LoopError> + Send + 'static,
{
    Ok(thread::Builder::new().name(name).spawn(f)?)
}

fn join<T>(handle: Worker<T>) -> Result<T, LoopError> {
    let name = handle.thread().name().unwrap_or("worker").to_string();
    match handle.join() {
        Ok(result) => {
            if let Err(e) = &result {
                log::error!("{} failed: {}", name, e);
            }
            result
        }
        Err(_) => Err(LoopError::WorkerPanicked(name)),
    }
}

/// Run the learner plus `config.actors` actors and `config.evaluators`
/// evaluation workers until the step budget is spent.
///
/// `make_model` is called once per worker and once for the learner; all
/// instances must share an architecture so checkpoints load everywhere.
pub fn alpha_zero<G, M, F>(config: &Config, game: G, make_model: F) -> Result<RunSummary, LoopError>
where
    G: Game,
    M: Model + 'static,
    F: Fn() -> M,
{
    config.validate()?;
    log::info!(
        "Starting {} with {} actors and {} evaluators, storing in {:?}",
        game.name(),
        config.actors,
        config.evaluators,
        config.path
    );

    let mut broadcaster = Broadcaster::new();

    let mut trajectory_rxs = Vec::with_capacity(config.actors);
    let mut actors = Vec::with_capacity(config.actors);
    for id in 0..config.actors {
        let (tx, rx) = unbounded();
        let feed = CheckpointFeed::new(broadcaster.register(format!("actor-{}", id)));
        let actor = Actor::new(id, game.clone(), make_model(), config, feed, tx);
        actors.push(spawn(actor.name().to_string(), move || actor.run())?);
        trajectory_rxs.push(rx);
    }

    let mut result_rxs = Vec::with_capacity(config.evaluators);
    let mut evaluators = Vec::with_capacity(config.evaluators);
    for id in 0..config.evaluators {
        let (tx, rx) = unbounded();
        let name = format!("evaluator-{}", id);
        let feed = CheckpointFeed::new(broadcaster.register(name.clone()));
        let worker = EvaluationWorker::new(id, game.clone(), make_model(), config, feed, tx);
        evaluators.push(spawn(name, move || worker.run())?);
        result_rxs.push(rx);
    }

    let learner = Learner::new(config, &game, make_model(), broadcaster, trajectory_rxs, result_rxs)?;
    let learner_result = learner.run();
    if let Err(e) = &learner_result {
        log::error!("Learner failed: {}", e);
    }

    let actor_results: Vec<_> = actors.into_iter().map(join).collect();
    let evaluator_results: Vec<_> = evaluators.into_iter().map(join).collect();

    let learner = learner_result?;
    let actors = actor_results.into_iter().collect::<Result<Vec<_>, _>>()?;
    let evaluation_games = evaluator_results
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .sum();

    log::info!(
        "Run finished after {} steps: {} trajectories, {} evaluation games",
        learner.steps,
        learner.total_trajectories,
        evaluation_games
    );
    Ok(RunSummary {
        learner,
        actors,
        evaluation_games,
    })
}
