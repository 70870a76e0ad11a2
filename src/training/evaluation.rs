//! Evaluation worker: pits the current model against fixed-strength
//! search opponents and reports each result to the learner.
//!
//! Game `g` uses:
//! - model side: player `g % 2`
//! - difficulty: `(g / 2) % eval_levels`
//! - opponent: random-rollout search with `max_simulations * 10^(difficulty / 2)`
//!   simulations

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::core::{Config, PlayerId, SeededRng};
use crate::error::{EvalError, LoopError};
use crate::evaluator::{CachedEvaluator, RandomRolloutEvaluator};
use crate::nn::Model;
use crate::rules::{Game, GameState};
use crate::search::{MctsBot, SearchConfig};

use super::feed::CheckpointFeed;

/// One finished evaluation game.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Opponent strength bucket.
    pub difficulty: usize,
    /// Return of the model side.
    pub outcome: f64,
}

/// Simulation budget of the opponent at `difficulty`.
#[must_use]
pub fn opponent_simulations(max_simulations: u32, difficulty: usize) -> u32 {
    let factor = 10u32.saturating_pow((difficulty / 2) as u32);
    max_simulations.saturating_mul(factor)
}

pub struct EvaluationWorker<G: Game, M: Model> {
    name: String,
    game: G,
    model_bot: MctsBot<CachedEvaluator<M>>,
    search: SearchConfig,
    levels: usize,
    checkpoints: CheckpointFeed,
    results: Sender<EvalResult>,
    rng: SeededRng,
}

impl<G: Game, M: Model> EvaluationWorker<G, M> {
    pub fn new(
        id: usize,
        game: G,
        model: M,
        config: &Config,
        checkpoints: CheckpointFeed,
        results: Sender<EvalResult>,
    ) -> Self {
        let name = format!("evaluator-{}", id);
        let mut rng = SeededRng::new(config.seed).for_context(&name);
        let search = SearchConfig::evaluation(config);
        let evaluator = CachedEvaluator::new(model, config.cache_size);
        let model_bot = MctsBot::new(search.clone(), evaluator, rng.fork());
        Self {
            name,
            game,
            model_bot,
            search,
            levels: config.eval_levels.max(1),
            checkpoints,
            results,
            rng,
        }
    }

    /// Play evaluation games until the learner goes away.
    pub fn run(mut self) -> Result<u64, LoopError> {
        let Some(initial) = self.checkpoints.wait() else {
            return Ok(0);
        };
        self.model_bot.evaluator_mut().load_checkpoint(&initial)?;

        let mut games = 0u64;
        loop {
            let result = self.play_game(games)?;
            log::debug!(
                "{}: game {} difficulty {} outcome {}",
                self.name,
                games,
                result.difficulty,
                result.outcome
            );
            if self.results.send(result).is_err() {
                break;
            }
            games += 1;
            if self.checkpoints.is_disconnected() {
                break;
            }
        }
        log::info!("{}: exiting after {} games", self.name, games);
        Ok(games)
    }

    /// Play evaluation game number `game_num`.
    pub fn play_game(&mut self, game_num: u64) -> Result<EvalResult, LoopError> {
        let model_player = PlayerId::new((game_num % 2) as u8);
        let difficulty = ((game_num / 2) % self.levels as u64) as usize;

        let opponent_config = self
            .search
            .clone()
            .with_simulations(opponent_simulations(self.search.max_simulations, difficulty));
        let mut opponent = MctsBot::new(
            opponent_config,
            RandomRolloutEvaluator::new(1, self.rng.fork()),
            self.rng.fork(),
        );

        let mut state = self.game.new_initial_state(&mut self.rng);
        let mut moves = 0;
        while !state.is_terminal() && moves < self.game.max_game_length() {
            if let Some(path) = self.checkpoints.poll() {
                self.model_bot.evaluator_mut().load_checkpoint(&path)?;
            }
            // Learner is gone: abandon the game.
            if self.checkpoints.is_disconnected() {
                log::debug!("{}: learner gone, abandoning game {}", self.name, game_num);
                break;
            }

            let action = match state.current_player() {
                None => state
                    .sample_chance_outcome(&mut self.rng)
                    .ok_or(EvalError::NoLegalActions)?,
                Some(player) => {
                    let result = if player == model_player {
                        self.model_bot.step(&state, moves)?
                    } else {
                        opponent.step(&state, moves)?
                    };
                    moves += 1;
                    result.action
                }
            };
            state.apply_action(action);
        }

        Ok(EvalResult {
            difficulty,
            outcome: state.returns()[model_player],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::mpg::MeanPayoffGame;
    use crate::nn::{CheckpointTag, LinearModel, ModelResource};
    use crossbeam_channel::unbounded;

    #[test]
    fn test_opponent_simulations() {
        assert_eq!(opponent_simulations(10, 0), 10);
        assert_eq!(opponent_simulations(10, 1), 10);
        assert_eq!(opponent_simulations(10, 2), 100);
        assert_eq!(opponent_simulations(10, 5), 1000);
        assert_eq!(opponent_simulations(u32::MAX, 4), u32::MAX);
    }

    #[test]
    fn test_schedule_cycles_sides_and_levels() {
        let game = MeanPayoffGame::new().nodes(3).max_moves(2);
        let config = Config::default().with_max_simulations(2).with_evaluation(10, 2);
        let (_tx, rx) = unbounded();
        let (res_tx, _res_rx) = unbounded();
        let mut worker = EvaluationWorker::new(
            0,
            game.clone(),
            LinearModel::for_game(&game, &config),
            &config,
            CheckpointFeed::new(rx),
            res_tx,
        );

        let difficulties: Vec<usize> = (0..6).map(|g| worker.play_game(g).unwrap().difficulty).collect();
        assert_eq!(difficulties, vec![0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_game_abandoned_once_learner_leaves() {
        let game = MeanPayoffGame::new().nodes(6).max_moves(40);
        let config = Config::default().with_max_simulations(100_000).with_evaluation(10, 7);
        let (tx, rx) = unbounded::<std::path::PathBuf>();
        let (res_tx, _res_rx) = unbounded();
        let mut worker = EvaluationWorker::new(
            0,
            game.clone(),
            LinearModel::for_game(&game, &config),
            &config,
            CheckpointFeed::new(rx),
            res_tx,
        );
        drop(tx);

        let result = worker.play_game(12).unwrap();
        assert_eq!(result.difficulty, 6);
        assert_eq!(result.outcome, 0.0);
    }

    #[test]
    fn test_run_reports_results() {
        let game = MeanPayoffGame::new().nodes(3).max_moves(2);
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default().with_max_simulations(2).with_evaluation(10, 1);
        let resource = ModelResource::new(LinearModel::for_game(&game, &config), dir.path()).unwrap();
        let path = resource.save_checkpoint(CheckpointTag::Step(0)).unwrap();

        let (tx, rx) = unbounded();
        let (res_tx, res_rx) = unbounded();
        tx.send(path).unwrap();
        let worker = EvaluationWorker::new(
            0,
            game.clone(),
            LinearModel::for_game(&game, &config),
            &config,
            CheckpointFeed::new(rx),
            res_tx,
        );
        let handle = std::thread::spawn(move || worker.run());

        let result = res_rx.recv().unwrap();
        assert_eq!(result.difficulty, 0);
        assert!([-1.0, 0.0, 1.0].contains(&result.outcome));

        drop(tx);
        drop(res_rx);
        assert!(handle.join().unwrap().unwrap() >= 1);
    }
}
