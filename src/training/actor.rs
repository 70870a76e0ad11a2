//! Self-play worker.
//!
//! An actor repeatedly plays complete games against itself, choosing each
//! move with a search driven by its own `CachedEvaluator`, and sends one
//! `Trajectory` per finished game to the learner.
//!
//! - Blocks only once, for the initial checkpoint
//! - Polls for newer checkpoints between moves without blocking; a reload
//!   may land mid-game and the game simply continues with the new weights
//! - Never waits on the learner: the trajectory channel is unbounded
//! - Exits at a game boundary once the learner has hung up

use crossbeam_channel::Sender;

use crate::core::{Config, SeededRng};
use crate::error::{EvalError, LoopError};
use crate::evaluator::CachedEvaluator;
use crate::nn::Model;
use crate::rules::{Game, GameState};
use crate::search::{MctsBot, SearchConfig};

use super::feed::CheckpointFeed;
use super::trajectory::{StateRecord, Trajectory};

/// Work done by an actor before it exited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActorSummary {
    pub games: u64,
    pub states: u64,
    pub reloads: u64,
}

pub struct Actor<G: Game, M: Model> {
    name: String,
    game: G,
    bot: MctsBot<CachedEvaluator<M>>,
    checkpoints: CheckpointFeed,
    trajectories: Sender<Trajectory>,
    rng: SeededRng,
    summary: ActorSummary,
}

impl<G: Game, M: Model> Actor<G, M> {
    pub fn new(
        id: usize,
        game: G,
        model: M,
        config: &Config,
        checkpoints: CheckpointFeed,
        trajectories: Sender<Trajectory>,
    ) -> Self {
        let name = format!("actor-{}", id);
        let mut rng = SeededRng::new(config.seed).for_context(&name);
        let evaluator = CachedEvaluator::new(model, config.cache_size);
        let bot = MctsBot::new(SearchConfig::self_play(config), evaluator, rng.fork());
        Self {
            name,
            game,
            bot,
            checkpoints,
            trajectories,
            rng,
            summary: ActorSummary::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Play games until the learner goes away.
    pub fn run(mut self) -> Result<ActorSummary, LoopError> {
        let Some(initial) = self.checkpoints.wait() else {
            log::info!("{}: learner gone before the first checkpoint", self.name);
            return Ok(self.summary);
        };
        self.bot.evaluator_mut().load_checkpoint(&initial)?;
        log::info!("{}: starting from {:?}", self.name, initial);

        loop {
            let trajectory = self.play_game()?;
            let states = trajectory.len() as u64;
            if self.trajectories.send(trajectory).is_err() {
                break;
            }
            self.summary.games += 1;
            self.summary.states += states;

            if self.checkpoints.is_disconnected() {
                break;
            }
        }

        log::info!(
            "{}: exiting after {} games, {} states",
            self.name,
            self.summary.games,
            self.summary.states
        );
        Ok(self.summary)
    }

    /// Play one complete game. Only decision positions are recorded.
    pub fn play_game(&mut self) -> Result<Trajectory, LoopError> {
        let num_actions = self.game.num_distinct_actions();
        let max_moves = self.game.max_game_length();
        let mut state = self.game.new_initial_state(&mut self.rng);
        let mut records = Vec::new();
        let mut moves = 0;

        while !state.is_terminal() && moves < max_moves {
            self.refresh_weights()?;

            if state.is_chance_node() {
                let action = state
                    .sample_chance_outcome(&mut self.rng)
                    .ok_or(EvalError::NoLegalActions)?;
                state.apply_action(action);
                continue;
            }

            let result = self.bot.step(&state, moves)?;
            records.push(StateRecord::new(
                state.observation(),
                result.policy(num_actions),
                result.value,
                state.current_player(),
                false,
            ));
            state.apply_action(result.action);
            moves += 1;
        }

        log::debug!(
            "{}: game finished in {} moves, returns {:?}",
            self.name,
            moves,
            state.returns().as_slice()
        );
        Ok(Trajectory::new(records, state.returns()))
    }

    fn refresh_weights(&mut self) -> Result<(), LoopError> {
        if let Some(path) = self.checkpoints.poll() {
            self.bot.evaluator_mut().load_checkpoint(&path)?;
            self.summary.reloads += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::mpg::MeanPayoffGame;
    use crate::nn::{CheckpointTag, LinearModel, ModelResource};
    use crossbeam_channel::unbounded;

    fn setup() -> (MeanPayoffGame, Config, tempfile::TempDir) {
        let game = MeanPayoffGame::new().nodes(4).max_moves(6);
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default()
            .with_path(dir.path())
            .with_max_simulations(8)
            .with_cache_size(256);
        (game, config, dir)
    }

    #[test]
    fn test_play_game_records_decisions() {
        let (game, config, _dir) = setup();
        let (_ckpt_tx, ckpt_rx) = unbounded();
        let (traj_tx, _traj_rx) = unbounded();
        let model = LinearModel::for_game(&game, &config);
        let mut actor = Actor::new(0, game.clone(), model, &config, CheckpointFeed::new(ckpt_rx), traj_tx);

        let trajectory = actor.play_game().unwrap();
        assert_eq!(trajectory.len(), 6);
        for record in &trajectory.states {
            assert!(!record.is_chance);
            assert!(record.current_player.is_some());
            assert_eq!(record.policy.len(), 4);
            assert!((record.policy.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }
        let players: Vec<_> = trajectory.states.iter().map(|r| r.acting_player().index()).collect();
        assert_eq!(players, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_checkpoint_during_game_keeps_playing() {
        let (game, config, dir) = setup();
        let resource = ModelResource::new(LinearModel::for_game(&game, &config), dir.path()).unwrap();
        let first = resource.save_checkpoint(CheckpointTag::Step(0)).unwrap();
        let newest = resource.save_checkpoint(CheckpointTag::Latest).unwrap();

        let (ckpt_tx, ckpt_rx) = unbounded();
        let (traj_tx, _traj_rx) = unbounded();
        let model = LinearModel::for_game(&game, &config);
        let mut actor = Actor::new(0, game.clone(), model, &config, CheckpointFeed::new(ckpt_rx), traj_tx);
        ckpt_tx.send(first).unwrap();
        ckpt_tx.send(newest).unwrap();

        let trajectory = actor.play_game().unwrap();
        assert_eq!(trajectory.len(), 6);
        assert_eq!(actor.summary.reloads, 1);

        let again = actor.play_game().unwrap();
        assert_eq!(again.len(), 6);
        assert_eq!(actor.summary.reloads, 1);
    }

    #[test]
    fn test_run_sends_and_exits_when_learner_leaves() {
        let (game, config, dir) = setup();
        let resource = ModelResource::new(LinearModel::for_game(&game, &config), dir.path()).unwrap();
        let path = resource.save_checkpoint(CheckpointTag::Step(0)).unwrap();

        let (ckpt_tx, ckpt_rx) = unbounded();
        let (traj_tx, traj_rx) = unbounded();
        ckpt_tx.send(path).unwrap();

        let actor = Actor::new(
            1,
            game.clone(),
            LinearModel::for_game(&game, &config),
            &config,
            CheckpointFeed::new(ckpt_rx),
            traj_tx,
        );
        let handle = std::thread::spawn(move || actor.run());

        let first = traj_rx.recv().unwrap();
        assert_eq!(first.len(), 6);

        drop(ckpt_tx);
        drop(traj_rx);
        let summary = handle.join().unwrap().unwrap();
        assert!(summary.games >= 1);
    }

    #[test]
    fn test_run_without_checkpoint_returns() {
        let (game, config, _dir) = setup();
        let (ckpt_tx, ckpt_rx) = unbounded::<std::path::PathBuf>();
        let (traj_tx, traj_rx) = unbounded();
        drop(ckpt_tx);

        let actor = Actor::new(0, game.clone(), LinearModel::for_game(&game, &config), &config, CheckpointFeed::new(ckpt_rx), traj_tx);
        assert_eq!(actor.run().unwrap(), ActorSummary::default());
        assert!(traj_rx.try_recv().is_err());
    }

    #[test]
    fn test_bad_checkpoint_is_fatal() {
        let (game, config, dir) = setup();
        let bogus = dir.path().join("bogus.bin");
        std::fs::write(&bogus, b"not weights").unwrap();

        let (ckpt_tx, ckpt_rx) = unbounded();
        let (traj_tx, _traj_rx) = unbounded();
        ckpt_tx.send(bogus).unwrap();

        let actor = Actor::new(0, game.clone(), LinearModel::for_game(&game, &config), &config, CheckpointFeed::new(ckpt_rx), traj_tx);
        assert!(matches!(actor.run(), Err(LoopError::Model(_))));
    }
}
