//! The learner: owns the replay buffer and the canonical model.
//!
//! ```text
//! INIT ──► COLLECT ──► TRAIN ──► REPORT ──┬──► COLLECT
//!                                         └──► TERMINATE
//! ```
//!
//! - INIT saves checkpoint 0 and broadcasts it
//! - COLLECT polls every actor channel round-robin without blocking, sleeping
//!   briefly after a round that yields nothing
//! - TRAIN updates the model on a buffer draw and saves a checkpoint
//! - REPORT drains evaluation results and writes one JSON record
//!
//! A failed update ends the run before that step's checkpoint is saved or
//! broadcast.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};

use crate::core::{AlgorithmVersion, Config, SeededRng};
use crate::error::{LoopError, ModelError};
use crate::logging::{CacheRecord, DataLogger, EvalSummary, StepRecord};
use crate::nn::{CheckpointSink, CheckpointTag, Losses, Model, ModelResource};
use crate::rules::Game;
use crate::stats::{BasicStats, HistogramNamed, HistogramNumbered, SlidingWindow};

use super::evaluation::EvalResult;
use super::replay_buffer::ReplayBuffer;
use super::trajectory::{Outcome, TrainInput, Trajectory};

/// Evenly spaced positions per game used for value calibration.
pub const STAGE_COUNT: usize = 7;

/// Pause after a collection round that found nothing.
const IDLE_SLEEP: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    Collect,
    Train,
    Report,
    Terminate,
}

/// What a finished run did.
#[derive(Clone, Debug, PartialEq)]
pub struct LearnerSummary {
    pub steps: u64,
    pub total_trajectories: u64,
    pub total_states: u64,
    pub last_checkpoint: PathBuf,
    pub losses: Losses,
}

/// Per-step accumulators, reset at the start of every step.
#[derive(Clone, Debug)]
struct StepStats {
    value_accuracy: Vec<BasicStats>,
    value_prediction: Vec<BasicStats>,
    game_lengths: BasicStats,
    game_length_hist: HistogramNumbered,
    outcomes: HistogramNamed,
}

impl StepStats {
    fn new(max_game_length: usize) -> Self {
        Self {
            value_accuracy: vec![BasicStats::new(); STAGE_COUNT],
            value_prediction: vec![BasicStats::new(); STAGE_COUNT],
            game_lengths: BasicStats::new(),
            game_length_hist: HistogramNumbered::new(max_game_length + 1),
            outcomes: HistogramNamed::new(Outcome::NAMES),
        }
    }

    fn reset(&mut self) {
        self.value_accuracy.iter_mut().for_each(BasicStats::reset);
        self.value_prediction.iter_mut().for_each(BasicStats::reset);
        self.game_lengths.reset();
        self.game_length_hist.reset();
        self.outcomes.reset();
    }

    fn record(&mut self, trajectory: &Trajectory) {
        let len = trajectory.len();
        self.game_lengths.add(len as f64);
        self.game_length_hist.add(len);
        self.outcomes.add(trajectory.outcome().index());

        for stage in 0..STAGE_COUNT {
            let Some(record) = trajectory.stage_record(stage, STAGE_COUNT) else {
                break;
            };
            let accurate = (record.value >= 0.0) == (trajectory.value_target(record) >= 0.0);
            self.value_accuracy[stage].add(if accurate { 1.0 } else { 0.0 });
            self.value_prediction[stage].add(f64::from(record.value.abs()));
        }
    }
}

fn per_second(count: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}

pub struct Learner<M: Model, S: CheckpointSink> {
    config: Config,
    algorithm: AlgorithmVersion,
    resource: ModelResource<M>,
    sink: S,
    trajectories: Vec<Receiver<Trajectory>>,
    eval_results: Vec<Receiver<EvalResult>>,
    buffer: ReplayBuffer<TrainInput>,
    stats: StepStats,
    evals: Vec<SlidingWindow<f64>>,
    logger: DataLogger,
    rng: SeededRng,
    phase: Phase,
    total_trajectories: u64,
}

impl<M: Model, S: CheckpointSink> Learner<M, S> {
    /// Set up the model resource, replay buffer and JSON log under
    /// `config.path`.
    pub fn new<G: Game>(
        config: &Config,
        game: &G,
        model: M,
        sink: S,
        trajectories: Vec<Receiver<Trajectory>>,
        eval_results: Vec<Receiver<EvalResult>>,
    ) -> Result<Self, LoopError> {
        config.validate()?;
        let algorithm = config.algorithm()?;
        let resource = ModelResource::new(model, &config.path)?;
        let logger = DataLogger::create(&config.path, "learner")?;

        log::info!(
            "Learner: {} parameters, buffer {} (reuse {}), {} actor channels, {} evaluator channels",
            resource.model().num_parameters(),
            config.replay_buffer_size,
            config.replay_buffer_reuse,
            trajectories.len(),
            eval_results.len()
        );

        Ok(Self {
            algorithm,
            resource,
            sink,
            trajectories,
            eval_results,
            buffer: ReplayBuffer::new(config.replay_buffer_size).with_reuse(config.replay_buffer_reuse),
            stats: StepStats::new(game.max_game_length()),
            evals: (0..config.eval_levels)
                .map(|_| SlidingWindow::new(config.evaluation_window))
                .collect(),
            logger,
            rng: SeededRng::new(config.seed).for_context("learner"),
            phase: Phase::Init,
            total_trajectories: 0,
            config: config.clone(),
        })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn buffer(&self) -> &ReplayBuffer<TrainInput> {
        &self.buffer
    }

    #[must_use]
    pub fn resource(&self) -> &ModelResource<M> {
        &self.resource
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("Learner: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Drive the loop until the step budget runs out or something fails.
    pub fn run(mut self) -> Result<LearnerSummary, LoopError> {
        let initial = self.resource.save_checkpoint(CheckpointTag::Step(0))?;
        log::info!("Initial checkpoint: {:?}", initial);
        self.sink.broadcast(&initial);

        let mut last_time = Instant::now();
        let mut step = 0u64;
        loop {
            step += 1;
            self.stats.reset();

            self.enter(Phase::Collect);
            let (num_trajectories, num_states) = self.collect()?;
            self.total_trajectories += num_trajectories;
            let seconds = last_time.elapsed().as_secs_f64();
            last_time = Instant::now();

            log::info!("Step: {}", step);
            log::info!(
                "Collected {} states from {} games, {:.1} states/s, {:.1} states/(s*actor), game length: {:.1}",
                num_states,
                num_trajectories,
                per_second(num_states, seconds),
                per_second(num_states, seconds) / self.config.actors.max(1) as f64,
                self.stats.game_lengths.avg()
            );
            log::info!(
                "Buffer size: {}. States seen: {}",
                self.buffer.len(),
                self.buffer.total_seen()
            );

            self.enter(Phase::Train);
            let (path, tag, losses) = self.train(step)?;

            self.enter(Phase::Report);
            self.report(step, tag, losses, num_trajectories, num_states, seconds)?;

            if self.config.max_steps > 0 && step as i64 >= self.config.max_steps {
                self.enter(Phase::Terminate);
                log::info!("Step budget of {} reached", self.config.max_steps);
                return Ok(LearnerSummary {
                    steps: step,
                    total_trajectories: self.total_trajectories,
                    total_states: self.buffer.total_seen(),
                    last_checkpoint: path,
                    losses,
                });
            }

            self.sink.broadcast(&path);
        }
    }

    /// Pull trajectories until this step has enough new states.
    fn collect(&mut self) -> Result<(u64, u64), LoopError> {
        if self.algorithm == AlgorithmVersion::Refresh {
            self.buffer.clear();
        }

        let mut num_trajectories = 0u64;
        let mut num_states = 0u64;
        loop {
            let mut found = 0usize;
            let mut connected = 0usize;

            for i in 0..self.trajectories.len() {
                let received = self.trajectories[i].try_recv();
                match received {
                    Ok(trajectory) => {
                        found += 1;
                        connected += 1;
                        num_trajectories += 1;
                        num_states += trajectory.len() as u64;
                        self.stats.record(&trajectory);
                        self.buffer.extend(trajectory.train_inputs());

                        if self.collected_enough(num_states) {
                            return Ok((num_trajectories, num_states));
                        }
                    }
                    Err(TryRecvError::Empty) => connected += 1,
                    Err(TryRecvError::Disconnected) => {}
                }
            }

            if found == 0 {
                if connected == 0 {
                    return Err(LoopError::ActorsDisconnected);
                }
                thread::sleep(IDLE_SLEEP);
            }
        }
    }

    fn collected_enough(&self, num_states: u64) -> bool {
        match self.algorithm {
            AlgorithmVersion::ReuseThreshold => num_states >= self.config.learn_rate() as u64,
            AlgorithmVersion::Refresh => {
                self.buffer.len() >= self.config.refresh_min_states.min(self.buffer.capacity())
            }
        }
    }

    /// Update the model and persist the result.
    fn train(&mut self, step: u64) -> Result<(PathBuf, CheckpointTag, Losses), LoopError> {
        let data: Vec<TrainInput> = if self.config.dataset_mode {
            self.buffer.dataset().cloned().collect()
        } else {
            let draws = match self.config.samples_per_iteration {
                0 => self.buffer.len(),
                n => n,
            };
            self.buffer.sample(draws, &mut self.rng)?
        };
        if data.is_empty() {
            return Err(ModelError::EmptyBatch.into());
        }

        let mut losses = Vec::new();
        for batch in data.chunks(self.config.train_batch_size.max(1)) {
            losses.push(self.resource.model_mut().update(batch)?);
        }
        let losses = Losses::mean(&losses);

        let tag = CheckpointTag::for_step(step, self.config.checkpoint_freq);
        let path = self.resource.save_checkpoint(tag)?;
        log::info!("{}", losses);
        log::info!("Checkpoint saved: {:?}", path);
        Ok((path, tag, losses))
    }

    fn drain_evaluations(&mut self) {
        for rx in &self.eval_results {
            while let Ok(result) = rx.try_recv() {
                match self.evals.get_mut(result.difficulty) {
                    Some(window) => window.add(result.outcome),
                    None => log::warn!(
                        "Dropping evaluation result with difficulty {} (levels: {})",
                        result.difficulty,
                        self.evals.len()
                    ),
                }
            }
        }
    }

    fn report(
        &mut self,
        step: u64,
        tag: CheckpointTag,
        losses: Losses,
        num_trajectories: u64,
        num_states: u64,
        seconds: f64,
    ) -> Result<(), LoopError> {
        self.drain_evaluations();

        let model_hash = self.resource.hash()?;
        log::info!("Broadcasting checkpoint. Model hash is {}", model_hash);

        let mut batch_size = BasicStats::new();
        batch_size.add(1.0);

        let states_per_s = per_second(num_states, seconds);
        let record = StepRecord {
            step,
            states_per_s,
            states_per_s_actor: states_per_s / self.config.actors.max(1) as f64,
            total_trajectories: self.total_trajectories,
            trajectories_per_s: per_second(num_trajectories, seconds),
            queue_size: 0,
            buffer: self.buffer.analysis_data(),
            game_length: self.stats.game_lengths.snapshot(),
            game_length_hist: self.stats.game_length_hist.snapshot(),
            outcomes: self.stats.outcomes.snapshot(),
            value_accuracy: self.stats.value_accuracy.iter().map(BasicStats::snapshot).collect(),
            value_prediction: self.stats.value_prediction.iter().map(BasicStats::snapshot).collect(),
            eval: EvalSummary {
                count: self.evals.first().map_or(0, SlidingWindow::total_seen),
                results: self.evals.iter().map(SlidingWindow::mean).collect(),
            },
            batch_size: batch_size.snapshot(),
            batch_size_hist: vec![0, 1],
            loss: losses.into(),
            cache: CacheRecord::default(),
            model_hash,
            checkpoint: tag.as_i64(),
        };
        self.logger.write(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlayerId, PlayerMap};
    use crate::games::mpg::MeanPayoffGame;
    use crate::nn::UniformModel;
    use crate::rules::Observation;
    use crate::training::StateRecord;
    use crossbeam_channel::{unbounded, Sender};

    fn trajectory(len: usize, first_player_return: f64) -> Trajectory {
        let states = (0..len)
            .map(|i| {
                StateRecord::new(
                    Observation::new(vec![], vec![i as f32]),
                    vec![0.5, 0.5],
                    0.5,
                    Some(PlayerId::new((i % 2) as u8)),
                    false,
                )
            })
            .collect();
        Trajectory::new(states, PlayerMap::from(vec![first_player_return, -first_player_return]))
    }

    fn config(dir: &std::path::Path) -> Config {
        Config::default()
            .with_path(dir)
            .with_replay_buffer(8, 2)
            .with_train_batch_size(4)
            .with_evaluation(4, 2)
            .with_workers(1, 1)
    }

    fn recording_sink() -> (impl FnMut(&std::path::Path), Receiver<PathBuf>) {
        let (tx, rx): (Sender<PathBuf>, Receiver<PathBuf>) = unbounded();
        (move |path: &std::path::Path| { let _ = tx.send(path.to_path_buf()); }, rx)
    }

    fn records(dir: &std::path::Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(dir.join("learner.jsonl"))
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_collect_stops_at_learn_rate() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path()).with_max_steps(1);
        let (tx, rx) = unbounded();
        for _ in 0..5 {
            tx.send(trajectory(3, 1.0)).unwrap();
        }
        let pending = rx.clone();
        let (sink, broadcasts) = recording_sink();
        let learner = Learner::new(&config, &MeanPayoffGame::new(), UniformModel::new(2), sink, vec![rx], vec![]).unwrap();

        let summary = learner.run().unwrap();
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.total_trajectories, 2);
        assert_eq!(summary.total_states, 6);
        assert_eq!(pending.len(), 3);

        let paths: Vec<PathBuf> = broadcasts.try_iter().collect();
        assert_eq!(paths, vec![dir.path().join("checkpoint-0.bin")]);

        let log = records(dir.path());
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["step"], 1);
        assert_eq!(log[0]["total_states"], 6);
        assert_eq!(log[0]["outcomes"]["data"], serde_json::json!([2, 0, 0]));
        assert_eq!(log[0]["game_length"]["avg"], 3.0);
        assert_eq!(log[0]["batch_size_hist"], serde_json::json!([0, 1]));
        assert_eq!(log[0]["value_accuracy"].as_array().unwrap().len(), STAGE_COUNT);
    }

    #[test]
    fn test_disconnected_actor_does_not_stall_collection() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path()).with_max_steps(2);
        let (dead_tx, dead_rx) = unbounded::<Trajectory>();
        drop(dead_tx);
        let (tx, rx) = unbounded();
        for _ in 0..4 {
            tx.send(trajectory(2, -1.0)).unwrap();
        }
        let (sink, _broadcasts) = recording_sink();
        let learner = Learner::new(
            &config,
            &MeanPayoffGame::new(),
            UniformModel::new(2),
            sink,
            vec![dead_rx, rx],
            vec![],
        )
        .unwrap();

        let summary = learner.run().unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.total_trajectories, 4);
        assert_eq!(summary.total_states, 8);
        assert_eq!(records(dir.path()).len(), 2);
    }

    #[test]
    fn test_checkpoint_numbering_and_broadcasts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path()).with_max_steps(3).with_checkpoint_freq(2);
        let (tx, rx) = unbounded();
        for _ in 0..6 {
            tx.send(trajectory(4, -1.0)).unwrap();
        }
        let (sink, broadcasts) = recording_sink();
        let learner = Learner::new(&config, &MeanPayoffGame::new(), UniformModel::new(2), sink, vec![rx], vec![]).unwrap();

        let summary = learner.run().unwrap();
        assert_eq!(summary.last_checkpoint, dir.path().join("checkpoint-latest.bin"));

        let paths: Vec<PathBuf> = broadcasts.try_iter().collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("checkpoint-0.bin"),
                dir.path().join("checkpoint-latest.bin"),
                dir.path().join("checkpoint-2.bin"),
            ]
        );
        let checkpoints: Vec<i64> = records(dir.path()).iter().map(|r| r["checkpoint"].as_i64().unwrap()).collect();
        assert_eq!(checkpoints, vec![-1, 2, -1]);
    }

    #[test]
    fn test_all_actors_gone_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (tx, rx) = unbounded::<Trajectory>();
        tx.send(trajectory(1, 0.0)).unwrap();
        drop(tx);
        let (sink, _broadcasts) = recording_sink();
        let learner = Learner::new(&config, &MeanPayoffGame::new(), UniformModel::new(2), sink, vec![rx], vec![]).unwrap();

        assert!(matches!(learner.run(), Err(LoopError::ActorsDisconnected)));
    }

    struct BrokenModel;

    impl Model for BrokenModel {
        fn inference(&self, _: &[f32], _: &[f32]) -> Result<crate::nn::Inference, ModelError> {
            Err(ModelError::EmptyBatch)
        }
        fn update(&mut self, _: &[TrainInput]) -> Result<Losses, ModelError> {
            Err(ModelError::EmptyBatch)
        }
        fn save_weights(&self) -> Result<Vec<u8>, ModelError> {
            Ok(vec![1, 2, 3])
        }
        fn load_weights(&mut self, _: &[u8]) -> Result<(), ModelError> {
            Ok(())
        }
        fn num_parameters(&self) -> usize {
            3
        }
    }

    #[test]
    fn test_update_failure_skips_checkpoint_and_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path()).with_max_steps(5);
        let (tx, rx) = unbounded();
        for _ in 0..4 {
            tx.send(trajectory(2, 1.0)).unwrap();
        }
        let (sink, broadcasts) = recording_sink();
        let learner = Learner::new(&config, &MeanPayoffGame::new(), BrokenModel, sink, vec![rx], vec![]).unwrap();

        assert!(matches!(learner.run(), Err(LoopError::Model(ModelError::EmptyBatch))));
        assert_eq!(broadcasts.try_iter().count(), 1);
        assert!(!dir.path().join("checkpoint-latest.bin").exists());
        assert!(records(dir.path()).is_empty());
    }

    #[test]
    fn test_evaluation_results_bucketed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path()).with_max_steps(1);
        let (tx, rx) = unbounded();
        for _ in 0..2 {
            tx.send(trajectory(2, 0.0)).unwrap();
        }
        let (eval_tx, eval_rx) = unbounded();
        for (difficulty, outcome) in [(0, 1.0), (0, 0.0), (1, -1.0), (5, 1.0)] {
            eval_tx.send(EvalResult { difficulty, outcome }).unwrap();
        }
        let (sink, _broadcasts) = recording_sink();
        let learner = Learner::new(&config, &MeanPayoffGame::new(), UniformModel::new(2), sink, vec![rx], vec![eval_rx]).unwrap();
        learner.run().unwrap();

        let log = records(dir.path());
        assert_eq!(log[0]["eval"]["count"], 2);
        assert_eq!(log[0]["eval"]["results"], serde_json::json!([0.5, -1.0]));
        assert_eq!(log[0]["outcomes"]["data"], serde_json::json!([0, 0, 2]));
    }

    #[test]
    fn test_refresh_mode_rebuilds_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path())
            .with_version(2)
            .with_refresh_min_states(4)
            .with_dataset_mode(true)
            .with_max_steps(2);
        let (tx, rx) = unbounded();
        for _ in 0..4 {
            tx.send(trajectory(2, 1.0)).unwrap();
        }
        let (sink, _broadcasts) = recording_sink();
        let learner = Learner::new(&config, &MeanPayoffGame::new(), UniformModel::new(2), sink, vec![rx], vec![]).unwrap();

        let summary = learner.run().unwrap();
        assert_eq!(summary.total_states, 8);

        let log = records(dir.path());
        let sizes: Vec<u64> = log.iter().map(|r| r["buffer_size"].as_u64().unwrap()).collect();
        assert_eq!(sizes, vec![4, 4]);
    }

    #[test]
    fn test_value_calibration_stages() {
        let mut stats = StepStats::new(10);
        // Value 0.5 at every record; player 0 wins, so records of player 1 are wrong.
        stats.record(&trajectory(7, 1.0));

        let accuracy: Vec<f64> = stats.value_accuracy.iter().map(BasicStats::avg).collect();
        assert_eq!(accuracy, vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        assert!(stats.value_prediction.iter().all(|s| (s.avg() - 0.5).abs() < 1e-9));
        assert_eq!(stats.game_length_hist.data()[7], 1);

        stats.reset();
        assert_eq!(stats.game_lengths.num(), 0);
    }
}
