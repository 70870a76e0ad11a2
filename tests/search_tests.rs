//! Search integration tests driven by the cached model evaluator.

use az_selfplay::core::{Config, SeededRng};
use az_selfplay::evaluator::CachedEvaluator;
use az_selfplay::games::mpg::{MeanPayoffGame, MpgState};
use az_selfplay::nn::{LinearModel, UniformModel};
use az_selfplay::rules::{Action, Game, GameState};
use az_selfplay::search::{MctsBot, SearchConfig};

fn placed(game: &MeanPayoffGame, vertex: u32) -> MpgState {
    let mut state = game.new_initial_state(&mut SeededRng::new(5));
    state.apply_action(Action::new(vertex));
    state
}

// =============================================================================
// Cached Search Tests
// =============================================================================

#[test]
fn test_search_fills_cache() {
    let game = MeanPayoffGame::new().nodes(6).max_moves(8);
    let state = placed(&game, 0);
    let config = SearchConfig::evaluation(&Config::default()).with_simulations(32);
    let evaluator = CachedEvaluator::new(UniformModel::new(game.num_distinct_actions()), 1024);
    let mut bot = MctsBot::new(config, evaluator, SeededRng::new(1));

    let result = bot.step(&state, 0).unwrap();
    assert!(state.legal_actions().contains(&result.action));
    assert_eq!(bot.tree().root_node().visits, 32);

    let first = bot.evaluator().cache_info();
    assert!(first.size > 0);
    assert_eq!(first.misses as usize, first.size);

    bot.step(&state, 0).unwrap();
    let second = bot.evaluator().cache_info();
    assert!(second.hits > first.hits);
}

#[test]
fn test_model_search_is_deterministic() {
    let game = MeanPayoffGame::new().nodes(5).max_moves(6);
    let config = Config::default().with_max_simulations(24);
    let state = placed(&game, 2);

    let run = || {
        let evaluator = CachedEvaluator::new(LinearModel::for_game(&game, &config), 256);
        let mut bot = MctsBot::new(SearchConfig::self_play(&config), evaluator, SeededRng::new(9));
        bot.step(&state, 0).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_self_play_game_with_cached_evaluator() {
    let game = MeanPayoffGame::new().nodes(4).max_moves(5);
    let config = Config::default().with_max_simulations(8);
    let evaluator = CachedEvaluator::new(LinearModel::for_game(&game, &config), 128);
    let mut bot = MctsBot::new(SearchConfig::self_play(&config), evaluator, SeededRng::new(3));
    let mut rng = SeededRng::new(4);

    let mut state = game.new_initial_state(&mut rng);
    let mut moves = 0;
    while !state.is_terminal() {
        let action = if state.is_chance_node() {
            state.sample_chance_outcome(&mut rng).unwrap()
        } else {
            moves += 1;
            bot.step(&state, moves - 1).unwrap().action
        };
        state.apply_action(action);
    }

    assert_eq!(moves, 5);
    assert_eq!(state.returns().as_slice().iter().sum::<f64>(), 0.0);
}
