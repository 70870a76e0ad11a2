//! Search parameters.

use serde::{Deserialize, Serialize};

use crate::core::Config;

/// PUCT search configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Exploration constant in the PUCT formula.
    pub uct_c: f64,

    /// Simulations per move.
    pub max_simulations: u32,

    /// Dirichlet concentration of root noise.
    pub dirichlet_alpha: f32,

    /// Weight of root noise (0 disables it).
    pub dirichlet_epsilon: f32,

    /// Visit-count temperature for move selection (0 = greedy).
    pub temperature: f32,

    /// Switch to greedy selection from this move on.
    pub temperature_drop: usize,

    /// Stop adding simulations once the tree holds this many nodes.
    pub max_nodes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            uct_c: 2.0,
            max_simulations: 100,
            dirichlet_alpha: 1.0,
            dirichlet_epsilon: 0.0,
            temperature: 0.0,
            temperature_drop: 0,
            max_nodes: 1 << 20,
        }
    }
}

impl SearchConfig {
    /// Self-play settings: root noise and early-game temperature.
    pub fn self_play(config: &Config) -> Self {
        Self {
            uct_c: f64::from(config.uct_c),
            max_simulations: config.max_simulations,
            dirichlet_alpha: config.policy_alpha,
            dirichlet_epsilon: config.policy_epsilon,
            temperature: config.temperature,
            temperature_drop: config.temperature_drop,
            ..Self::default()
        }
    }

    /// Evaluation settings: no noise, always greedy.
    pub fn evaluation(config: &Config) -> Self {
        Self {
            uct_c: f64::from(config.uct_c),
            max_simulations: config.max_simulations,
            ..Self::default()
        }
    }

    pub fn with_simulations(mut self, simulations: u32) -> Self {
        self.max_simulations = simulations.max(1);
        self
    }

    pub fn with_exploration(mut self, c: f64) -> Self {
        self.uct_c = c;
        self
    }

    /// Set root noise.
    pub fn with_noise(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Sample with `temperature` for the first `drop` moves.
    pub fn with_temperature(mut self, temperature: f32, drop: usize) -> Self {
        self.temperature = temperature;
        self.temperature_drop = drop;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_play_from_config() {
        let config = Config::default();
        let search = SearchConfig::self_play(&config);
        assert_eq!(search.max_simulations, 300);
        assert_eq!(search.dirichlet_epsilon, 0.25);
        assert_eq!(search.temperature_drop, 10);
    }

    #[test]
    fn test_evaluation_is_greedy() {
        let search = SearchConfig::evaluation(&Config::default());
        assert_eq!(search.temperature, 0.0);
        assert_eq!(search.dirichlet_epsilon, 0.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SearchConfig::default()
            .with_simulations(0)
            .with_exploration(1.5)
            .with_noise(0.3, 0.25)
            .with_temperature(1.0, 4);

        assert_eq!(config.max_simulations, 1);
        assert_eq!(config.uct_c, 1.5);
        assert_eq!(config.dirichlet_alpha, 0.3);
        assert_eq!(config.temperature_drop, 4);
    }
}
