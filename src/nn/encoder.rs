//! Cache keys for model inputs.
//!
//! A `StateKey` identifies a model input exactly: the player to move plus
//! the bit patterns of every observation feature. Two states share a key
//! only if the model would see identical inputs for them, so a cached
//! inference can never be served for a different position.

use crate::core::PlayerId;
use crate::rules::Observation;

/// Exact, hashable identity of a model input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    player: Option<PlayerId>,
    /// Environment length, then environment bits, then state bits.
    features: Box<[u32]>,
}

impl StateKey {
    /// Build a key from an observation.
    pub fn new(player: Option<PlayerId>, observation: &Observation) -> Self {
        let mut features =
            Vec::with_capacity(1 + observation.environment.len() + observation.state.len());
        features.push(observation.environment.len() as u32);
        features.extend(
            observation
                .environment
                .iter()
                .chain(observation.state.iter())
                .map(|&x| feature_bits(x)),
        );
        Self {
            player,
            features: features.into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }
}

/// `0.0` and `-0.0` feed the model identically, so they share a key.
fn feature_bits(x: f32) -> u32 {
    if x == 0.0 {
        0
    } else {
        x.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_identical_inputs_share_key() {
        let obs = Observation::new(vec![1.0, 0.0], vec![0.5]);
        let a = StateKey::new(Some(PlayerId::new(0)), &obs);
        let b = StateKey::new(Some(PlayerId::new(0)), &obs.clone());
        assert_eq!(a, b);
    }

    #[test]
    fn test_player_distinguishes() {
        let obs = Observation::new(vec![1.0], vec![0.5]);
        let a = StateKey::new(Some(PlayerId::new(0)), &obs);
        let b = StateKey::new(Some(PlayerId::new(1)), &obs);
        assert_ne!(a, b);
        assert_eq!(b.player(), Some(PlayerId::new(1)));
    }

    #[test]
    fn test_split_point_distinguishes() {
        let a = StateKey::new(None, &Observation::new(vec![1.0], vec![2.0, 3.0]));
        let b = StateKey::new(None, &Observation::new(vec![1.0, 2.0], vec![3.0]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_signed_zero_is_same_key() {
        let a = StateKey::new(None, &Observation::new(vec![0.0], vec![]));
        let b = StateKey::new(None, &Observation::new(vec![-0.0], vec![]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_differences_are_kept() {
        let mut keys = FxHashSet::default();
        for i in 0..100 {
            let x = 1.0 + i as f32 * f32::EPSILON;
            keys.insert(StateKey::new(None, &Observation::new(vec![], vec![x])));
        }
        assert_eq!(keys.len(), 100);
    }
}
