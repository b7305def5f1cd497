//! Observation encoding.
//!
//! Every airline sees the same vector: the joint price vector divided by the
//! observation scale, followed by the fraction of days remaining. The encoder
//! is a pure function of `EpisodeState`, so a serialized state replays to the
//! same observation without touching any demand predictor.

use super::state::EpisodeState;
use crate::spaces::{Box as BoxSpace, DynSpace};
use ndarray::{ArrayD, IxDyn};

#[derive(Clone, Debug, PartialEq)]
pub struct ObservationEncoder {
    num_agents: usize,
    max_days: u32,
    price_scale: f32,
    price_high: f32,
}

impl ObservationEncoder {
    /// `max_price` only sizes the observation space bounds.
    pub fn new(num_agents: usize, max_days: u32, price_scale: f32, max_price: f32) -> Self {
        Self {
            num_agents,
            max_days,
            price_scale,
            price_high: (max_price / price_scale).max(1.0),
        }
    }

    /// Length of every observation (`num_agents + 1`).
    pub fn size(&self) -> usize {
        self.num_agents + 1
    }

    pub fn encode(&self, state: &EpisodeState) -> ArrayD<f32> {
        let mut obs = Vec::with_capacity(self.size());
        obs.extend(state.current_prices.iter().map(|p| p / self.price_scale));
        obs.push(state.days_left as f32 / self.max_days as f32);
        ArrayD::from_shape_vec(IxDyn(&[obs.len()]), obs)
            .expect("observation is one-dimensional")
    }

    /// Inverse of the price part of `encode`.
    pub fn decode_prices(&self, obs: &ArrayD<f32>) -> Vec<f32> {
        obs.iter()
            .take(self.num_agents)
            .map(|p| p * self.price_scale)
            .collect()
    }

    /// Box space covering every encodable observation.
    pub fn space(&self) -> DynSpace {
        let mut high = vec![self.price_high; self.num_agents];
        high.push(1.0);
        let low = ArrayD::zeros(IxDyn(&[self.size()]));
        let high = ArrayD::from_shape_vec(IxDyn(&[self.size()]), high)
            .expect("observation is one-dimensional");
        DynSpace::Box(BoxSpace::new(low, high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::Space;

    #[test]
    fn test_encode_layout() {
        let encoder = ObservationEncoder::new(2, 4, 1000.0, 800.0);
        let state = EpisodeState {
            days_left: 3,
            current_prices: vec![200.0, 500.0],
        };
        let obs = encoder.encode(&state);
        assert_eq!(obs.shape(), &[3]);
        assert_eq!(obs.as_slice().unwrap(), &[0.2, 0.5, 0.75]);
    }

    #[test]
    fn test_encode_is_pure() {
        let encoder = ObservationEncoder::new(3, 30, 1000.0, 800.0);
        let state = EpisodeState::new(3, 30, 400.0);
        assert_eq!(encoder.encode(&state), encoder.encode(&state.clone()));
        assert_eq!(encoder.decode_prices(&encoder.encode(&state)), vec![400.0; 3]);
    }

    #[test]
    fn test_space_contains_encoded_states() {
        let encoder = ObservationEncoder::new(2, 10, 1000.0, 1500.0);
        let DynSpace::Box(space) = encoder.space() else {
            panic!("expected box space");
        };
        let state = EpisodeState {
            days_left: 10,
            current_prices: vec![1500.0, 0.0],
        };
        assert!(space.contains(&encoder.encode(&state)));
        assert_eq!(space.shape(), &[3]);
    }
}
