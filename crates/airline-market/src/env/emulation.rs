//! Flat-batch emulation of the simultaneous-step protocol.
//!
//! Single-agent training libraries expect one observation row, one reward and
//! one done flag per "environment". `EmulationLayer` maps every airline of a
//! market onto its own row and back. It only knows the airline count and the
//! observation width, never the episode state of the market it translates.

use super::{AgentMap, Airline, EnvInfo, MultiAgentStepResult};
use crate::{ActionFault, MarketError, Result};
use ndarray::{Array2, ArrayD, ArrayView2};
use std::sync::Arc;

/// One airline per row
#[derive(Clone, Debug)]
pub struct FlatStep {
    /// `[num_agents, obs_size]`
    pub observations: Array2<f32>,
    pub rewards: Vec<f32>,
    pub terminated: Vec<bool>,
    pub truncated: Vec<bool>,
    pub infos: Vec<EnvInfo>,
}

/// Stateless translator between airline-keyed results and row batches.
#[derive(Clone, Debug)]
pub struct EmulationLayer {
    agents: Arc<[Airline]>,
    obs_size: usize,
}

impl EmulationLayer {
    pub fn new(agents: &[Airline], obs_size: usize) -> Self {
        Self {
            agents: agents.to_vec().into(),
            obs_size,
        }
    }

    pub fn agents(&self) -> &[Airline] {
        &self.agents
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn obs_size(&self) -> usize {
        self.obs_size
    }

    /// Stack per-airline observations into rows, airline order.
    pub fn flatten_observations(&self, observations: &AgentMap<ArrayD<f32>>) -> Array2<f32> {
        let flat: Vec<f32> = observations
            .values()
            .iter()
            .flat_map(|o| o.iter().copied())
            .collect();
        Array2::from_shape_vec((self.agents.len(), self.obs_size), flat)
            .expect("observation width matches emulation layer")
    }

    pub fn flatten_step(&self, result: MultiAgentStepResult) -> FlatStep {
        FlatStep {
            observations: self.flatten_observations(&result.observations),
            rewards: result.rewards.into_values(),
            terminated: result.terminations.into_values(),
            truncated: result.truncations.into_values(),
            infos: result.infos.into_values(),
        }
    }

    /// Convert a `[num_agents, 1]` block of float actions into menu indices.
    ///
    /// Values are rounded; negative or non-finite entries are rejected.
    pub fn unflatten_actions(&self, actions: ArrayView2<'_, f32>) -> Result<Vec<usize>> {
        if actions.nrows() != self.agents.len() {
            return Err(MarketError::InvalidAction {
                airline: self.agents[0].clone(),
                reason: ActionFault::WrongCount {
                    expected: self.agents.len(),
                    actual: actions.nrows(),
                },
            });
        }
        actions
            .rows()
            .into_iter()
            .zip(self.agents.iter())
            .map(|(row, airline)| {
                let missing = || MarketError::InvalidAction {
                    airline: airline.clone(),
                    reason: ActionFault::Missing,
                };
                let value = row.iter().next().copied().ok_or_else(missing)?;
                if !value.is_finite() || value < -0.5 {
                    return Err(MarketError::InvalidAction {
                        airline: airline.clone(),
                        reason: ActionFault::NotAnIndex,
                    });
                }
                Ok(value.round() as usize)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    fn layer() -> EmulationLayer {
        EmulationLayer::new(&[Airline::from("A"), Airline::from("B")], 3)
    }

    #[test]
    fn test_flatten_observations_rows_follow_airline_order() {
        let layer = layer();
        let agents: Arc<[Airline]> = vec![Airline::from("A"), Airline::from("B")].into();
        let obs = AgentMap::from_fn(agents, |i, _| ArrayD::from_elem(IxDyn(&[3]), i as f32));
        let flat = layer.flatten_observations(&obs);
        assert_eq!(flat.shape(), &[2, 3]);
        assert_eq!(flat.row(0).to_vec(), vec![0.0; 3]);
        assert_eq!(flat.row(1).to_vec(), vec![1.0; 3]);
    }

    #[test]
    fn test_unflatten_actions_rounds() {
        let layer = layer();
        let actions = array![[1.2f32], [2.6]];
        assert_eq!(layer.unflatten_actions(actions.view()).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_unflatten_actions_rejects_bad_input() {
        let layer = layer();
        assert!(layer.unflatten_actions(array![[1.0f32]].view()).is_err());

        let err = layer
            .unflatten_actions(array![[0.0f32], [-3.0]].view())
            .unwrap_err();
        assert_eq!(err.airline(), Some(&Airline::from("B")));
        assert!(layer
            .unflatten_actions(array![[f32::NAN], [0.0f32]].view())
            .is_err());
    }
}
