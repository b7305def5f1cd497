//! Core environment trait definitions.

use super::agents::{AgentMap, Airline};
use crate::spaces::DynSpace;
use crate::Result;
use ndarray::ArrayD;
use std::collections::HashMap;

/// Information returned from environment steps
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvInfo {
    /// Episode return (if done)
    pub episode_return: Option<f32>,
    /// Episode length (if done)
    pub episode_length: Option<f32>,
    /// Custom metrics (kept minimal for performance)
    pub extra: smallvec::SmallVec<[(&'static str, f32); 4]>,
}

impl EnvInfo {
    /// Create empty info
    pub fn new() -> Self {
        Self::default()
    }

    /// Add episode stats
    pub fn with_episode_stats(mut self, ret: f32, len: u32) -> Self {
        self.episode_return = Some(ret);
        self.episode_length = Some(len as f32);
        self
    }

    /// Add a custom metric
    pub fn with_extra(mut self, key: &'static str, value: f32) -> Self {
        self.extra.push((key, value));
        self
    }

    /// Get a value by key (including defaults)
    pub fn get(&self, key: &str) -> Option<f32> {
        match key {
            "episode_return" => self.episode_return,
            "episode_length" => self.episode_length,
            _ => self.extra.iter().find(|(k, _)| k == &key).map(|(_, v)| *v),
        }
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.episode_return.is_none() && self.episode_length.is_none() && self.extra.is_empty()
    }
}

/// Result from a simultaneous multi-agent step, keyed by airline.
#[derive(Clone, Debug)]
pub struct MultiAgentStepResult {
    /// Observations for each airline (post-update state)
    pub observations: AgentMap<ArrayD<f32>>,
    /// Rewards for each airline
    pub rewards: AgentMap<f32>,
    /// Termination flags for each airline
    pub terminations: AgentMap<bool>,
    /// Truncation flags for each airline
    pub truncations: AgentMap<bool>,
    /// Additional info for each airline
    pub infos: AgentMap<EnvInfo>,
}

impl MultiAgentStepResult {
    /// True once every airline is terminated or truncated.
    pub fn all_done(&self) -> bool {
        self.terminations
            .values()
            .iter()
            .zip(self.truncations.values())
            .all(|(&t, &tr)| t || tr)
    }
}

/// Parallel (simultaneous-move) multi-agent environment.
///
/// Every airline submits one action per round; the environment answers with
/// observations, rewards, terminations, truncations and infos for all of them.
///
/// # Example
///
/// ```rust,ignore
/// let (obs, _) = env.reset(None);
/// loop {
///     let actions = choose(&obs);
///     let result = env.step(&actions)?;
///     if result.all_done() {
///         break;
///     }
/// }
/// ```
pub trait ParallelEnv: Send {
    /// Fixed, ordered airline identities
    fn possible_agents(&self) -> &[Airline];

    /// Observation space of one airline
    fn observation_space(&self, agent: &Airline) -> DynSpace;

    /// Action space of one airline
    fn action_space(&self, agent: &Airline) -> DynSpace;

    /// Reset the environment to the start of a new episode
    ///
    /// # Arguments
    /// * `seed` - Optional random seed for reproducibility
    fn reset(&mut self, seed: Option<u64>) -> (AgentMap<ArrayD<f32>>, AgentMap<EnvInfo>);

    /// Apply one action per airline and advance one round
    fn step(&mut self, actions: &HashMap<Airline, usize>) -> Result<MultiAgentStepResult>;

    /// Same as `step` with actions already in airline order
    fn step_indices(&mut self, actions: &[usize]) -> Result<MultiAgentStepResult> {
        let map = self
            .possible_agents()
            .iter()
            .cloned()
            .zip(actions.iter().copied())
            .collect();
        self.step(&map)
    }

    /// Optional: Render the environment
    fn render(&self) -> Option<String> {
        None
    }

    /// Optional: Close the environment and free resources
    fn close(&mut self) {}

    /// Number of airlines
    fn num_agents(&self) -> usize {
        self.possible_agents().len()
    }

    /// Check if environment is done and needs reset
    fn is_done(&self) -> bool {
        false
    }
}
