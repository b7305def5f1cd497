//! Vectorized environment abstraction.
//!
//! A backend owns several independent markets (one per concurrent episode)
//! and exposes them as a single batch with one row per airline per market.
//! Row `env * num_agents + agent` belongs to airline `agent` of market `env`.

use crate::env::{EmulationLayer, EnvInfo, FlatStep, ParallelEnv};
use crate::spaces::DynSpace;
use crate::{ActionFault, MarketError, Result};
use ndarray::{s, Array2};

/// Configuration for vectorized environments
#[derive(Clone, Debug)]
pub struct VecEnvConfig {
    /// Number of environments
    pub num_envs: usize,
    /// Random seed base
    pub seed: u64,
}

impl Default for VecEnvConfig {
    fn default() -> Self {
        Self {
            num_envs: 1,
            seed: 42,
        }
    }
}

impl VecEnvConfig {
    /// Create a new config with specified number of environments
    pub fn new(num_envs: usize) -> Self {
        Self {
            num_envs,
            ..Default::default()
        }
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result from stepping all environments
#[derive(Clone, Debug)]
pub struct VecEnvResult {
    /// Observations, `[num_rows, obs_size]`
    pub observations: Array2<f32>,
    /// Rewards per row
    pub rewards: Vec<f32>,
    /// Terminated flags per row
    pub terminated: Vec<bool>,
    /// Truncated flags per row
    pub truncated: Vec<bool>,
    /// Info per row
    pub infos: Vec<EnvInfo>,
}

impl VecEnvResult {
    /// Check which rows are done
    pub fn dones(&self) -> Vec<bool> {
        self.terminated
            .iter()
            .zip(self.truncated.iter())
            .map(|(&t, &tr)| t || tr)
            .collect()
    }
}

/// Trait for vectorized environment backends
pub trait VecEnvBackend: Send {
    /// Observation space of one row
    fn observation_space(&self) -> DynSpace;

    /// Action space of one row
    fn action_space(&self) -> DynSpace;

    /// Number of markets
    fn num_envs(&self) -> usize;

    /// Airlines per market
    fn num_agents(&self) -> usize;

    /// Total rows in every batch
    fn num_rows(&self) -> usize {
        self.num_envs() * self.num_agents()
    }

    /// Reset all environments; env `i` receives `seed + i`
    fn reset(&mut self, seed: Option<u64>) -> (Array2<f32>, Vec<EnvInfo>);

    /// Step all environments with a `[num_rows, 1]` action batch
    ///
    /// Markets that finished on the previous call are reset instead of
    /// stepped; their rows carry the fresh observation and zero reward.
    /// Every row is checked before any market advances, so a rejected
    /// action leaves the whole batch unchanged.
    fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult>;

    /// Close all environments
    fn close(&mut self);
}

/// Main vectorized environment struct
pub struct VecEnv<B: VecEnvBackend> {
    backend: B,
}

impl<B: VecEnvBackend> VecEnv<B> {
    /// Create from a backend
    pub fn from_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Get observation space
    pub fn observation_space(&self) -> DynSpace {
        self.backend.observation_space()
    }

    /// Get action space
    pub fn action_space(&self) -> DynSpace {
        self.backend.action_space()
    }

    /// Get number of environments
    pub fn num_envs(&self) -> usize {
        self.backend.num_envs()
    }

    /// Total rows per batch
    pub fn num_rows(&self) -> usize {
        self.backend.num_rows()
    }

    /// Reset all environments
    pub fn reset(&mut self, seed: Option<u64>) -> (Array2<f32>, Vec<EnvInfo>) {
        self.backend.reset(seed)
    }

    /// Step all environments
    pub fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult> {
        self.backend.step(actions)
    }

    /// Close all environments
    pub fn close(&mut self) {
        self.backend.close()
    }
}

impl<B: VecEnvBackend> VecEnvBackend for VecEnv<B> {
    fn observation_space(&self) -> DynSpace {
        self.backend.observation_space()
    }

    fn action_space(&self) -> DynSpace {
        self.backend.action_space()
    }

    fn num_envs(&self) -> usize {
        self.backend.num_envs()
    }

    fn num_agents(&self) -> usize {
        self.backend.num_agents()
    }

    fn reset(&mut self, seed: Option<u64>) -> (Array2<f32>, Vec<EnvInfo>) {
        self.backend.reset(seed)
    }

    fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult> {
        self.backend.step(actions)
    }

    fn close(&mut self) {
        self.backend.close()
    }
}

/// Validate a whole batch before any market moves.
///
/// Returns one entry per market: `None` for markets that finished on the
/// previous call and will be reset, otherwise the menu indices to play.
/// Any malformed or out-of-range row rejects the batch with every market
/// left untouched.
pub(crate) fn check_batch<E: ParallelEnv>(
    layer: &EmulationLayer,
    envs: &[E],
    action_space: &DynSpace,
    actions: &Array2<f32>,
) -> Result<Vec<Option<Vec<usize>>>> {
    let n = layer.num_agents();
    let expected = envs.len() * n;
    if actions.nrows() != expected {
        return Err(MarketError::InvalidAction {
            airline: layer.agents()[0].clone(),
            reason: ActionFault::WrongCount {
                expected,
                actual: actions.nrows(),
            },
        });
    }
    let levels = match action_space {
        DynSpace::Discrete(d) => Some(d.n),
        DynSpace::Box(_) => None,
    };

    envs.iter()
        .enumerate()
        .map(|(i, env)| {
            if env.is_done() {
                return Ok(None);
            }
            let indices = layer.unflatten_actions(actions.slice(s![i * n..(i + 1) * n, ..]))?;
            if let Some(len) = levels {
                if let Some((airline, &index)) = layer
                    .agents()
                    .iter()
                    .zip(&indices)
                    .find(|&(_, &index)| index >= len)
                {
                    return Err(MarketError::InvalidAction {
                        airline: airline.clone(),
                        reason: ActionFault::OutOfRange { index, len },
                    });
                }
            }
            Ok(Some(indices))
        })
        .collect()
}

/// Step one market with checked indices, or reset it if `plan` is `None`.
pub(crate) fn step_env<E: ParallelEnv>(
    env: &mut E,
    layer: &EmulationLayer,
    plan: Option<Vec<usize>>,
) -> Result<FlatStep> {
    let Some(indices) = plan else {
        let (obs, infos) = env.reset(None);
        let n = layer.num_agents();
        return Ok(FlatStep {
            observations: layer.flatten_observations(&obs),
            rewards: vec![0.0; n],
            terminated: vec![false; n],
            truncated: vec![false; n],
            infos: infos.into_values(),
        });
    };
    let result = env.step_indices(&indices)?;
    Ok(layer.flatten_step(result))
}

/// Stack per-market steps into one batch.
pub(crate) fn concat_steps(steps: Vec<FlatStep>, obs_size: usize) -> VecEnvResult {
    let rows: usize = steps.iter().map(|s| s.rewards.len()).sum();
    let mut observations = Vec::with_capacity(rows * obs_size);
    let mut result = VecEnvResult {
        observations: Array2::zeros((0, obs_size)),
        rewards: Vec::with_capacity(rows),
        terminated: Vec::with_capacity(rows),
        truncated: Vec::with_capacity(rows),
        infos: Vec::with_capacity(rows),
    };
    for step in steps {
        observations.extend(step.observations.iter().copied());
        result.rewards.extend(step.rewards);
        result.terminated.extend(step.terminated);
        result.truncated.extend(step.truncated);
        result.infos.extend(step.infos);
    }
    result.observations = Array2::from_shape_vec((rows, obs_size), observations)
        .expect("every market emits obs_size columns");
    result
}

/// Stack per-market reset observations into one batch.
pub(crate) fn concat_observations(blocks: Vec<Array2<f32>>, obs_size: usize) -> Array2<f32> {
    let rows: usize = blocks.iter().map(|b| b.nrows()).sum();
    let flat: Vec<f32> = blocks.iter().flat_map(|b| b.iter().copied()).collect();
    Array2::from_shape_vec((rows, obs_size), flat).expect("every market emits obs_size columns")
}
