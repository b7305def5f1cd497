//! Serial (sequential) vectorization backend.
//!
//! Runs markets one at a time in a single thread.
//! Useful for debugging and small-scale experiments.

use super::vecenv::{
    check_batch, concat_observations, concat_steps, step_env, VecEnvBackend, VecEnvResult,
};
use crate::env::{EmulationLayer, EnvInfo, ParallelEnv};
use crate::spaces::DynSpace;
use crate::{MarketError, Result};
use ndarray::Array2;

/// Serial vectorization backend
pub struct Serial<E: ParallelEnv> {
    /// Created environments
    envs: Vec<E>,
    /// Row translation shared by all envs
    layer: EmulationLayer,
    /// Cached spaces (all airlines share them)
    obs_space: DynSpace,
    action_space: DynSpace,
}

impl<E: ParallelEnv> Serial<E> {
    /// Create a new serial backend
    pub fn new<F>(env_creator: F, num_envs: usize) -> Result<Self>
    where
        F: Fn() -> Result<E>,
    {
        if num_envs == 0 {
            return Err(MarketError::config("number of environments must be > 0"));
        }

        // Create first env to get spaces
        let first_env = env_creator()?;
        let agent = first_env.possible_agents()[0].clone();
        let obs_space = first_env.observation_space(&agent);
        let action_space = first_env.action_space(&agent);
        let layer = EmulationLayer::new(
            first_env.possible_agents(),
            obs_space.shape().iter().product(),
        );

        // Create all envs
        let mut envs = Vec::with_capacity(num_envs);
        envs.push(first_env);
        for _ in 1..num_envs {
            envs.push(env_creator()?);
        }

        Ok(Self {
            envs,
            layer,
            obs_space,
            action_space,
        })
    }

    /// Borrow one market
    pub fn env(&self, index: usize) -> Option<&E> {
        self.envs.get(index)
    }
}

impl<E: ParallelEnv> VecEnvBackend for Serial<E> {
    fn observation_space(&self) -> DynSpace {
        self.obs_space.clone()
    }

    fn action_space(&self) -> DynSpace {
        self.action_space.clone()
    }

    fn num_envs(&self) -> usize {
        self.envs.len()
    }

    fn num_agents(&self) -> usize {
        self.layer.num_agents()
    }

    fn reset(&mut self, seed: Option<u64>) -> (Array2<f32>, Vec<EnvInfo>) {
        let mut blocks = Vec::with_capacity(self.envs.len());
        let mut infos = Vec::with_capacity(self.num_rows());

        for (i, env) in self.envs.iter_mut().enumerate() {
            let env_seed = seed.map(|s| s.wrapping_add(i as u64));
            let (obs, info) = env.reset(env_seed);
            blocks.push(self.layer.flatten_observations(&obs));
            infos.extend(info.into_values());
        }

        (concat_observations(blocks, self.layer.obs_size()), infos)
    }

    fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult> {
        let plans = check_batch(&self.layer, &self.envs, &self.action_space, actions)?;
        let mut steps = Vec::with_capacity(self.envs.len());

        for (env, plan) in self.envs.iter_mut().zip(plans) {
            steps.push(step_env(env, &self.layer, plan)?);
        }

        Ok(concat_steps(steps, self.layer.obs_size()))
    }

    fn close(&mut self) {
        for env in &mut self.envs {
            env.close();
        }
    }
}
