//! Parallel vectorization backend.
//!
//! Steps markets concurrently using rayon. Each market is still owned by
//! exactly one worker per call; demand predictors may be shared between
//! markets because they are `Send + Sync` and read-only.

use super::vecenv::{
    check_batch, concat_observations, concat_steps, step_env, VecEnvBackend, VecEnvResult,
};
use crate::env::{EmulationLayer, EnvInfo, ParallelEnv};
use crate::spaces::DynSpace;
use crate::{MarketError, Result};
use ndarray::Array2;
use rayon::prelude::*;

/// Parallel vectorization backend using rayon
pub struct Parallel<E: ParallelEnv> {
    /// Environments owned by the backend
    envs: Vec<E>,
    /// Row translation shared by all envs
    layer: EmulationLayer,
    /// Cached observation and action spaces
    obs_space: DynSpace,
    action_space: DynSpace,
}

impl<E: ParallelEnv> Parallel<E> {
    /// Create a new parallel backend
    pub fn new<F>(env_creator: F, num_envs: usize) -> Result<Self>
    where
        F: Fn() -> Result<E> + Send + Sync,
    {
        if num_envs == 0 {
            return Err(MarketError::config("number of environments must be > 0"));
        }

        // Create all envs in parallel
        let envs: Vec<E> = (0..num_envs)
            .into_par_iter()
            .map(|_| env_creator())
            .collect::<Result<_>>()?;

        let first = &envs[0];
        let agent = first.possible_agents()[0].clone();
        let obs_space = first.observation_space(&agent);
        let action_space = first.action_space(&agent);
        let layer = EmulationLayer::new(
            first.possible_agents(),
            obs_space.shape().iter().product(),
        );

        Ok(Self {
            envs,
            layer,
            obs_space,
            action_space,
        })
    }
}

impl<E: ParallelEnv> VecEnvBackend for Parallel<E> {
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
        let layer = &self.layer;
        let results: Vec<_> = self
            .envs
            .par_iter_mut()
            .enumerate()
            .map(|(i, env)| {
                let env_seed = seed.map(|s| s.wrapping_add(i as u64));
                let (obs, info) = env.reset(env_seed);
                (layer.flatten_observations(&obs), info.into_values())
            })
            .collect();

        let (blocks, infos): (Vec<_>, Vec<_>) = results.into_iter().unzip();
        (
            concat_observations(blocks, layer.obs_size()),
            infos.into_iter().flatten().collect(),
        )
    }

    fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult> {
        let plans = check_batch(&self.layer, &self.envs, &self.action_space, actions)?;
        let layer = &self.layer;

        let steps = self
            .envs
            .par_iter_mut()
            .zip(plans.into_par_iter())
            .map(|(env, plan)| step_env(env, layer, plan))
            .collect::<Result<Vec<_>>>()?;

        Ok(concat_steps(steps, layer.obs_size()))
    }

    fn close(&mut self) {
        self.envs.par_iter_mut().for_each(|env| {
            env.close();
        });
    }
}
