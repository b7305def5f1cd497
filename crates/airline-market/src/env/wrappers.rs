//! Environment wrappers for common functionality.

use super::{AgentMap, Airline, EnvInfo, MultiAgentStepResult, ParallelEnv};
use crate::spaces::DynSpace;
use crate::Result;
use ndarray::ArrayD;
use std::collections::HashMap;

/// Wrapper that tracks per-airline episode statistics (return and length).
///
/// Adds `episode_return` and `episode_length` to each airline's info on the
/// step that ends the episode.
pub struct EpisodeStats<E: ParallelEnv> {
    env: E,
    episode_returns: Vec<f32>,
    episode_length: u32,
}

impl<E: ParallelEnv> EpisodeStats<E> {
    /// Wrap an environment with episode statistics tracking
    pub fn new(env: E) -> Self {
        let n = env.num_agents();
        Self {
            env,
            episode_returns: vec![0.0; n],
            episode_length: 0,
        }
    }

    /// Get a reference to the inner environment
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// Get a mutable reference to the inner environment
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Returns accumulated so far in the running episode
    pub fn running_returns(&self) -> &[f32] {
        &self.episode_returns
    }

    fn record(&mut self, mut result: MultiAgentStepResult) -> MultiAgentStepResult {
        for (acc, r) in self.episode_returns.iter_mut().zip(result.rewards.values()) {
            *acc += r;
        }
        self.episode_length += 1;

        if result.all_done() {
            let len = self.episode_length;
            for ((_, info), &ret) in result.infos.iter_mut().zip(&self.episode_returns) {
                *info = std::mem::take(info).with_episode_stats(ret, len);
            }

            // Reset internal counters (env will be reset externally)
            self.episode_returns.iter_mut().for_each(|r| *r = 0.0);
            self.episode_length = 0;
        }

        result
    }
}

impl<E: ParallelEnv> ParallelEnv for EpisodeStats<E> {
    fn possible_agents(&self) -> &[Airline] {
        self.env.possible_agents()
    }

    fn observation_space(&self, agent: &Airline) -> DynSpace {
        self.env.observation_space(agent)
    }

    fn action_space(&self, agent: &Airline) -> DynSpace {
        self.env.action_space(agent)
    }

    fn reset(&mut self, seed: Option<u64>) -> (AgentMap<ArrayD<f32>>, AgentMap<EnvInfo>) {
        self.episode_returns.iter_mut().for_each(|r| *r = 0.0);
        self.episode_length = 0;
        self.env.reset(seed)
    }

    fn step(&mut self, actions: &HashMap<Airline, usize>) -> Result<MultiAgentStepResult> {
        let result = self.env.step(actions)?;
        Ok(self.record(result))
    }

    fn step_indices(&mut self, actions: &[usize]) -> Result<MultiAgentStepResult> {
        let result = self.env.step_indices(actions)?;
        Ok(self.record(result))
    }

    fn render(&self) -> Option<String> {
        self.env.render()
    }

    fn close(&mut self) {
        self.env.close()
    }

    fn num_agents(&self) -> usize {
        self.env.num_agents()
    }

    fn is_done(&self) -> bool {
        self.env.is_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{Box as BoxSpace, Discrete};
    use ndarray::IxDyn;
    use std::sync::Arc;

    // Two agents, each rewarded with its own action value, done after 3 steps
    struct CountingEnv {
        agents: Arc<[Airline]>,
        step_count: u32,
    }

    impl CountingEnv {
        fn new() -> Self {
            Self {
                agents: vec![Airline::from("A"), Airline::from("B")].into(),
                step_count: 0,
            }
        }
    }

    impl ParallelEnv for CountingEnv {
        fn possible_agents(&self) -> &[Airline] {
            &self.agents
        }

        fn observation_space(&self, _agent: &Airline) -> DynSpace {
            DynSpace::Box(BoxSpace::uniform(&[1], 0.0, 1.0))
        }

        fn action_space(&self, _agent: &Airline) -> DynSpace {
            DynSpace::Discrete(Discrete::new(3))
        }

        fn reset(&mut self, _seed: Option<u64>) -> (AgentMap<ArrayD<f32>>, AgentMap<EnvInfo>) {
            self.step_count = 0;
            (
                AgentMap::from_fn(self.agents.clone(), |_, _| ArrayD::zeros(IxDyn(&[1]))),
                AgentMap::from_fn(self.agents.clone(), |_, _| EnvInfo::new()),
            )
        }

        fn step(&mut self, actions: &HashMap<Airline, usize>) -> Result<MultiAgentStepResult> {
            self.step_count += 1;
            let done = self.step_count >= 3;
            let agents = self.agents.clone();
            Ok(MultiAgentStepResult {
                observations: AgentMap::from_fn(agents.clone(), |_, _| ArrayD::zeros(IxDyn(&[1]))),
                rewards: AgentMap::from_fn(agents.clone(), |_, a| actions[a] as f32),
                terminations: AgentMap::from_fn(agents.clone(), |_, _| done),
                truncations: AgentMap::from_fn(agents.clone(), |_, _| false),
                infos: AgentMap::from_fn(agents, |_, _| EnvInfo::new()),
            })
        }
    }

    #[test]
    fn test_episode_stats() {
        let mut wrapped = EpisodeStats::new(CountingEnv::new());
        wrapped.reset(None);

        for _ in 0..2 {
            let result = wrapped.step_indices(&[1, 2]).unwrap();
            assert!(!result.all_done());
            assert!(result.infos.values()[0].get("episode_return").is_none());
        }
        assert_eq!(wrapped.running_returns(), &[2.0, 4.0]);

        // 3rd step should terminate
        let result = wrapped.step_indices(&[1, 2]).unwrap();
        assert!(result.all_done());
        let a = &result.infos[&Airline::from("A")];
        let b = &result.infos[&Airline::from("B")];
        assert_eq!(a.get("episode_return"), Some(3.0));
        assert_eq!(b.get("episode_return"), Some(6.0));
        assert_eq!(b.get("episode_length"), Some(3.0));
        assert_eq!(wrapped.running_returns(), &[0.0, 0.0]);
    }
}
