//! The market state machine.

use super::menu::PriceMenu;
use super::observation::ObservationEncoder;
use super::state::{EpisodeState, Phase};
use crate::config::MarketConfig;
use crate::demand::DemandPredictor;
use crate::env::{AgentMap, Airline, EnvInfo, MultiAgentStepResult, ParallelEnv};
use crate::spaces::DynSpace;
use crate::{ActionFault, MarketError, Result};
use ndarray::ArrayD;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Repeated simultaneous-move pricing game on one market.
///
/// `reset` starts an episode of `max_days` rounds; each `step` takes one menu
/// index per airline, queries every demand predictor with the joint price
/// vector and pays `price * max(demand, 0) / reward_scale`. A step either
/// commits for all airlines or leaves the episode untouched.
pub struct AirlineMarket {
    config: MarketConfig,
    agents: Arc<[Airline]>,
    menu: PriceMenu,
    encoder: ObservationEncoder,
    predictors: Vec<Arc<dyn DemandPredictor>>,
    state: Option<EpisodeState>,
}

impl AirlineMarket {
    /// Create a market with one predictor per airline, in airline order.
    pub fn new(config: MarketConfig, predictors: Vec<Arc<dyn DemandPredictor>>) -> Result<Self> {
        config.validate()?;
        if predictors.len() != config.agents.len() {
            return Err(MarketError::config(format!(
                "{} airlines but {} demand predictors",
                config.agents.len(),
                predictors.len()
            )));
        }
        let menu = PriceMenu::new(config.price_points.clone())?;
        let encoder = ObservationEncoder::new(
            config.agents.len(),
            config.max_days,
            config.observation_scale,
            // The reset price may sit above the menu
            menu.max().max(config.default_price),
        );
        let agents: Arc<[Airline]> = config.agents.clone().into();

        tracing::debug!(
            airlines = agents.len(),
            max_days = config.max_days,
            price_levels = menu.len(),
            predictors = ?predictors.iter().map(|p| p.describe()).collect::<Vec<_>>(),
            "Created airline market"
        );

        Ok(Self {
            config,
            agents,
            menu,
            encoder,
            predictors,
            state: None,
        })
    }

    /// Construction parameters, as validated.
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Airlines in the fixed order every per-airline vector follows.
    pub fn agents(&self) -> &[Airline] {
        &self.agents
    }

    /// Shared price menu; actions index into it.
    pub fn menu(&self) -> &PriceMenu {
        &self.menu
    }

    /// Encoder producing every airline's observation.
    pub fn encoder(&self) -> &ObservationEncoder {
        &self.encoder
    }

    /// Current episode state, `None` before the first reset.
    pub fn state(&self) -> Option<&EpisodeState> {
        self.state.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.state
            .as_ref()
            .map_or(Phase::Uninitialized, EpisodeState::phase)
    }

    fn observe(&self, state: &EpisodeState) -> AgentMap<ArrayD<f32>> {
        let obs = self.encoder.encode(state);
        AgentMap::from_fn(Arc::clone(&self.agents), |_, _| obs.clone())
    }

    fn active_state(&self) -> Result<&EpisodeState> {
        match &self.state {
            Some(state) if !state.is_terminal() => Ok(state),
            _ => Err(MarketError::Precedence {
                phase: self.phase(),
            }),
        }
    }

    /// Resolve ordered action indices into the joint price vector.
    fn resolve_prices(&self, actions: &[usize]) -> Result<Vec<f32>> {
        actions
            .iter()
            .zip(self.agents.iter())
            .map(|(&index, airline)| {
                self.menu
                    .resolve(index)
                    .ok_or_else(|| MarketError::InvalidAction {
                        airline: airline.clone(),
                        reason: ActionFault::OutOfRange {
                            index,
                            len: self.menu.len(),
                        },
                    })
            })
            .collect()
    }

    /// Demand of every airline for `prices`, clamped at zero.
    fn predict_demand(&self, prices: &[f32]) -> Result<Vec<f32>> {
        self.predictors
            .iter()
            .zip(self.agents.iter())
            .map(|(predictor, airline)| {
                predictor
                    .predict(prices)
                    .map(|pax| pax.max(0.0))
                    .map_err(|source| MarketError::Predictor {
                        airline: airline.clone(),
                        source,
                    })
            })
            .collect()
    }

    fn apply(&mut self, actions: &[usize]) -> Result<MultiAgentStepResult> {
        self.active_state()?;
        if actions.len() != self.agents.len() {
            return Err(MarketError::InvalidAction {
                airline: self.agents[actions.len().min(self.agents.len() - 1)].clone(),
                reason: ActionFault::WrongCount {
                    expected: self.agents.len(),
                    actual: actions.len(),
                },
            });
        }

        // Everything fallible runs before the state is touched.
        let prices = self.resolve_prices(actions)?;
        let demand = self.predict_demand(&prices)?;

        let revenue: Vec<f32> = prices.iter().zip(&demand).map(|(p, d)| p * d).collect();
        let rewards: Vec<f32> = revenue
            .iter()
            .map(|r| r / self.config.reward_scale)
            .collect();

        let state = self
            .state
            .as_mut()
            .ok_or(MarketError::Precedence {
                phase: Phase::Uninitialized,
            })?;
        state.current_prices = prices.clone();
        state.days_left -= 1;
        let done = state.is_terminal();
        let state = state.clone();

        let agents = Arc::clone(&self.agents);
        let infos = AgentMap::from_fn(Arc::clone(&agents), |i, _| {
            EnvInfo::new()
                .with_extra("price", prices[i])
                .with_extra("passengers", demand[i])
                .with_extra("revenue", revenue[i])
        });

        if done {
            tracing::debug!(rewards = ?rewards, "Episode terminated");
        }

        Ok(MultiAgentStepResult {
            observations: self.observe(&state),
            rewards: AgentMap::from_ordered(Arc::clone(&agents), rewards),
            terminations: AgentMap::from_fn(Arc::clone(&agents), |_, _| done),
            truncations: AgentMap::from_fn(Arc::clone(&agents), |_, _| false),
            infos,
        })
    }
}

impl ParallelEnv for AirlineMarket {
    fn possible_agents(&self) -> &[Airline] {
        &self.agents
    }

    fn observation_space(&self, _agent: &Airline) -> DynSpace {
        self.encoder.space()
    }

    fn action_space(&self, _agent: &Airline) -> DynSpace {
        DynSpace::Discrete(self.menu.action_space())
    }

    fn reset(&mut self, seed: Option<u64>) -> (AgentMap<ArrayD<f32>>, AgentMap<EnvInfo>) {
        let state = EpisodeState::new(
            self.agents.len(),
            self.config.max_days,
            self.config.default_price,
        );
        let observations = self.observe(&state);
        self.state = Some(state);
        tracing::trace!(?seed, "Market reset");
        (
            observations,
            AgentMap::from_fn(Arc::clone(&self.agents), |_, _| EnvInfo::new()),
        )
    }

    fn step(&mut self, actions: &HashMap<Airline, usize>) -> Result<MultiAgentStepResult> {
        self.active_state()?;
        if let Some(unknown) = actions.keys().find(|a| !self.agents.contains(a)) {
            return Err(MarketError::InvalidAction {
                airline: unknown.clone(),
                reason: ActionFault::UnknownAirline,
            });
        }
        let ordered = self
            .agents
            .iter()
            .map(|airline| {
                actions
                    .get(airline)
                    .copied()
                    .ok_or_else(|| MarketError::InvalidAction {
                        airline: airline.clone(),
                        reason: ActionFault::Missing,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        self.apply(&ordered)
    }

    fn step_indices(&mut self, actions: &[usize]) -> Result<MultiAgentStepResult> {
        self.apply(actions)
    }

    fn render(&self) -> Option<String> {
        let state = self.state.as_ref()?;
        let mut out = format!("Days Left: {}\n", state.days_left);
        for (airline, price) in self.agents.iter().zip(&state.current_prices) {
            let _ = writeln!(out, "  - {airline}: Price = ${price:.2}");
        }
        Some(out)
    }

    fn is_done(&self) -> bool {
        self.phase() == Phase::Terminal
    }
}
