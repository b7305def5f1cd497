//! # Airline Market
//!
//! A repeated, simultaneous-move pricing game among competing airlines on a
//! single market.
//!
//! ## Overview
//!
//! Each round (day), every airline picks a price from a shared discrete menu.
//! A per-airline demand predictor turns the joint price vector into an
//! expected passenger count, and the airline earns `price * demand`, scaled
//! by a fixed constant. After `max_days` rounds every airline terminates
//! together and the episode must be reset.
//!
//! The crate provides:
//! - `AirlineMarket`, the round-based market state machine
//! - the `ParallelEnv` protocol (reset / step keyed by airline)
//! - the `DemandPredictor` contract plus a few built-in predictors
//! - vectorised backends (serial and rayon-parallel) for batched episodes
//! - scripted pricing policies and an evaluation harness
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use airline_market::prelude::*;
//! use std::collections::HashMap;
//!
//! let mut env = ScenarioConfig::default().build()?;
//! let (obs, _) = env.reset(Some(42));
//!
//! let actions: HashMap<Airline, usize> =
//!     env.agents().iter().map(|a| (a.clone(), 3)).collect();
//! let result = env.step(&actions)?;
//! ```

pub mod config;
pub mod demand;
pub mod env;
pub mod eval;
pub mod log;
pub mod market;
pub mod policy;
pub mod spaces;
pub mod vector;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{MarketConfig, ScenarioConfig};
    pub use crate::demand::{
        ConstantDemand, DemandPredictor, DemandSpec, FnDemand, LinearDemand, LogitShareDemand,
        PredictError,
    };
    pub use crate::env::{
        AgentMap, Airline, EmulationLayer, EnvInfo, EpisodeStats, MultiAgentStepResult,
        ParallelEnv,
    };
    pub use crate::eval::{EvalReport, Evaluator};
    pub use crate::log::{ConsoleLogger, MetricLogger, NoOpLogger};
    pub use crate::market::{AirlineMarket, EpisodeState, ObservationEncoder, Phase, PriceMenu};
    pub use crate::policy::{policy_by_name, PricingPolicy};
    pub use crate::spaces::{Discrete, DynSpace, Space};
    pub use crate::vector::{Parallel, Serial, VecEnv, VecEnvBackend, VecEnvConfig};
    pub use crate::{ActionFault, MarketError, Result};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::demand::PredictError;
use crate::env::Airline;
use crate::market::Phase;

/// Why an airline's action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionFault {
    #[error("no action supplied")]
    Missing,

    #[error("index {index} outside price menu of {len} levels")]
    OutOfRange { index: usize, len: usize },

    #[error("value is not a menu index")]
    NotAnIndex,

    #[error("airline is not part of this market")]
    UnknownAirline,

    #[error("expected {expected} actions, got {actual}")]
    WrongCount { expected: usize, actual: usize },
}

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Invalid action for {airline}: {reason}")]
    InvalidAction {
        airline: Airline,
        reason: ActionFault,
    },

    #[error("Step called while environment is {phase}; reset first")]
    Precedence { phase: Phase },

    #[error("Demand predictor for {airline} failed: {source}")]
    Predictor {
        airline: Airline,
        #[source]
        source: PredictError,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarketError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The airline a step error is attributed to, if any.
    pub fn airline(&self) -> Option<&Airline> {
        match self {
            Self::InvalidAction { airline, .. } | Self::Predictor { airline, .. } => Some(airline),
            _ => None,
        }
    }
}

pub type Result<T> = core::result::Result<T, MarketError>;
