//! Multi-agent environment protocol and wrappers.
//!
//! Provides the `ParallelEnv` trait every simultaneous-move environment
//! implements, the airline-ordered `AgentMap`, plus wrappers for episode
//! statistics and flat-batch emulation.

mod agents;
mod emulation;
mod traits;
mod wrappers;

pub use agents::{AgentMap, Airline};
pub use emulation::{EmulationLayer, FlatStep};
pub use traits::{EnvInfo, MultiAgentStepResult, ParallelEnv};
pub use wrappers::EpisodeStats;
