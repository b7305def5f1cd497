//! Per-episode mutable state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State owned by one market instance for the current episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeState {
    /// Rounds remaining; the episode is terminal at 0
    pub days_left: u32,
    /// Joint price vector in airline order
    pub current_prices: Vec<f32>,
}

impl EpisodeState {
    /// Fresh episode with every airline at `default_price`.
    pub fn new(num_agents: usize, max_days: u32, default_price: f32) -> Self {
        Self {
            days_left: max_days,
            current_prices: vec![default_price; num_agents],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.days_left == 0
    }

    pub fn phase(&self) -> Phase {
        if self.is_terminal() {
            Phase::Terminal
        } else {
            Phase::Active
        }
    }
}

/// Lifecycle of a market instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, never reset
    Uninitialized,
    /// Rounds remain
    Active,
    /// All rounds played; reset required
    Terminal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Active => "active",
            Phase::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trips_through_json() {
        let state = EpisodeState {
            days_left: 7,
            current_prices: vec![150.0, 360.0],
        };
        let json = serde_json::to_string(&state).unwrap();
        let restored: EpisodeState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn test_phase() {
        assert_eq!(EpisodeState::new(2, 3, 400.0).phase(), Phase::Active);
        assert_eq!(EpisodeState::new(2, 0, 400.0).phase(), Phase::Terminal);
        assert_eq!(Phase::Uninitialized.to_string(), "uninitialized");
    }
}
