//! Pricing policies.
//!
//! Provides scripted agents that pick a menu index from an observation:
//! - `FixedPolicy` always plays the same level
//! - `RandomPolicy` samples the menu uniformly from a seeded generator
//! - `CyclePolicy` walks the menu one level per day
//! - `UndercutPolicy` prices one level below the cheapest rival

mod scripted;

pub use scripted::{CyclePolicy, FixedPolicy, RandomPolicy, UndercutPolicy};

use crate::market::{ObservationEncoder, PriceMenu};
use crate::{MarketError, Result};
use ndarray::ArrayD;

/// Names accepted by [`policy_by_name`].
pub const POLICY_NAMES: &[&str] = &[
    "random",
    "cycle",
    "undercut",
    "low",
    "mid",
    "high",
    "fixed:<index>",
];

/// What a policy knows about the market it plays in.
#[derive(Clone, Copy, Debug)]
pub struct MarketView<'a> {
    /// Position of the acting airline in the airline order
    pub agent: usize,
    pub menu: &'a PriceMenu,
    pub encoder: &'a ObservationEncoder,
}

impl MarketView<'_> {
    /// Prices of the previous day, airline order.
    pub fn prices(&self, obs: &ArrayD<f32>) -> Vec<f32> {
        self.encoder.decode_prices(obs)
    }
}

/// Trait for scripted pricing agents
pub trait PricingPolicy: Send {
    /// Choose a menu index for `view.agent` given its observation
    fn act(&mut self, obs: &ArrayD<f32>, view: &MarketView<'_>) -> usize;

    /// Called at the start of every episode
    fn reset(&mut self) {}

    fn name(&self) -> String;
}

/// Build a policy from its CLI name. `seed` feeds stochastic policies.
pub fn policy_by_name(name: &str, seed: u64) -> Result<Box<dyn PricingPolicy>> {
    let policy: Box<dyn PricingPolicy> = match name {
        "random" => Box::new(RandomPolicy::new(seed)),
        "cycle" => Box::new(CyclePolicy::new()),
        "undercut" => Box::new(UndercutPolicy),
        "low" => Box::new(FixedPolicy::Lowest),
        "mid" => Box::new(FixedPolicy::Middle),
        "high" => Box::new(FixedPolicy::Highest),
        other => match other.strip_prefix("fixed:") {
            Some(index) => {
                let index = index.parse::<usize>().map_err(|_| {
                    MarketError::config(format!("fixed policy needs a menu index, got {index:?}"))
                })?;
                Box::new(FixedPolicy::Index(index))
            }
            None => {
                return Err(MarketError::config(format!(
                    "unknown policy {other:?}, expected one of {}",
                    POLICY_NAMES.join(", ")
                )))
            }
        },
    };
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_by_name() {
        for name in ["random", "cycle", "undercut", "low", "mid", "high", "fixed:4"] {
            assert!(policy_by_name(name, 0).is_ok(), "{name}");
        }
        assert_eq!(policy_by_name("fixed:4", 0).unwrap().name(), "fixed:4");
        assert!(matches!(
            policy_by_name("greedy", 0),
            Err(MarketError::Configuration(_))
        ));
        assert!(policy_by_name("fixed:x", 0).is_err());
    }
}
