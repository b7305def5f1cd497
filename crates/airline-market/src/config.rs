//! Market and scenario configuration.

use crate::demand::{DemandPredictor, DemandSpec};
use crate::env::Airline;
use crate::market::{AirlineMarket, PriceMenu};
use crate::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Construction parameters of one market.
///
/// Fixed for the lifetime of an environment; validated once at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Ordered airline identities; this order indexes every per-airline vector
    pub agents: Vec<Airline>,
    /// Episode length in rounds
    pub max_days: u32,
    /// Admissible price levels shared by all airlines
    pub price_points: Vec<f32>,
    /// Divisor applied to `price * demand`
    pub reward_scale: f32,
    /// Price every airline holds after reset
    pub default_price: f32,
    /// Divisor applied to prices in observations
    pub observation_scale: f32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            agents: ["AA", "DL", "UA", "B6"].into_iter().map(Airline::from).collect(),
            max_days: 30,
            price_points: (150..=800).step_by(35).map(|p| p as f32).collect(),
            reward_scale: 1000.0,
            default_price: 400.0,
            observation_scale: 1000.0,
        }
    }
}

impl MarketConfig {
    /// Create a config for the given airlines and menu with remaining defaults.
    pub fn new(agents: impl IntoIterator<Item = impl Into<Airline>>, price_points: Vec<f32>) -> Self {
        Self {
            agents: agents.into_iter().map(Into::into).collect(),
            price_points,
            ..Default::default()
        }
    }

    /// Set episode length.
    pub fn max_days(mut self, days: u32) -> Self {
        self.max_days = days;
        self
    }

    /// Set reward divisor.
    pub fn reward_scale(mut self, scale: f32) -> Self {
        self.reward_scale = scale;
        self
    }

    /// Set the price held before the first action.
    pub fn default_price(mut self, price: f32) -> Self {
        self.default_price = price;
        self
    }

    /// Set observation price divisor.
    pub fn observation_scale(mut self, scale: f32) -> Self {
        self.observation_scale = scale;
        self
    }

    /// Check every construction invariant.
    pub fn validate(&self) -> Result<()> {
        if self.agents.is_empty() {
            return Err(MarketError::config("airline set is empty"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.agents.iter().find(|a| !seen.insert(*a)) {
            return Err(MarketError::config(format!("airline {dup} listed twice")));
        }
        if self.max_days == 0 {
            return Err(MarketError::config("max_days must be positive"));
        }
        PriceMenu::check(&self.price_points)?;
        if !(self.reward_scale.is_finite() && self.reward_scale > 0.0) {
            return Err(MarketError::config(format!(
                "reward_scale must be positive, got {}",
                self.reward_scale
            )));
        }
        if !(self.observation_scale.is_finite() && self.observation_scale > 0.0) {
            return Err(MarketError::config(format!(
                "observation_scale must be positive, got {}",
                self.observation_scale
            )));
        }
        if !(self.default_price.is_finite() && self.default_price >= 0.0) {
            return Err(MarketError::config(format!(
                "default_price must be nonnegative, got {}",
                self.default_price
            )));
        }
        Ok(())
    }
}

/// A market together with one demand specification per airline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub market: MarketConfig,
    pub demand: BTreeMap<Airline, DemandSpec>,
}

impl Default for ScenarioConfig {
    /// Default market with logit-share demand: 400 passengers per day split
    /// by price.
    fn default() -> Self {
        let market = MarketConfig::default();
        let demand = market
            .agents
            .iter()
            .enumerate()
            .map(|(i, airline)| {
                (
                    airline.clone(),
                    DemandSpec::LogitShare {
                        market_size: 400.0,
                        sensitivity: 0.006,
                        own_index: i,
                    },
                )
            })
            .collect();
        Self { market, demand }
    }
}

impl ScenarioConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let scenario = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded scenario");
        Ok(scenario)
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Predictors in airline order.
    pub fn predictors(&self) -> Result<Vec<Arc<dyn DemandPredictor>>> {
        let n = self.market.agents.len();
        if let Some(extra) = self.demand.keys().find(|a| !self.market.agents.contains(a)) {
            return Err(MarketError::config(format!(
                "demand given for unknown airline {extra}"
            )));
        }
        self.market
            .agents
            .iter()
            .map(|airline| {
                self.demand
                    .get(airline)
                    .ok_or_else(|| {
                        MarketError::config(format!("no demand model for airline {airline}"))
                    })
                    .and_then(|spec| spec.build(n))
            })
            .collect()
    }

    /// Build a ready environment.
    pub fn build(&self) -> Result<AirlineMarket> {
        AirlineMarket::new(self.market.clone(), self.predictors()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_deployment() {
        let config = MarketConfig::default();
        assert_eq!(config.agents.len(), 4);
        assert_eq!(config.max_days, 30);
        assert_eq!(config.price_points.first(), Some(&150.0));
        assert_eq!(config.price_points.last(), Some(&780.0));
        assert_eq!(config.price_points.len(), 19);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let base = MarketConfig::new(["A", "B"], vec![100.0, 200.0]);
        assert!(base.validate().is_ok());

        let cases = [
            MarketConfig::new(Vec::<&str>::new(), vec![100.0, 200.0]),
            MarketConfig::new(["A", "A"], vec![100.0, 200.0]),
            MarketConfig::new(["A"], vec![100.0]),
            base.clone().max_days(0),
            base.clone().reward_scale(0.0),
            base.clone().observation_scale(f32::NAN),
            base.clone().default_price(-1.0),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(MarketError::Configuration(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MarketConfig =
            serde_json::from_str(r#"{"agents":["X","Y"],"max_days":5}"#).unwrap();
        assert_eq!(config.agents, vec![Airline::from("X"), Airline::from("Y")]);
        assert_eq!(config.max_days, 5);
        assert_eq!(config.default_price, 400.0);
    }

    #[test]
    fn test_scenario_round_trip() {
        let scenario = ScenarioConfig::default();
        let json = scenario.to_json().unwrap();
        assert_eq!(ScenarioConfig::from_json_str(&json).unwrap(), scenario);
    }

    #[test]
    fn test_scenario_requires_demand_for_every_airline() {
        let mut scenario = ScenarioConfig::default();
        scenario.demand.remove(&Airline::from("UA"));
        let err = scenario.predictors().err().unwrap();
        assert!(err.to_string().contains("UA"));

        let mut scenario = ScenarioConfig::default();
        scenario
            .demand
            .insert(Airline::from("ZZ"), DemandSpec::Constant { passengers: 1.0 });
        assert!(scenario.build().is_err());
    }

    #[test]
    fn test_scenario_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, ScenarioConfig::default().to_json().unwrap()).unwrap();
        let env = ScenarioConfig::from_json_file(&path).unwrap().build().unwrap();
        assert_eq!(env.agents().len(), 4);

        assert!(matches!(
            ScenarioConfig::from_json_file(dir.path().join("missing.json")),
            Err(MarketError::Io(_))
        ));
    }
}
