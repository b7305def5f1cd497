//! Demand predictors.
//!
//! A demand predictor maps the joint price vector (airline order) to the
//! expected passenger count of one airline. The market only relies on the
//! `DemandPredictor` call signature; how a predictor was fitted is not its
//! concern.

mod builtin;

pub use builtin::{ConstantDemand, FnDemand, LinearDemand, LogitShareDemand};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Failure raised by a demand predictor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("expected {expected} prices, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("prediction is not finite: {0}")]
    NonFinite(f32),

    #[error("{0}")]
    Failed(String),
}

/// Contract every per-airline demand model satisfies.
///
/// Implementations must not depend on call order across airlines; the market
/// may call them in any order and shares them across instances.
pub trait DemandPredictor: Send + Sync {
    /// Expected passengers given the joint price vector.
    ///
    /// Negative values are allowed and are clamped to zero by the market.
    fn predict(&self, prices: &[f32]) -> Result<f32, PredictError>;

    /// Short description for logs
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<P: DemandPredictor + ?Sized> DemandPredictor for Arc<P> {
    fn predict(&self, prices: &[f32]) -> Result<f32, PredictError> {
        (**self).predict(prices)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Serializable description of a built-in predictor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandSpec {
    /// Fixed passenger count regardless of prices
    Constant { passengers: f32 },
    /// `intercept + sum(coefficients[j] * prices[j])`
    Linear {
        intercept: f32,
        coefficients: Vec<f32>,
    },
    /// `market_size * softmax(-sensitivity * prices)[own]`
    LogitShare {
        market_size: f32,
        sensitivity: f32,
        own_index: usize,
    },
}

impl DemandSpec {
    /// Build the predictor for a market of `num_agents` airlines.
    pub fn build(&self, num_agents: usize) -> crate::Result<Arc<dyn DemandPredictor>> {
        let predictor: Arc<dyn DemandPredictor> = match self {
            DemandSpec::Constant { passengers } => Arc::new(ConstantDemand::new(*passengers)),
            DemandSpec::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != num_agents {
                    return Err(crate::MarketError::config(format!(
                        "linear demand needs {num_agents} coefficients, got {}",
                        coefficients.len()
                    )));
                }
                Arc::new(LinearDemand::new(*intercept, coefficients.clone()))
            }
            DemandSpec::LogitShare {
                market_size,
                sensitivity,
                own_index,
            } => {
                if *own_index >= num_agents {
                    return Err(crate::MarketError::config(format!(
                        "logit demand own_index {own_index} outside {num_agents} airlines"
                    )));
                }
                Arc::new(LogitShareDemand::new(
                    *market_size,
                    *sensitivity,
                    *own_index,
                ))
            }
        };
        Ok(predictor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_json_shape() {
        let spec: DemandSpec =
            serde_json::from_str(r#"{"kind":"linear","intercept":300.0,"coefficients":[-0.5,0.2]}"#)
                .unwrap();
        assert_eq!(
            spec,
            DemandSpec::Linear {
                intercept: 300.0,
                coefficients: vec![-0.5, 0.2]
            }
        );
    }

    #[test]
    fn test_build_checks_dimensions() {
        let spec = DemandSpec::Linear {
            intercept: 1.0,
            coefficients: vec![1.0],
        };
        assert!(spec.build(2).is_err());
        assert!(spec.build(1).is_ok());

        let spec = DemandSpec::LogitShare {
            market_size: 100.0,
            sensitivity: 0.01,
            own_index: 2,
        };
        assert!(spec.build(2).is_err());
    }

    #[test]
    fn test_arc_forwards() {
        let predictor: Arc<dyn DemandPredictor> = Arc::new(ConstantDemand::new(5.0));
        let shared = Arc::clone(&predictor);
        assert_eq!(shared.predict(&[1.0]).unwrap(), 5.0);
        assert_eq!(shared.describe(), predictor.describe());
    }
}
