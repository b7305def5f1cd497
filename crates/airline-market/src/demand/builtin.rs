//! Built-in demand predictors.

use super::{DemandPredictor, PredictError};

fn finite(value: f32) -> Result<f32, PredictError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictError::NonFinite(value))
    }
}

/// Same passenger count for every price vector.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantDemand {
    passengers: f32,
}

impl ConstantDemand {
    pub fn new(passengers: f32) -> Self {
        Self { passengers }
    }
}

impl DemandPredictor for ConstantDemand {
    fn predict(&self, _prices: &[f32]) -> Result<f32, PredictError> {
        finite(self.passengers)
    }

    fn describe(&self) -> String {
        format!("constant({})", self.passengers)
    }
}

/// Linear regression over the joint price vector.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearDemand {
    intercept: f32,
    coefficients: Vec<f32>,
}

impl LinearDemand {
    pub fn new(intercept: f32, coefficients: Vec<f32>) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }
}

impl DemandPredictor for LinearDemand {
    fn predict(&self, prices: &[f32]) -> Result<f32, PredictError> {
        if prices.len() != self.coefficients.len() {
            return Err(PredictError::Dimension {
                expected: self.coefficients.len(),
                actual: prices.len(),
            });
        }
        let dot: f32 = self
            .coefficients
            .iter()
            .zip(prices)
            .map(|(c, p)| c * p)
            .sum();
        finite(self.intercept + dot)
    }

    fn describe(&self) -> String {
        format!(
            "linear(intercept={}, {} coefficients)",
            self.intercept,
            self.coefficients.len()
        )
    }
}

/// Fixed market size split by a multinomial logit over prices.
///
/// Cheaper airlines win a larger share; `sensitivity` controls how sharply.
#[derive(Clone, Debug, PartialEq)]
pub struct LogitShareDemand {
    market_size: f32,
    sensitivity: f32,
    own_index: usize,
}

impl LogitShareDemand {
    pub fn new(market_size: f32, sensitivity: f32, own_index: usize) -> Self {
        Self {
            market_size,
            sensitivity,
            own_index,
        }
    }
}

impl DemandPredictor for LogitShareDemand {
    fn predict(&self, prices: &[f32]) -> Result<f32, PredictError> {
        if self.own_index >= prices.len() {
            return Err(PredictError::Dimension {
                expected: self.own_index + 1,
                actual: prices.len(),
            });
        }
        // Shift by the largest utility so exp() cannot overflow.
        let utilities: Vec<f32> = prices.iter().map(|p| -self.sensitivity * p).collect();
        let top = utilities.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let weights: Vec<f32> = utilities.iter().map(|u| (u - top).exp()).collect();
        let total: f32 = weights.iter().sum();
        finite(self.market_size * weights[self.own_index] / total)
    }

    fn describe(&self) -> String {
        format!(
            "logit_share(size={}, sensitivity={})",
            self.market_size, self.sensitivity
        )
    }
}

/// Adapter turning any thread-safe closure into a predictor.
pub struct FnDemand<F> {
    f: F,
}

impl<F> FnDemand<F>
where
    F: Fn(&[f32]) -> Result<f32, PredictError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> DemandPredictor for FnDemand<F>
where
    F: Fn(&[f32]) -> Result<f32, PredictError> + Send + Sync,
{
    fn predict(&self, prices: &[f32]) -> Result<f32, PredictError> {
        (self.f)(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let d = ConstantDemand::new(10.0);
        assert_eq!(d.predict(&[100.0, 200.0]).unwrap(), 10.0);
        assert!(matches!(
            ConstantDemand::new(f32::NAN).predict(&[]),
            Err(PredictError::NonFinite(_))
        ));
    }

    #[test]
    fn test_linear() {
        let d = LinearDemand::new(300.0, vec![-0.5, 0.25]);
        assert_eq!(d.predict(&[200.0, 400.0]).unwrap(), 300.0);
        assert_eq!(
            d.predict(&[1.0]),
            Err(PredictError::Dimension {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_logit_share_splits_market() {
        let a = LogitShareDemand::new(100.0, 0.01, 0);
        let b = LogitShareDemand::new(100.0, 0.01, 1);
        let prices = [200.0, 400.0];
        let da = a.predict(&prices).unwrap();
        let db = b.predict(&prices).unwrap();
        assert!((da + db - 100.0).abs() < 1e-3);
        assert!(da > db);
    }

    #[test]
    fn test_logit_share_equal_prices() {
        let d = LogitShareDemand::new(90.0, 0.02, 2);
        let share = d.predict(&[300.0, 300.0, 300.0]).unwrap();
        assert!((share - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_fn_adapter() {
        let d = FnDemand::new(|prices: &[f32]| Ok(prices.iter().sum::<f32>()));
        assert_eq!(d.predict(&[1.0, 2.0]).unwrap(), 3.0);
        assert_eq!(d.describe(), "custom");
    }
}
