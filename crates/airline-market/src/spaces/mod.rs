//! Observation and action space types.
//!
//! Gymnasium-style space definitions: airlines act in a `Discrete` space over
//! the price menu and observe a bounded `Box`.

mod r#box;
mod discrete;

pub use discrete::Discrete;
pub use r#box::Box;

use ndarray::ArrayD;
use rand::Rng;

/// Trait for observation and action spaces
pub trait Space: Clone + Send + Sync {
    /// The type of samples from this space
    type Sample;

    /// Sample a random element from this space
    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample;

    /// Check if a value is contained in this space
    fn contains(&self, value: &Self::Sample) -> bool;

    /// Get the shape of samples from this space
    fn shape(&self) -> &[usize];

    /// Get the total number of elements in a sample
    fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }
}

/// Enum for dynamic space types
#[derive(Clone, Debug)]
pub enum DynSpace {
    Discrete(Discrete),
    Box(Box),
}

impl DynSpace {
    /// Get the shape of this space
    pub fn shape(&self) -> Vec<usize> {
        match self {
            DynSpace::Discrete(s) => s.shape().to_vec(),
            DynSpace::Box(s) => s.shape().to_vec(),
        }
    }

    /// Sample from this space
    pub fn sample<R: Rng>(&self, rng: &mut R) -> ArrayD<f32> {
        match self {
            DynSpace::Discrete(s) => {
                let v = s.sample(rng);
                ArrayD::from_elem(ndarray::IxDyn(&[1]), v as f32)
            }
            DynSpace::Box(s) => s.sample(rng),
        }
    }

    /// Check if this space contains the value
    pub fn contains(&self, value: &ArrayD<f32>) -> bool {
        match self {
            DynSpace::Discrete(s) => match value.iter().next() {
                Some(v) if value.len() == 1 && *v >= 0.0 => s.contains(&(v.round() as usize)),
                _ => false,
            },
            DynSpace::Box(s) => s.contains(value),
        }
    }
}
