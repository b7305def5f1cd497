//! Discrete action space

use super::Space;
use rand::Rng;

/// One choice out of `n` menu levels: `{0, 1, ..., n-1}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrete {
    /// Number of levels
    pub n: usize,
    shape: Vec<usize>,
}

impl Discrete {
    /// Panics on an empty space; price menus always carry at least two levels.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "Discrete space must have at least 1 element");
        Self { n, shape: vec![1] }
    }
}

impl Space for Discrete {
    type Sample = usize;

    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.n)
    }

    fn contains(&self, index: &usize) -> bool {
        *index < self.n
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn num_elements(&self) -> usize {
        1
    }
}
