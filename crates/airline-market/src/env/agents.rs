//! Airline identities and airline-ordered maps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque airline label, e.g. `"AA"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Airline(String);

impl Airline {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Airline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Airline {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Airline {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Per-airline values stored in the market's fixed airline order.
///
/// The order is load-bearing: index `i` always belongs to the `i`-th airline
/// of the configuration, the same slot the joint price vector uses.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentMap<T> {
    agents: Arc<[Airline]>,
    values: Vec<T>,
}

impl<T> AgentMap<T> {
    /// Build from values already in airline order.
    ///
    /// # Panics
    /// If `values.len()` differs from the number of airlines.
    pub fn from_ordered(agents: Arc<[Airline]>, values: Vec<T>) -> Self {
        assert_eq!(
            agents.len(),
            values.len(),
            "AgentMap needs exactly one value per airline"
        );
        Self { agents, values }
    }

    /// Build by evaluating `f` for every airline in order.
    pub fn from_fn(agents: Arc<[Airline]>, mut f: impl FnMut(usize, &Airline) -> T) -> Self {
        let values = agents.iter().enumerate().map(|(i, a)| f(i, a)).collect();
        Self { agents, values }
    }

    pub fn get(&self, airline: &Airline) -> Option<&T> {
        self.position(airline).map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, airline: &Airline) -> Option<&mut T> {
        self.position(airline).map(move |i| &mut self.values[i])
    }

    /// Value at airline slot `index`.
    pub fn at(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn position(&self, airline: &Airline) -> Option<usize> {
        self.agents.iter().position(|a| a == airline)
    }

    pub fn agents(&self) -> &[Airline] {
        &self.agents
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Airline, &T)> {
        self.agents.iter().zip(self.values.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Airline, &mut T)> {
        self.agents.iter().zip(self.values.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Map values while keeping the airline order.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> AgentMap<U> {
        AgentMap {
            agents: Arc::clone(&self.agents),
            values: self.values.iter().map(f).collect(),
        }
    }
}

impl AgentMap<bool> {
    pub fn all(&self) -> bool {
        self.values.iter().all(|&v| v)
    }

    pub fn any(&self) -> bool {
        self.values.iter().any(|&v| v)
    }
}

impl<T> std::ops::Index<&Airline> for AgentMap<T> {
    type Output = T;

    fn index(&self, airline: &Airline) -> &T {
        self.get(airline)
            .unwrap_or_else(|| panic!("airline {airline} not in this market"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents() -> Arc<[Airline]> {
        vec![Airline::from("AA"), Airline::from("DL"), Airline::from("UA")].into()
    }

    #[test]
    fn test_iteration_keeps_configured_order() {
        let map = AgentMap::from_ordered(agents(), vec![3, 1, 2]);
        let order: Vec<_> = map.iter().map(|(a, v)| (a.as_str(), *v)).collect();
        assert_eq!(order, vec![("AA", 3), ("DL", 1), ("UA", 2)]);
    }

    #[test]
    fn test_lookup_by_airline() {
        let map = AgentMap::from_fn(agents(), |i, _| i * 10);
        assert_eq!(map[&Airline::from("UA")], 20);
        assert_eq!(map.get(&Airline::from("B6")), None);
        assert_eq!(map.position(&Airline::from("DL")), Some(1));
    }

    #[test]
    fn test_bool_reductions() {
        let map = AgentMap::from_ordered(agents(), vec![true, false, true]);
        assert!(map.any());
        assert!(!map.all());
        assert!(map.map(|_| true).all());
    }

    #[test]
    #[should_panic(expected = "exactly one value per airline")]
    fn test_length_mismatch_panics() {
        let _ = AgentMap::from_ordered(agents(), vec![1, 2]);
    }
}
