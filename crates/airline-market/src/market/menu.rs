//! Price menu shared by all airlines.

use crate::spaces::Discrete;
use crate::{MarketError, Result};

/// Ordered, finite set of admissible price levels.
///
/// An action is an index into this menu.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceMenu {
    prices: Vec<f32>,
}

impl PriceMenu {
    /// Create a menu, rejecting fewer than two levels or negative/non-finite prices.
    pub fn new(prices: Vec<f32>) -> Result<Self> {
        Self::check(&prices)?;
        if prices.windows(2).any(|w| w[0] >= w[1]) {
            tracing::warn!(?prices, "price menu is not strictly increasing");
        }
        Ok(Self { prices })
    }

    pub(crate) fn check(prices: &[f32]) -> Result<()> {
        if prices.len() < 2 {
            return Err(MarketError::config(format!(
                "price menu needs at least 2 levels, got {}",
                prices.len()
            )));
        }
        if let Some(p) = prices.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(MarketError::config(format!(
                "price levels must be finite and nonnegative, got {p}"
            )));
        }
        Ok(())
    }

    /// Price at `index`, or `None` outside `[0, len)`.
    pub fn resolve(&self, index: usize) -> Option<f32> {
        self.prices.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn prices(&self) -> &[f32] {
        &self.prices
    }

    pub fn min(&self) -> f32 {
        self.prices.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.prices.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Price of the middle level.
    pub fn midpoint(&self) -> f32 {
        self.prices[self.prices.len() / 2]
    }

    /// Index of the level closest to `price` (ties go to the lower index).
    pub fn nearest_index(&self, price: f32) -> usize {
        self.prices
            .iter()
            .enumerate()
            .fold((0, f32::INFINITY), |(best, dist), (i, &p)| {
                let d = (p - price).abs();
                if d < dist {
                    (i, d)
                } else {
                    (best, dist)
                }
            })
            .0
    }

    /// Discrete action space over the menu.
    pub fn action_space(&self) -> Discrete {
        Discrete::new(self.prices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> PriceMenu {
        PriceMenu::new(vec![100.0, 200.0, 300.0]).unwrap()
    }

    #[test]
    fn test_resolve_bounds() {
        let menu = menu();
        assert_eq!(menu.resolve(0), Some(100.0));
        assert_eq!(menu.resolve(2), Some(300.0));
        assert_eq!(menu.resolve(3), None);
    }

    #[test]
    fn test_rejects_degenerate_menus() {
        assert!(matches!(
            PriceMenu::new(vec![]),
            Err(MarketError::Configuration(_))
        ));
        assert!(PriceMenu::new(vec![100.0]).is_err());
        assert!(PriceMenu::new(vec![-1.0, 100.0]).is_err());
        assert!(PriceMenu::new(vec![f32::NAN, 100.0]).is_err());
    }

    #[test]
    fn test_unsorted_menu_is_accepted() {
        let menu = PriceMenu::new(vec![300.0, 100.0]).unwrap();
        assert_eq!(menu.min(), 100.0);
        assert_eq!(menu.max(), 300.0);
    }

    #[test]
    fn test_nearest_index() {
        let menu = menu();
        assert_eq!(menu.nearest_index(90.0), 0);
        assert_eq!(menu.nearest_index(240.0), 1);
        assert_eq!(menu.nearest_index(250.0), 1);
        assert_eq!(menu.nearest_index(1_000.0), 2);
    }

    #[test]
    fn test_action_space_matches_menu() {
        assert_eq!(menu().action_space().n, 3);
        assert_eq!(menu().midpoint(), 200.0);
    }
}
