//! Scripted pricing agents.

use super::{MarketView, PricingPolicy};
use crate::spaces::Space;
use ndarray::ArrayD;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Plays the same menu level every day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixedPolicy {
    Lowest,
    Middle,
    Highest,
    /// Raw index; clamped to the last level if the menu is shorter
    Index(usize),
}

impl PricingPolicy for FixedPolicy {
    fn act(&mut self, _obs: &ArrayD<f32>, view: &MarketView<'_>) -> usize {
        let menu = view.menu;
        match *self {
            Self::Lowest => menu.nearest_index(menu.min()),
            Self::Middle => menu.len() / 2,
            Self::Highest => menu.nearest_index(menu.max()),
            Self::Index(i) => i.min(menu.len() - 1),
        }
    }

    fn name(&self) -> String {
        match self {
            Self::Lowest => "low".into(),
            Self::Middle => "mid".into(),
            Self::Highest => "high".into(),
            Self::Index(i) => format!("fixed:{i}"),
        }
    }
}

/// Uniform over the menu.
pub struct RandomPolicy {
    seed: u64,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PricingPolicy for RandomPolicy {
    fn act(&mut self, _obs: &ArrayD<f32>, view: &MarketView<'_>) -> usize {
        view.menu.action_space().sample(&mut self.rng)
    }

    fn name(&self) -> String {
        format!("random(seed={})", self.seed)
    }
}

/// Steps through the menu one level per day, wrapping around.
#[derive(Clone, Debug, Default)]
pub struct CyclePolicy {
    next: usize,
}

impl CyclePolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PricingPolicy for CyclePolicy {
    fn act(&mut self, _obs: &ArrayD<f32>, view: &MarketView<'_>) -> usize {
        let index = self.next % view.menu.len();
        self.next = index + 1;
        index
    }

    fn reset(&mut self) {
        self.next = 0;
    }

    fn name(&self) -> String {
        "cycle".into()
    }
}

/// Prices at the highest level strictly below the cheapest rival's last price.
///
/// Falls back to the cheapest level when nothing is lower. With no rivals it
/// plays the cheapest level as well.
#[derive(Clone, Copy, Debug, Default)]
pub struct UndercutPolicy;

impl PricingPolicy for UndercutPolicy {
    fn act(&mut self, obs: &ArrayD<f32>, view: &MarketView<'_>) -> usize {
        let menu = view.menu;
        let cheapest_rival = view
            .prices(obs)
            .into_iter()
            .enumerate()
            .filter(|&(i, _)| i != view.agent)
            .map(|(_, p)| p)
            .fold(f32::INFINITY, f32::min);

        // Decoded prices carry rounding noise from the observation scale.
        let target = cheapest_rival - 1e-3;
        menu.prices()
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p < target)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or_else(|| menu.nearest_index(menu.min()))
    }

    fn name(&self) -> String {
        "undercut".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{EpisodeState, ObservationEncoder, PriceMenu};

    fn fixture() -> (PriceMenu, ObservationEncoder) {
        let menu = PriceMenu::new(vec![100.0, 200.0, 300.0, 400.0]).unwrap();
        let encoder = ObservationEncoder::new(3, 10, 1000.0, menu.max());
        (menu, encoder)
    }

    fn view<'a>(agent: usize, menu: &'a PriceMenu, encoder: &'a ObservationEncoder) -> MarketView<'a> {
        MarketView {
            agent,
            menu,
            encoder,
        }
    }

    fn obs(encoder: &ObservationEncoder, prices: &[f32]) -> ArrayD<f32> {
        encoder.encode(&EpisodeState {
            days_left: 5,
            current_prices: prices.to_vec(),
        })
    }

    #[test]
    fn test_fixed_levels() {
        let (menu, encoder) = fixture();
        let v = view(0, &menu, &encoder);
        let o = obs(&encoder, &[400.0; 3]);
        assert_eq!(FixedPolicy::Lowest.act(&o, &v), 0);
        assert_eq!(FixedPolicy::Middle.act(&o, &v), 2);
        assert_eq!(FixedPolicy::Highest.act(&o, &v), 3);
        assert_eq!(FixedPolicy::Index(9).act(&o, &v), 3);
    }

    #[test]
    fn test_random_is_seeded() {
        let (menu, encoder) = fixture();
        let v = view(1, &menu, &encoder);
        let o = obs(&encoder, &[400.0; 3]);
        let mut a = RandomPolicy::new(11);
        let mut b = RandomPolicy::new(11);
        for _ in 0..20 {
            let x = a.act(&o, &v);
            assert_eq!(x, b.act(&o, &v));
            assert!(x < menu.len());
        }
    }

    #[test]
    fn test_cycle_wraps_and_resets() {
        let (menu, encoder) = fixture();
        let v = view(0, &menu, &encoder);
        let o = obs(&encoder, &[400.0; 3]);
        let mut cycle = CyclePolicy::new();
        let picks: Vec<_> = (0..6).map(|_| cycle.act(&o, &v)).collect();
        assert_eq!(picks, vec![0, 1, 2, 3, 0, 1]);
        cycle.reset();
        assert_eq!(cycle.act(&o, &v), 0);
    }

    #[test]
    fn test_undercut_ignores_own_price() {
        let (menu, encoder) = fixture();
        let v = view(0, &menu, &encoder);

        // Own price is the cheapest; rivals at 300 and 400.
        let o = obs(&encoder, &[100.0, 300.0, 400.0]);
        assert_eq!(UndercutPolicy.act(&o, &v), 1);

        // Nothing below the cheapest rival.
        let o = obs(&encoder, &[400.0, 100.0, 400.0]);
        assert_eq!(UndercutPolicy.act(&o, &v), 0);
    }
}
