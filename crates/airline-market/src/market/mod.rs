//! Market simulation core.
//!
//! - `AirlineMarket` - round-based state machine implementing `ParallelEnv`
//! - `PriceMenu` - discrete action to price resolution
//! - `ObservationEncoder` - pure state to observation mapping
//! - `EpisodeState` / `Phase` - per-episode state and lifecycle

mod env;
mod menu;
mod observation;
mod state;

pub use env::AirlineMarket;
pub use menu::PriceMenu;
pub use observation::ObservationEncoder;
pub use state::{EpisodeState, Phase};
