//! Domain types for SquadLab

pub mod chip;
pub mod ids;
pub mod player;
pub mod state;

pub use chip::Chip;
pub use ids::{ConfigHash, Gameweek, PlayerId, RunId};
pub use player::{Position, SQUAD_SIZE, LINEUP_SIZE, BENCH_SLOTS};
pub use state::{OwnedPlayer, SquadState};

/// Club name alias
pub type Club = String;
