//! Current-ownership state supplied by the caller.
//!
//! An empty `owned` list means pre-season: the boundary squad becomes a free
//! decision bounded by `budget`.

use serde::{Deserialize, Serialize};

use super::{Chip, PlayerId};

/// Default pre-season budget, in tenths.
pub const DEFAULT_BUDGET: f64 = 1000.0;

/// A player currently owned, with the prices the game reports for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedPlayer {
    pub id: PlayerId,
    pub purchase_price: f64,
    /// Price the game pays out on sale. Below the current price for
    /// price-modified players.
    pub selling_price: f64,
}

/// Squad, bank and chip state entering the first planned gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadState {
    #[serde(default)]
    pub owned: Vec<OwnedPlayer>,
    #[serde(default)]
    pub bank: f64,
    #[serde(default = "default_free_transfers")]
    pub free_transfers: u8,
    #[serde(default = "default_available_chips")]
    pub available_chips: Vec<Chip>,
    /// Chip already activated for the next gameweek.
    #[serde(default)]
    pub active_chip: Option<Chip>,
    /// Total budget, used only in pre-season.
    #[serde(default = "default_budget")]
    pub budget: f64,
}

fn default_free_transfers() -> u8 {
    1
}

fn default_available_chips() -> Vec<Chip> {
    Chip::ALL.to_vec()
}

fn default_budget() -> f64 {
    DEFAULT_BUDGET
}

impl SquadState {
    /// Pre-season state: no squad, whole budget available.
    pub fn preseason(budget: f64) -> Self {
        Self {
            owned: Vec::new(),
            bank: 0.0,
            free_transfers: default_free_transfers(),
            available_chips: default_available_chips(),
            active_chip: None,
            budget,
        }
    }

    pub fn is_preseason(&self) -> bool {
        self.owned.is_empty()
    }

    pub fn owns(&self, id: PlayerId) -> bool {
        self.owned.iter().any(|p| p.id == id)
    }

    pub fn owned_player(&self, id: PlayerId) -> Option<&OwnedPlayer> {
        self.owned.iter().find(|p| p.id == id)
    }

    pub fn chip_available(&self, chip: Chip) -> bool {
        self.available_chips.contains(&chip)
    }

    /// Parse from JSON (the format the game's API export is converted to).
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Parse from TOML.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preseason_has_no_squad() {
        let state = SquadState::preseason(1000.0);
        assert!(state.is_preseason());
        assert_eq!(state.free_transfers, 1);
        assert_eq!(state.available_chips.len(), 4);
    }

    #[test]
    fn json_defaults_fill_missing_fields() {
        let state = SquadState::from_json(
            r#"{"owned":[{"id":5,"purchase_price":55.0,"selling_price":54.0}],"bank":3.0}"#,
        )
        .unwrap();
        assert!(!state.is_preseason());
        assert!(state.owns(PlayerId(5)));
        assert_eq!(state.free_transfers, 1);
        assert!(state.chip_available(Chip::Wildcard));
        assert_eq!(state.active_chip, None);
    }

    #[test]
    fn toml_state_parses() {
        let state = SquadState::from_toml(
            r#"
bank = 12.0
free_transfers = 2
available_chips = ["wc", "bb"]
active_chip = "bb"

[[owned]]
id = 1
purchase_price = 45.0
selling_price = 45.0
"#,
        )
        .unwrap();
        assert_eq!(state.free_transfers, 2);
        assert!(!state.chip_available(Chip::FreeHit));
        assert_eq!(state.active_chip, Some(Chip::BenchBoost));
        assert_eq!(state.owned_player(PlayerId(1)).unwrap().selling_price, 45.0);
    }
}
