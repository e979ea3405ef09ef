//! Planner configuration.
//!
//! One immutable value passed into the encoder and model builder. Every field
//! has a default, so a TOML file only needs the options it changes:
//!
//! ```
//! use squadlab_core::PlannerConfig;
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     horizon = 4
//!
//!     [objective]
//!     mode = "decay"
//!     decay_base = 0.9
//!
//!     [chips.wildcard]
//!     cap = 1
//!     allowed_gws = [12, 13]
//!
//!     [diversity]
//!     solutions = 3
//!     axis = { type = "LINEUP", min_diff = 2 }
//! "#).unwrap();
//!
//! assert_eq!(config.horizon, 4);
//! assert_eq!(config.chips.wildcard.cap, 1);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Chip, ConfigHash, Gameweek, PlayerId, Position};
use crate::mip::SolverSettings;
use crate::transitions::MAX_FREE_TRANSFERS;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Number of gameweeks to plan, starting at `next_gw`.
    pub horizon: u32,
    /// First planned gameweek. Defaults to the first projected gameweek.
    pub next_gw: Option<Gameweek>,
    /// The horizon never extends past this gameweek.
    pub season_end_gw: Gameweek,
    pub objective: ObjectiveConfig,
    pub scoring: ScoringConfig,
    pub chips: ChipsConfig,
    pub transfers: TransferConfig,
    pub roster: RosterConfig,
    pub pruning: PruningConfig,
    pub randomization: RandomizationConfig,
    pub diversity: DiversityConfig,
    pub solver: SolverSettings,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon: 3,
            next_gw: None,
            season_end_gw: 38,
            objective: ObjectiveConfig::default(),
            scoring: ScoringConfig::default(),
            chips: ChipsConfig::default(),
            transfers: TransferConfig::default(),
            roster: RosterConfig::default(),
            pruning: PruningConfig::default(),
            randomization: RandomizationConfig::default(),
            diversity: DiversityConfig::default(),
            solver: SolverSettings::default(),
        }
    }
}

impl PlannerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates configuration from JSON.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks on individual values. Cross-option contradictions that
    /// depend on the squad state are reported by the encoder instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.horizon == 0 {
            return invalid("horizon must be at least 1".into());
        }
        if let Some(gw) = self.next_gw {
            if gw == 0 || gw > self.season_end_gw {
                return invalid(format!(
                    "next_gw {gw} outside 1..={}",
                    self.season_end_gw
                ));
            }
        }
        if self.objective.mode == ObjectiveMode::Decay
            && !(self.objective.decay_base > 0.0 && self.objective.decay_base < 1.0)
        {
            return invalid(format!(
                "decay_base {} must be in (0, 1)",
                self.objective.decay_base
            ));
        }
        if let Some(base) = self
            .objective
            .report_decay_bases
            .iter()
            .find(|b| !(**b > 0.0 && **b <= 1.0))
        {
            return invalid(format!("report decay base {base} must be in (0, 1]"));
        }
        if self.scoring.hit_cost < 0.0 {
            return invalid("hit_cost must be non-negative".into());
        }
        if self.scoring.ft_value_list.len() > usize::from(MAX_FREE_TRANSFERS - 1) {
            return invalid(format!(
                "ft_value_list has {} entries, at most {} marginal values apply",
                self.scoring.ft_value_list.len(),
                MAX_FREE_TRANSFERS - 1
            ));
        }
        if self.roster.team_limit == 0 {
            return invalid("team_limit must be at least 1".into());
        }
        if let Some(special) = &self.transfers.special_ft {
            if !(1..=MAX_FREE_TRANSFERS).contains(&special.value) {
                return invalid(format!(
                    "special free transfer value {} outside 1..={MAX_FREE_TRANSFERS}",
                    special.value
                ));
            }
        }
        for booked in &self.transfers.booked {
            if booked.buy.is_none() && booked.sell.is_none() {
                return invalid(format!("booked transfer in GW{} has neither buy nor sell", booked.gw));
            }
        }
        if self.randomization.magnitude < 0.0 {
            return invalid("randomization magnitude must be non-negative".into());
        }
        if self.diversity.solutions == 0 {
            return invalid("diversity.solutions must be at least 1".into());
        }
        match &self.diversity.axis {
            DiversityAxis::Lineup { min_diff } if *min_diff == 0 || *min_diff > 15 => {
                return invalid(format!("lineup min_diff {min_diff} outside 1..=15"));
            }
            DiversityAxis::TargetWeeks { gameweeks } if gameweeks.is_empty() => {
                return invalid("target-week axis needs at least one gameweek".into());
            }
            _ => {}
        }
        if let Some(pct) = self.pruning.ev_per_price_cutoff {
            if !(0.0..=100.0).contains(&pct) {
                return invalid(format!("ev_per_price_cutoff {pct} outside 0..=100"));
            }
        }
        if !(0.0..=100.0).contains(&self.pruning.keep_top_ev_percent) {
            return invalid(format!(
                "keep_top_ev_percent {} outside 0..=100",
                self.pruning.keep_top_ev_percent
            ));
        }
        if self.solver.mip_gap < 0.0 {
            return invalid("mip_gap must be non-negative".into());
        }
        Ok(())
    }

    /// Planned gameweeks starting at `next_gw`, capped at season end.
    pub fn horizon_gameweeks(&self, next_gw: Gameweek) -> Vec<Gameweek> {
        let last = (next_gw + self.horizon - 1).min(self.season_end_gw);
        (next_gw..=last).collect()
    }

    /// Stable hash of the serialized configuration.
    pub fn config_hash(&self) -> ConfigHash {
        let json = serde_json::to_vec(self).unwrap_or_default();
        ConfigHash::from_bytes(&json)
    }
}

/// How weekly EVs combine into the horizon objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMode {
    /// Unweighted sum.
    #[default]
    Regular,
    /// Week `t` weighted by `decay_base^t`.
    Decay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    pub mode: ObjectiveMode,
    pub decay_base: f64,
    /// Extra bases evaluated on the solved plan; they never steer the solve.
    pub report_decay_bases: Vec<f64>,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            mode: ObjectiveMode::Regular,
            decay_base: 0.84,
            report_decay_bases: Vec::new(),
        }
    }
}

impl ObjectiveConfig {
    /// Weight applied to the week at offset `t` from `next_gw`.
    pub fn week_weight(&self, t: usize) -> f64 {
        match self.mode {
            ObjectiveMode::Regular => 1.0,
            ObjectiveMode::Decay => self.decay_base.powi(t as i32),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Fraction of the captain bonus credited to the vice-captain.
    pub vcap_weight: f64,
    /// Autosub probability weight per bench slot.
    pub bench_weights: [f64; 4],
    /// Points deducted per penalized transfer.
    pub hit_cost: f64,
    /// Marginal value of each banked free transfer beyond the first.
    pub ft_value: f64,
    /// Per-state overrides of `ft_value`: entry `i` is the marginal value of
    /// holding `i + 2` free transfers.
    pub ft_value_list: Vec<f64>,
    /// Objective bonus per unit of money in the bank.
    pub itb_value: f64,
    /// Bank deducted per transfer after the first planned week.
    pub itb_loss_per_transfer: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            vcap_weight: 0.1,
            bench_weights: [0.03, 0.21, 0.06, 0.002],
            hit_cost: 4.0,
            ft_value: 1.5,
            ft_value_list: Vec::new(),
            itb_value: 0.0,
            itb_loss_per_transfer: 0.0,
        }
    }
}

impl ScoringConfig {
    /// Marginal value of moving from `state - 1` to `state` free transfers.
    pub fn marginal_ft_value(&self, state: u8) -> f64 {
        if state < 2 {
            return 0.0;
        }
        self.ft_value_list
            .get(usize::from(state - 2))
            .copied()
            .unwrap_or(self.ft_value)
    }

    /// Cumulative value of holding `state` free transfers.
    pub fn cumulative_ft_value(&self, state: u8) -> f64 {
        (2..=state).map(|s| self.marginal_ft_value(s)).sum()
    }
}

/// Usage rule for one chip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipRule {
    /// Maximum uses across the horizon. Raised to the forced count if lower.
    pub cap: u32,
    /// When non-empty, the chip may only be played in these gameweeks.
    pub allowed_gws: Vec<Gameweek>,
    /// Gameweeks where the chip must be played.
    pub forced_gws: Vec<Gameweek>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipsConfig {
    pub wildcard: ChipRule,
    pub free_hit: ChipRule,
    pub bench_boost: ChipRule,
    pub triple_captain: ChipRule,
}

impl ChipsConfig {
    pub fn rule(&self, chip: Chip) -> &ChipRule {
        match chip {
            Chip::Wildcard => &self.wildcard,
            Chip::FreeHit => &self.free_hit,
            Chip::BenchBoost => &self.bench_boost,
            Chip::TripleCaptain => &self.triple_captain,
        }
    }

    pub fn rule_mut(&mut self, chip: Chip) -> &mut ChipRule {
        match chip {
            Chip::Wildcard => &mut self.wildcard,
            Chip::FreeHit => &mut self.free_hit,
            Chip::BenchBoost => &mut self.bench_boost,
            Chip::TripleCaptain => &mut self.triple_captain,
        }
    }
}

/// A transfer the manager has already committed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedTransfer {
    pub gw: Gameweek,
    #[serde(default)]
    pub buy: Option<PlayerId>,
    #[serde(default)]
    pub sell: Option<PlayerId>,
}

/// A gameweek whose free-transfer balance is set by the game, not rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialFreeTransfers {
    pub gw: Gameweek,
    pub value: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub no_transfer_gws: Vec<Gameweek>,
    /// Maximum penalized transfers across the horizon.
    pub hit_limit: Option<u32>,
    /// Maximum penalized transfers in any single week.
    pub weekly_hit_limit: Option<u32>,
    /// Maximum charged transfers after the first planned week.
    pub future_transfer_limit: Option<u32>,
    pub booked: Vec<BookedTransfer>,
    pub special_ft: Option<SpecialFreeTransfers>,
}

/// Require at least `count` squad members of `position` priced at `price`
/// in the first planned week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub position: Position,
    pub price: f64,
    #[serde(default = "default_price_point_count")]
    pub count: u32,
}

fn default_price_point_count() -> u32 {
    1
}

/// Which starters count when two opposing clubs meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpposingGroup {
    /// Any starter from either club.
    #[default]
    All,
    /// Attackers (midfielders, forwards) against the opponent's goalkeeper
    /// and defenders.
    AttackVsDefence,
}

/// Handling of starters from clubs facing each other.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpposingPlay {
    #[default]
    Allow,
    Penalize {
        weight: f64,
        #[serde(default)]
        group: OpposingGroup,
    },
    Forbid {
        #[serde(default)]
        group: OpposingGroup,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub banned: Vec<PlayerId>,
    pub locked: Vec<PlayerId>,
    pub banned_next_gw: Vec<PlayerId>,
    pub locked_next_gw: Vec<PlayerId>,
    /// Maximum players from one club.
    pub team_limit: u32,
    /// Optional cap on goalkeepers plus defenders from one club.
    pub max_defenders_per_team: Option<u32>,
    pub price_points: Vec<PricePoint>,
    pub opposing_play: OpposingPlay,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            banned: Vec::new(),
            locked: Vec::new(),
            banned_next_gw: Vec::new(),
            locked_next_gw: Vec::new(),
            team_limit: 3,
            max_defenders_per_team: None,
            price_points: Vec::new(),
            opposing_play: OpposingPlay::Allow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruningConfig {
    /// Drop players whose summed expected minutes fall below this.
    pub xmin_lb: Option<f64>,
    /// Drop players below this percentile of EV per unit price.
    pub ev_per_price_cutoff: Option<f64>,
    /// Top share of players by horizon EV that are never pruned.
    pub keep_top_ev_percent: f64,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            xmin_lb: None,
            ev_per_price_cutoff: None,
            keep_top_ev_percent: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizationConfig {
    pub enabled: bool,
    /// Standard deviation of the multiplicative noise.
    pub magnitude: f64,
    pub seed: Option<u64>,
}

/// The decision along which successive plans must differ.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiversityAxis {
    /// Next week's purchases.
    Buy,
    /// Next week's sales.
    Sell,
    /// Next week's purchases or sales.
    #[default]
    BuyOrSell,
    /// Chip-usage weeks.
    Chips,
    /// Next week's starters, by at least `min_diff` players.
    Lineup { min_diff: u32 },
    /// Transfers within the listed gameweeks.
    TargetWeeks { gameweeks: Vec<Gameweek> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityConfig {
    pub solutions: u32,
    pub axis: DiversityAxis,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            solutions: 1,
            axis: DiversityAxis::BuyOrSell,
        }
    }
}
