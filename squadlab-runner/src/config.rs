//! Run configuration: which files to read, where to write, how to plan.
//!
//! A run file wraps a [`PlannerConfig`] with the paths the planner itself
//! never touches. Relative paths resolve against the run file's directory.
//!
//! ```toml
//! projections = "data/projections.csv"
//! fixtures = "data/fixtures.csv"
//! state = "data/state.json"
//! output_dir = "out"
//! history = "out/history.jsonl"
//!
//! [planner]
//! horizon = 4
//!
//! [sweep]
//! noise_runs = 10
//! master_seed = 42
//!
//! [[sweep.chip_options]]
//! chip = "wildcard"
//! gws = [12, 13]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use squadlab_core::domain::{Chip, Gameweek, RunId};
use squadlab_core::{ConfigError, PlannerConfig};

/// Everything needed to reproduce one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Projection CSV.
    pub projections: PathBuf,

    /// Optional fixture CSV (`gw,home,away`), needed for opposing-play rules.
    #[serde(default)]
    pub fixtures: Option<PathBuf>,

    /// Current squad state, JSON or TOML by extension.
    pub state: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// JSONL history file. No history is written when absent.
    #[serde(default)]
    pub history: Option<PathBuf>,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl RunConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.planner.validate()?;
        self.sweep.validate()
    }

    /// Join relative paths onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.projections);
        join(&mut self.state);
        join(&mut self.output_dir);
        if let Some(p) = self.fixtures.as_mut() {
            join(p);
        }
        if let Some(p) = self.history.as_mut() {
            join(p);
        }
    }

    /// Deterministic id over the whole run configuration.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        RunId::from_bytes(&json)
    }
}

/// One chip the sweep may try, and the weeks it may try it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipOption {
    pub chip: Chip,
    pub gws: Vec<Gameweek>,
}

/// Scenario sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Each listed chip is either left unused or forced in one of its weeks.
    pub chip_options: Vec<ChipOption>,
    /// Noise-perturbed repetitions of every chip scenario. 0 disables noise.
    pub noise_runs: u32,
    pub master_seed: u64,
    /// Noise standard deviation for sweep repetitions.
    pub noise_magnitude: f64,
    /// Cores left free for the rest of the machine.
    pub reserve_cores: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            chip_options: Vec::new(),
            noise_runs: 0,
            master_seed: 42,
            noise_magnitude: 0.1,
            reserve_cores: 1,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.noise_runs > 0 && !(self.noise_magnitude > 0.0) {
            return Err(ConfigError::Invalid(
                "sweep.noise_magnitude must be positive when noise_runs > 0".into(),
            ));
        }
        let mut seen = Vec::new();
        for option in &self.chip_options {
            if seen.contains(&option.chip) {
                return Err(ConfigError::Invalid(format!(
                    "sweep.chip_options lists {} twice",
                    option.chip
                )));
            }
            seen.push(option.chip);
        }
        Ok(())
    }
}
