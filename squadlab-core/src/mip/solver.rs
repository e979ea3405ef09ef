//! Solver port: submit a model, get a status and one value per variable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{MipModel, VarId};

/// Which adapter handles the solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Pure-Rust branch and bound. Ignores time limit, gap, seed and threads.
    #[default]
    #[serde(alias = "micro_lp")]
    Microlp,
    /// HiGHS branch and cut; needs the `highs` feature.
    Highs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub backend: SolverBackend,
    pub time_limit_secs: Option<f64>,
    /// Relative optimality gap at which the backend may stop.
    pub mip_gap: f64,
    pub seed: Option<u64>,
    pub threads: Option<u32>,
    /// Treat a gap/time-limited incumbent as an error instead of accepting it.
    pub require_optimal: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Microlp,
            time_limit_secs: None,
            mip_gap: 0.0,
            seed: None,
            threads: None,
            require_optimal: false,
        }
    }
}

/// Which limit stopped a solve short of proven optimality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveLimit {
    #[default]
    Time,
    Gap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// Stopped on a limit with a feasible incumbent.
    ///
    /// `gap` is an upper bound on the achieved relative gap, `None` when the
    /// backend could not bound it.
    Feasible {
        #[serde(default)]
        limit: SolveLimit,
        gap: Option<f64>,
    },
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, Self::Optimal)
    }

    /// Achieved relative gap: zero when optimal.
    pub fn gap(&self) -> Option<f64> {
        match self {
            Self::Optimal => Some(0.0),
            Self::Feasible { gap, .. } => *gap,
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => f.write_str("optimal"),
            Self::Feasible { limit, gap } => {
                let limit = match limit {
                    SolveLimit::Time => "time limit",
                    SolveLimit::Gap => "gap limit",
                };
                match gap {
                    Some(gap) => write!(f, "feasible at {limit}, gap <= {:.2}%", gap * 100.0),
                    None => write!(f, "feasible at {limit}, gap unknown"),
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Objective value including the model's constant term.
    pub objective: f64,
    pub values: Vec<f64>,
}

impl SolveOutcome {
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Value rounded to the nearest integer, for binaries and integers.
    pub fn int_value(&self, var: VarId) -> i64 {
        self.value(var).round() as i64
    }

    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("model is infeasible")]
    Infeasible,

    #[error("model is unbounded")]
    Unbounded,

    #[error("backend failure: {0}")]
    Backend(String),

    #[error("solver backend '{0}' is not compiled in")]
    Unsupported(&'static str),
}

/// The narrow contract every backend adapter implements.
pub trait MipSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &MipModel, settings: &SolverSettings) -> Result<SolveOutcome, SolveError>;
}
