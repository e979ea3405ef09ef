use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::{Gameweek, PlayerId};
use crate::mip::SolveStatus;

/// Planner failures. Every run ends in a complete plan or one of these.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Projection data needed by the horizon is missing.
    #[error("data unavailable: {0}")]
    DataUnavailable(MissingData),

    /// The backend proved no assignment satisfies the hard constraints.
    #[error("no feasible plan: {detail}")]
    InfeasibleModel { detail: String },

    /// The solve stopped on its time or gap limit and an optimal plan was required.
    #[error("solver stopped before proving optimality ({status})")]
    SolverTimeout { status: SolveStatus },

    /// Options contradict each other or the current squad state.
    #[error("configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// Backend failure. Not retried.
    #[error("solver error: {0}")]
    Solver(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What exactly was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingData {
    /// No points or minutes column for a planned gameweek.
    Column { gameweek: Gameweek, column: &'static str },
    /// A player the plan must account for is not in the table.
    Player { player: PlayerId, role: &'static str },
    /// A player the plan must account for has a blank cell in a planned week.
    Cell {
        player: PlayerId,
        role: &'static str,
        gameweek: Gameweek,
        column: &'static str,
    },
    /// The table has no gameweek columns at all.
    EmptyTable,
}

impl fmt::Display for MissingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { gameweek, column } => {
                write!(f, "no {column} column for GW{gameweek}")
            }
            Self::Player { player, role } => {
                write!(f, "{role} player {player} missing from the projection table")
            }
            Self::Cell {
                player,
                role,
                gameweek,
                column,
            } => write!(f, "{role} player {player} has no {column} projection for GW{gameweek}"),
            Self::EmptyTable => f.write_str("projection table has no gameweek columns"),
        }
    }
}

impl PlanError {
    /// Whether the error was detected before any model was built.
    pub fn is_pre_solve(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable(_) | Self::ConfigurationConflict(_) | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::SolveLimit;

    #[test]
    fn messages_name_the_gap() {
        let err = PlanError::DataUnavailable(MissingData::Column {
            gameweek: 7,
            column: "points",
        });
        assert_eq!(err.to_string(), "data unavailable: no points column for GW7");
        assert!(err.is_pre_solve());
    }

    #[test]
    fn solver_outcomes_are_post_solve() {
        assert!(!PlanError::InfeasibleModel { detail: "x".into() }.is_pre_solve());
        let status = SolveStatus::Feasible {
            limit: SolveLimit::Gap,
            gap: Some(0.05),
        };
        let err = PlanError::SolverTimeout { status };
        assert!(!err.is_pre_solve());
        assert_eq!(
            err.to_string(),
            "solver stopped before proving optimality (feasible at gap limit, gap <= 5.00%)"
        );
    }
}
