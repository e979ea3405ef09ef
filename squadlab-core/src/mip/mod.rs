//! Mixed-integer model and the solver port.
//!
//! - `model`: backend-neutral variables, rows and objective
//! - `solver`: the `MipSolver` trait, settings, outcome and errors
//! - `backend`: `good_lp` adapters (`microlp` always, HiGHS behind `highs`)

pub mod backend;
pub mod model;
pub mod solver;

pub use backend::{solve_logged, solve_with, solver_for, MicroLpSolver};
#[cfg(feature = "highs")]
pub use backend::HighsSolver;
pub use model::{Constraint, LinExpr, MipModel, ObjectiveSense, Sense, VarDef, VarId, VarKind};
pub use solver::{
    MipSolver, SolveError, SolveLimit, SolveOutcome, SolveStatus, SolverBackend, SolverSettings,
};
