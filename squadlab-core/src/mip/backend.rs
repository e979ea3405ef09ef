//! `good_lp` adapters for the solver port.

use std::time::Instant;

use good_lp::{
    variable, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus,
    SolverModel, Variable,
};

use super::model::{MipModel, ObjectiveSense, Sense, VarKind};
use super::solver::{
    MipSolver, SolveError, SolveLimit, SolveOutcome, SolveStatus, SolverBackend, SolverSettings,
};

/// Pick the adapter named in the settings.
pub fn solver_for(backend: SolverBackend) -> Result<Box<dyn MipSolver>, SolveError> {
    match backend {
        SolverBackend::Microlp => Ok(Box::new(MicroLpSolver)),
        #[cfg(feature = "highs")]
        SolverBackend::Highs => Ok(Box::new(HighsSolver)),
        #[cfg(not(feature = "highs"))]
        SolverBackend::Highs => Err(SolveError::Unsupported("highs")),
    }
}

/// Declare every model variable. `relax` drops integrality.
fn declare(model: &MipModel, relax: bool) -> (ProblemVariables, Vec<Variable>) {
    let mut vars = ProblemVariables::new();
    let handles = model
        .vars()
        .iter()
        .map(|def| {
            let mut v = variable().name(def.name.clone());
            if !relax && def.kind != VarKind::Continuous {
                v = v.integer();
            }
            if def.lower.is_finite() {
                v = v.min(def.lower);
            }
            if def.upper.is_finite() {
                v = v.max(def.upper);
            }
            vars.add(v)
        })
        .collect();
    (vars, handles)
}

fn expression(terms: &[(super::model::VarId, f64)], handles: &[Variable]) -> Expression {
    let mut expr = Expression::default();
    for &(var, coef) in terms {
        expr.add_mul(coef, handles[var.0]);
    }
    expr
}

fn add_rows<M: SolverModel>(mut problem: M, model: &MipModel, handles: &[Variable]) -> M {
    for row in model.constraints() {
        let lhs = expression(&row.terms, handles);
        problem = problem.with(match row.sense {
            Sense::Le => lhs.leq(row.rhs),
            Sense::Ge => lhs.geq(row.rhs),
            Sense::Eq => lhs.eq(row.rhs),
        });
    }
    problem
}

fn read_values<S: Solution>(solution: &S, handles: &[Variable]) -> Vec<f64> {
    handles.iter().map(|v| solution.value(*v)).collect()
}

/// Relative gap between an incumbent objective and a bound on the optimum.
pub fn relative_gap(objective: f64, bound: f64) -> f64 {
    let diff = (bound - objective).abs();
    if diff <= 1e-9 {
        0.0
    } else {
        diff / objective.abs().max(1e-9)
    }
}

/// Translate a backend's stop reason into the port's status.
///
/// `bound_gap` is the gap against a relaxation bound, when one was computed.
/// A gap-limited stop is also bounded by the configured `mip_gap`.
pub fn status_from(status: SolutionStatus, mip_gap: f64, bound_gap: Option<f64>) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::GapLimit => SolveStatus::Feasible {
            limit: SolveLimit::Gap,
            gap: Some(bound_gap.map_or(mip_gap, |g| g.min(mip_gap))),
        },
        SolutionStatus::TimeLimit => SolveStatus::Feasible {
            limit: SolveLimit::Time,
            gap: bound_gap,
        },
    }
}

fn map_resolution_error(err: ResolutionError) -> SolveError {
    match err {
        ResolutionError::Infeasible => SolveError::Infeasible,
        ResolutionError::Unbounded => SolveError::Unbounded,
        other => SolveError::Backend(other.to_string()),
    }
}

/// Pure-Rust branch and bound via `microlp`.
///
/// Runs to proven optimality; time limit, gap, seed and thread settings are
/// ignored (a time limit is logged as a warning).
#[derive(Debug, Default, Clone, Copy)]
pub struct MicroLpSolver;

impl MipSolver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, model: &MipModel, settings: &SolverSettings) -> Result<SolveOutcome, SolveError> {
        if let Some(limit) = settings.time_limit_secs {
            tracing::warn!(
                event = "time_limit_ignored",
                backend = "microlp",
                time_limit_secs = limit
            );
        }
        let (vars, handles) = declare(model, false);
        // Constant terms are added back after the solve.
        let objective = expression(&model.objective().terms, &handles);
        let unsolved = match model.sense() {
            ObjectiveSense::Maximize => vars.maximise(objective),
            ObjectiveSense::Minimize => vars.minimise(objective),
        };
        let problem = add_rows(unsolved.using(good_lp::solvers::microlp::microlp), model, &handles);
        let solution = problem.solve().map_err(map_resolution_error)?;
        let values = read_values(&solution, &handles);
        Ok(SolveOutcome {
            status: status_from(solution.status(), 0.0, None),
            objective: model.objective().evaluate(&values),
            values,
        })
    }
}

/// HiGHS branch and cut. Honours time limit, relative gap, seed and threads.
#[cfg(feature = "highs")]
#[derive(Debug, Default, Clone, Copy)]
pub struct HighsSolver;

#[cfg(feature = "highs")]
impl MipSolver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, model: &MipModel, settings: &SolverSettings) -> Result<SolveOutcome, SolveError> {
        let (vars, handles) = declare(model, false);
        let objective = expression(&model.objective().terms, &handles);
        let unsolved = match model.sense() {
            ObjectiveSense::Maximize => vars.maximise(objective),
            ObjectiveSense::Minimize => vars.minimise(objective),
        };
        let problem = add_rows(highs_problem(unsolved, settings), model, &handles);
        let solution = problem.solve().map_err(map_resolution_error)?;
        let values = read_values(&solution, &handles);
        let objective = model.objective().evaluate(&values);

        let bound_gap = match solution.status() {
            SolutionStatus::Optimal => None,
            _ => relaxation_bound(model, settings).map(|bound| relative_gap(objective, bound)),
        };
        Ok(SolveOutcome {
            status: status_from(solution.status(), settings.mip_gap, bound_gap),
            objective,
            values,
        })
    }
}

#[cfg(feature = "highs")]
fn highs_problem(
    unsolved: good_lp::variable::UnsolvedProblem,
    settings: &SolverSettings,
) -> good_lp::solvers::highs::HighsProblem {
    let mut problem = unsolved
        .using(good_lp::solvers::highs::highs)
        .set_option("output_flag", false)
        .set_option("mip_rel_gap", settings.mip_gap);
    if let Some(limit) = settings.time_limit_secs {
        problem = problem.set_option("time_limit", limit);
    }
    if let Some(seed) = settings.seed {
        problem = problem.set_option("random_seed", (seed % i32::MAX as u64) as i32);
    }
    if let Some(threads) = settings.threads {
        problem = problem.set_option("threads", threads as i32);
    }
    problem
}

/// Optimum of the LP relaxation, a bound on the integer optimum.
#[cfg(feature = "highs")]
fn relaxation_bound(model: &MipModel, settings: &SolverSettings) -> Option<f64> {
    let (vars, handles) = declare(model, true);
    let objective = expression(&model.objective().terms, &handles);
    let unsolved = match model.sense() {
        ObjectiveSense::Maximize => vars.maximise(objective),
        ObjectiveSense::Minimize => vars.minimise(objective),
    };
    let problem = add_rows(highs_problem(unsolved, settings), model, &handles);
    match problem.solve() {
        Ok(relaxed) if matches!(relaxed.status(), SolutionStatus::Optimal) => {
            Some(model.objective().evaluate(&read_values(&relaxed, &handles)))
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(event = "relaxation_failed", error = %e);
            None
        }
    }
}

/// Solve with the configured backend and log the outcome.
pub fn solve_with(model: &MipModel, settings: &SolverSettings) -> Result<SolveOutcome, SolveError> {
    let solver = solver_for(settings.backend)?;
    solve_logged(solver.as_ref(), model, settings)
}

/// Solve with a given adapter and log the outcome.
pub fn solve_logged(
    solver: &dyn MipSolver,
    model: &MipModel,
    settings: &SolverSettings,
) -> Result<SolveOutcome, SolveError> {
    tracing::debug!(
        event = "solve_start",
        backend = solver.name(),
        vars = model.num_vars(),
        integer_vars = model.num_integer_vars(),
        constraints = model.num_constraints()
    );
    let started = Instant::now();
    let outcome = solver.solve(model, settings);
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(o) => tracing::debug!(
            event = "solve_end",
            backend = solver.name(),
            elapsed_ms,
            objective = o.objective,
            optimal = o.status.is_optimal()
        ),
        Err(e) => tracing::debug!(
            event = "solve_end",
            backend = solver.name(),
            elapsed_ms,
            error = %e
        ),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::LinExpr;

    #[test]
    fn knapsack_solves_to_optimum() {
        let mut model = MipModel::new();
        let items = [(5.0, 4.0), (4.0, 3.0), (3.0, 2.0)];
        let xs: Vec<_> = (0..items.len())
            .map(|i| model.binary(format!("x{i}")))
            .collect();
        model.le(
            "capacity",
            LinExpr::weighted(xs.iter().zip(items).map(|(&x, (_, w))| (x, w))),
            5.0,
        );
        let mut objective = LinExpr::weighted(xs.iter().zip(items).map(|(&x, (v, _))| (x, v)));
        objective.add_constant(10.0);
        model.set_objective(objective, ObjectiveSense::Maximize);

        let outcome = MicroLpSolver
            .solve(&model, &SolverSettings::default())
            .unwrap();
        assert!(outcome.status.is_optimal());
        // Items 1 and 2 (weight 5, value 7) beat item 0 alone.
        assert!((outcome.objective - 17.0).abs() < 1e-6);
        assert!(!outcome.is_set(xs[0]));
        assert!(outcome.is_set(xs[1]) && outcome.is_set(xs[2]));
        assert!(model.violations(&outcome.values, 1e-6).is_empty());
    }

    #[test]
    fn infeasible_is_distinguished() {
        let mut model = MipModel::new();
        let x = model.binary("x");
        model.ge("too_much", LinExpr::from(x), 2.0);
        model.set_objective(LinExpr::from(x), ObjectiveSense::Maximize);
        let err = MicroLpSolver
            .solve(&model, &SolverSettings::default())
            .unwrap_err();
        assert!(matches!(err, SolveError::Infeasible));
    }

    #[test]
    fn fixed_bounds_are_respected() {
        let mut model = MipModel::new();
        let x = model.integer("x", 0.0, 5.0);
        model.fix(x, 3.0);
        model.set_objective(LinExpr::from(x), ObjectiveSense::Maximize);
        let outcome = solve_with(&model, &SolverSettings::default()).unwrap();
        assert_eq!(outcome.int_value(x), 3);
    }

    #[test]
    fn optimal_status_passes_through() {
        assert_eq!(status_from(SolutionStatus::Optimal, 0.05, None), SolveStatus::Optimal);
    }

    #[test]
    fn gap_limited_stop_is_not_optimal() {
        let status = status_from(SolutionStatus::GapLimit, 0.05, None);
        assert_eq!(
            status,
            SolveStatus::Feasible {
                limit: SolveLimit::Gap,
                gap: Some(0.05)
            }
        );
        assert!(!status.is_optimal());

        // A tighter relaxation bound wins over the configured gap.
        let status = status_from(SolutionStatus::GapLimit, 0.05, Some(0.01));
        assert_eq!(status.gap(), Some(0.01));
    }

    #[test]
    fn time_limited_stop_reports_bound_gap() {
        let status = status_from(SolutionStatus::TimeLimit, 0.0, Some(0.2));
        assert_eq!(
            status,
            SolveStatus::Feasible {
                limit: SolveLimit::Time,
                gap: Some(0.2)
            }
        );
        let unknown = status_from(SolutionStatus::TimeLimit, 0.0, None);
        assert_eq!(unknown.gap(), None);
        assert!(!unknown.is_optimal());
    }

    #[test]
    fn relative_gap_against_bound() {
        assert_eq!(relative_gap(100.0, 100.0), 0.0);
        assert!((relative_gap(100.0, 110.0) - 0.1).abs() < 1e-12);
        assert!((relative_gap(-50.0, -45.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn microlp_ignores_time_limit_but_still_proves_optimality() {
        let mut model = MipModel::new();
        let x = model.integer("x", 0.0, 4.0);
        model.set_objective(LinExpr::from(x), ObjectiveSense::Maximize);
        let settings = SolverSettings {
            time_limit_secs: Some(0.001),
            ..SolverSettings::default()
        };
        let outcome = MicroLpSolver.solve(&model, &settings).unwrap();
        assert!(outcome.status.is_optimal());
        assert_eq!(outcome.int_value(x), 4);
    }

    #[cfg(not(feature = "highs"))]
    #[test]
    fn highs_requires_feature() {
        assert!(matches!(
            solver_for(SolverBackend::Highs),
            Err(SolveError::Unsupported("highs"))
        ));
    }
}
