//! The plan loop: encode, build, solve, extract, cut, repeat.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::domain::{Gameweek, PlayerId, RunId, SquadState};
use crate::encoder::{encode, PlanningData};
use crate::error::PlanError;
use crate::mip::{solve_logged, solver_for, MipSolver, SolveError};
use crate::projection::{perturb, ProjectionTable};
use crate::rng::RngHierarchy;
use crate::transitions::{
    bank_after, charged_transfers, next_free_transfers_with_override, penalized_transfers,
};

use super::builder::build;
use super::diversify::DiversityCut;
use super::extract::{extract, Plan};

/// Fewer plans than requested, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub requested: u32,
    pub produced: u32,
    pub reason: String,
}

/// All plans from one call to [`plan`], best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSet {
    pub next_gw: Gameweek,
    pub gameweeks: Vec<Gameweek>,
    pub plans: Vec<Plan>,
    pub shortfall: Option<Shortfall>,
    /// Players dropped by pruning before the model was built.
    pub pruned: Vec<PlayerId>,
    /// Seed used for projection noise, when enabled.
    pub noise_seed: Option<u64>,
}

impl PlanSet {
    pub fn best(&self) -> Option<&Plan> {
        self.plans.first()
    }

    pub fn is_complete(&self) -> bool {
        self.shortfall.is_none()
    }
}

/// Produce up to `config.diversity.solutions` plans.
///
/// The first solve must succeed. Later solves that prove infeasible end the
/// loop with an explicit [`Shortfall`].
pub fn plan(
    table: &ProjectionTable,
    state: &SquadState,
    config: &PlannerConfig,
) -> Result<PlanSet, PlanError> {
    let solver = solver_for(config.solver.backend).map_err(|e| PlanError::Solver(e.to_string()))?;
    plan_with(solver.as_ref(), table, state, config)
}

/// [`plan`] with an explicit solver adapter instead of the configured backend.
pub fn plan_with(
    solver: &dyn MipSolver,
    table: &ProjectionTable,
    state: &SquadState,
    config: &PlannerConfig,
) -> Result<PlanSet, PlanError> {
    let (table, noise_seed) = randomized(table, config);
    let data = encode(&table, state, config)?;
    let mut pm = build(&data, config)?;

    let requested = config.diversity.solutions;
    let mut plans: Vec<Plan> = Vec::new();
    let mut shortfall = None;

    for index in 0..requested as usize {
        let outcome = match solve_logged(solver, &pm.model, &config.solver) {
            Ok(outcome) => outcome,
            Err(SolveError::Infeasible) if index > 0 => {
                shortfall = Some(Shortfall {
                    requested,
                    produced: plans.len() as u32,
                    reason: "no further plan differs on the diversity axis".into(),
                });
                break;
            }
            Err(SolveError::Infeasible) => {
                return Err(PlanError::InfeasibleModel {
                    detail: format!(
                        "{} players, {} weeks, {} constraints",
                        data.players.len(),
                        data.horizon(),
                        pm.model.num_constraints()
                    ),
                })
            }
            Err(e) => return Err(PlanError::Solver(e.to_string())),
        };
        if !outcome.status.is_optimal() {
            if config.solver.require_optimal {
                return Err(PlanError::SolverTimeout {
                    status: outcome.status,
                });
            }
            tracing::warn!(event = "incumbent_accepted", index, status = %outcome.status);
        }

        let plan = extract(&data, config, &pm, &outcome, index);
        for problem in audit(&plan, &data, config) {
            tracing::warn!(event = "plan_audit", index, problem = %problem);
        }
        tracing::info!(
            event = "plan_found",
            index,
            score = plan.score,
            transfers = plan.total_transfers()
        );
        plans.push(plan);

        if index + 1 == requested as usize {
            break;
        }
        match DiversityCut::from_outcome(&config.diversity.axis, &data, &pm.vars, &outcome) {
            Some(cut) => cut.apply(&mut pm.model),
            None => {
                shortfall = Some(Shortfall {
                    requested,
                    produced: plans.len() as u32,
                    reason: "diversity axis has no decisions inside the horizon".into(),
                });
                break;
            }
        }
    }

    if let Some(s) = &shortfall {
        tracing::warn!(
            event = "plan_shortfall",
            requested = s.requested,
            produced = s.produced,
            reason = %s.reason
        );
    }

    Ok(PlanSet {
        next_gw: data.next_gw,
        gameweeks: data.gameweeks.clone(),
        plans,
        shortfall,
        pruned: data.pruned.clone(),
        noise_seed,
    })
}

/// Apply projection noise when randomization is on. The seed falls back to a
/// random one, returned so the run can be reproduced.
fn randomized<'a>(
    table: &'a ProjectionTable,
    config: &PlannerConfig,
) -> (Cow<'a, ProjectionTable>, Option<u64>) {
    let settings = &config.randomization;
    if !settings.enabled || settings.magnitude <= 0.0 {
        return (Cow::Borrowed(table), None);
    }
    let seed = settings.seed.unwrap_or_else(rand::random::<u64>);
    let run_id = RunId(config.config_hash().0);
    let mut rng = RngHierarchy::new(seed).rng_for(&run_id, "projection_noise", 0);
    tracing::debug!(event = "projection_noise", seed, magnitude = settings.magnitude);
    (Cow::Owned(perturb(table, &mut rng, settings.magnitude)), Some(seed))
}

/// Replay the plan's week statistics through the scalar game rules and
/// report every disagreement. An empty list means the plan is consistent.
pub fn audit(plan: &Plan, data: &PlanningData, config: &PlannerConfig) -> Vec<String> {
    const TOL: f64 = 1e-6;
    let mut problems = Vec::new();
    let special = |gw: Gameweek| {
        config
            .transfers
            .special_ft
            .filter(|s| s.gw == gw)
            .map(|s| s.value)
    };

    let mut bank = if data.preseason {
        let spent: f64 = plan
            .picks_for(data.next_gw)
            .filter(|r| r.squad)
            .map(|r| data.player(r.id).map_or(0.0, |p| p.buy_price))
            .sum();
        data.budget - spent
    } else {
        data.initial_bank
    };

    for (t, week) in plan.weeks.iter().enumerate() {
        let gw = week.gameweek;
        let charged = charged_transfers(week.transfers, week.chip);
        if charged != week.charged {
            problems.push(format!("GW{gw}: charged {} != {charged}", week.charged));
        }
        let hits = penalized_transfers(charged, week.free_transfers);
        if hits != week.hits {
            problems.push(format!("GW{gw}: hits {} != {hits}", week.hits));
        }
        let next = next_free_transfers_with_override(
            week.free_transfers,
            charged,
            week.chip,
            special(gw + 1),
        );
        let reported = plan
            .weeks
            .get(t + 1)
            .map_or(plan.final_free_transfers, |w| w.free_transfers);
        if next != reported {
            problems.push(format!("GW{}: free transfers {reported} != {next}", gw + 1));
        }

        let rows: Vec<_> = plan.picks_for(gw).collect();
        let proceeds: f64 = rows.iter().filter(|r| r.transfer_out).map(|r| r.sell_price).sum();
        let cost: f64 = rows.iter().filter(|r| r.transfer_in).map(|r| r.buy_price).sum();
        bank = bank_after(
            bank,
            proceeds,
            cost,
            week.transfers,
            config.scoring.itb_loss_per_transfer,
            t > 0,
        );
        if (bank - week.bank).abs() > TOL {
            problems.push(format!("GW{gw}: bank {:.4} != {bank:.4}", week.bank));
        }
        bank = week.bank;
    }
    problems
}
