//! Objective composer.
//!
//! Weekly EV:
//! `Σ xp·(lineup + captain + vcap_weight·vicecap + tc)`
//! `+ Σ xp·bench_weight[o]·bench[o]`
//! `- hit_cost·penalized + Σ_s ft_value_cum(s)·ft_state(t+1, s)`
//! `+ itb_value·bank - Σ weight·clash`

use crate::config::{ObjectiveConfig, ObjectiveMode, PlannerConfig};
use crate::encoder::PlanningData;
use crate::mip::LinExpr;

use super::builder::Penalty;
use super::variables::{PlanVars, FT_STATES};

/// One expression per planned week.
pub fn weekly_ev(
    data: &PlanningData,
    config: &PlannerConfig,
    vars: &PlanVars,
    penalties: &[Penalty],
) -> Vec<LinExpr> {
    let scoring = &config.scoring;
    (0..data.horizon())
        .map(|t| {
            let mut ev = LinExpr::new();
            for (p, player) in data.players.iter().enumerate() {
                let xp = player.points[t];
                if xp != 0.0 {
                    ev.add_term(vars.lineup[t][p], xp);
                    ev.add_term(vars.captain[t][p], xp);
                    ev.add_term(vars.vicecap[t][p], xp * scoring.vcap_weight);
                    if let Some(tc) = vars.tc_captain[t][p] {
                        ev.add_term(tc, xp);
                    }
                    for (o, slot) in vars.bench_slots(t, p) {
                        ev.add_term(slot, xp * scoring.bench_weights[o]);
                    }
                }
            }
            ev.add_term(vars.penalized[t], -scoring.hit_cost);
            for s in 0..FT_STATES {
                ev.add_term(
                    vars.ft_state[t][s],
                    scoring.cumulative_ft_value((s + 1) as u8),
                );
            }
            ev.add_term(vars.bank[t], scoring.itb_value);
            for penalty in penalties.iter().filter(|pen| pen.week == t) {
                ev.add_term(penalty.var, -penalty.weight);
            }
            ev
        })
        .collect()
}

/// Horizon objective from the weekly expressions.
pub fn horizon_objective(weekly: &[LinExpr], objective: &ObjectiveConfig) -> LinExpr {
    let mut total = LinExpr::new();
    for (t, ev) in weekly.iter().enumerate() {
        total.add_expr(ev, objective.week_weight(t));
    }
    total
}

/// Score of a solved plan under an arbitrary decay base.
pub fn decayed_score(weekly_values: &[f64], base: f64) -> f64 {
    weekly_values
        .iter()
        .enumerate()
        .map(|(t, ev)| base.powi(t as i32) * ev)
        .sum()
}

/// Score under the configured horizon objective.
pub fn horizon_score(weekly_values: &[f64], objective: &ObjectiveConfig) -> f64 {
    match objective.mode {
        ObjectiveMode::Regular => weekly_values.iter().sum(),
        ObjectiveMode::Decay => decayed_score(weekly_values, objective.decay_base),
    }
}
