//! No-good cuts that force the next solve away from a found plan.
//!
//! For the axis variables `V` and the previous solution's values:
//! `Σ_{v ∈ V, prev = 1} (1 - v) + Σ_{v ∈ V, prev = 0} v ≥ 1`.
//! The lineup axis counts only dropped starters and asks for `min_diff`.
//! When nothing on the axis was set (no transfers, no chips) the cut reduces
//! to `Σ v ≥ 1`: the next plan must act where the previous one did not.

use serde::{Deserialize, Serialize};

use crate::config::DiversityAxis;
use crate::domain::Chip;
use crate::encoder::PlanningData;
use crate::mip::{LinExpr, MipModel, SolveOutcome, VarId};

use super::variables::PlanVars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutKind {
    /// Differ on at least one axis variable.
    Exclude,
    /// Previous plan set nothing on the axis; the next one must set something.
    RequireAction,
    /// Replace at least `min_diff` starters.
    LineupDistance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiversityCut {
    pub kind: CutKind,
    pub expr: LinExpr,
    pub rhs: f64,
    /// Axis variables set in the previous solution.
    pub previously_set: usize,
}

impl DiversityCut {
    /// Build the cut for `axis` from a solved outcome. `None` when the axis
    /// has no variables in this model (e.g. target weeks outside the horizon,
    /// or no usable chips).
    pub fn from_outcome(
        axis: &DiversityAxis,
        data: &PlanningData,
        vars: &PlanVars,
        outcome: &SolveOutcome,
    ) -> Option<Self> {
        let axis_vars = axis_variables(axis, data, vars);
        if axis_vars.is_empty() {
            return None;
        }
        let (set, unset): (Vec<VarId>, Vec<VarId>) =
            axis_vars.into_iter().partition(|&v| outcome.is_set(v));

        let cut = if let DiversityAxis::Lineup { min_diff } = axis {
            // Σ_{prev = 1} (1 - v) ≥ min_diff
            let mut expr = LinExpr::weighted(set.iter().map(|&v| (v, -1.0)));
            expr.add_constant(set.len() as f64);
            Self {
                kind: CutKind::LineupDistance,
                expr,
                rhs: f64::from(*min_diff),
                previously_set: set.len(),
            }
        } else if set.is_empty() {
            Self {
                kind: CutKind::RequireAction,
                expr: LinExpr::sum(unset),
                rhs: 1.0,
                previously_set: 0,
            }
        } else {
            let mut expr = LinExpr::sum(unset);
            for &v in &set {
                expr.add_term(v, -1.0);
            }
            expr.add_constant(set.len() as f64);
            Self {
                kind: CutKind::Exclude,
                expr,
                rhs: 1.0,
                previously_set: set.len(),
            }
        };

        tracing::info!(
            event = "diversity_cut",
            kind = ?cut.kind,
            previously_set = cut.previously_set,
            terms = cut.expr.terms.len(),
            rhs = cut.rhs
        );
        Some(cut)
    }

    pub fn apply(&self, model: &mut MipModel) {
        model.ge("diversity_cut", self.expr.clone(), self.rhs);
    }
}

/// Variables whose joint assignment must change between plans.
pub fn axis_variables(axis: &DiversityAxis, data: &PlanningData, vars: &PlanVars) -> Vec<VarId> {
    let players = 0..data.players.len();
    let buys = |t: usize| players.clone().map(move |p| vars.transfer_in[t][p]);
    let sells = |t: usize| {
        players.clone().flat_map(move |p| {
            std::iter::once(vars.out_regular[t][p]).chain(vars.out_first[t][p])
        })
    };

    match axis {
        DiversityAxis::Buy => buys(0).collect(),
        DiversityAxis::Sell => sells(0).collect(),
        DiversityAxis::BuyOrSell => buys(0).chain(sells(0)).collect(),
        DiversityAxis::Chips => (0..data.horizon())
            .flat_map(|t| Chip::ALL.into_iter().filter_map(move |c| vars.chip_var(c, t)))
            .collect(),
        DiversityAxis::Lineup { .. } => vars.lineup[0].clone(),
        DiversityAxis::TargetWeeks { gameweeks } => gameweeks
            .iter()
            .filter_map(|gw| data.week_of(*gw))
            .flat_map(|t| buys(t).chain(sells(t)).collect::<Vec<_>>())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::SolveStatus;

    fn outcome(values: Vec<f64>) -> SolveOutcome {
        SolveOutcome {
            status: SolveStatus::Optimal,
            objective: 0.0,
            values,
        }
    }

    #[test]
    fn exclude_cut_rejects_previous_assignment() {
        let mut model = MipModel::new();
        let xs: Vec<VarId> = (0..3).map(|i| model.binary(format!("x{i}"))).collect();
        let prev = outcome(vec![1.0, 0.0, 1.0]);
        let (set, unset): (Vec<VarId>, Vec<VarId>) =
            xs.iter().copied().partition(|&v| prev.is_set(v));
        let mut expr = LinExpr::sum(unset);
        for &v in &set {
            expr.add_term(v, -1.0);
        }
        expr.add_constant(set.len() as f64);
        let cut = DiversityCut {
            kind: CutKind::Exclude,
            expr,
            rhs: 1.0,
            previously_set: 2,
        };
        cut.apply(&mut model);

        assert!(!model.violations(&prev.values, 1e-9).is_empty());
        assert!(model.violations(&[1.0, 1.0, 1.0], 1e-9).is_empty());
        assert!(model.violations(&[0.0, 0.0, 1.0], 1e-9).is_empty());
    }

    #[test]
    fn require_action_needs_one_variable_set() {
        let mut model = MipModel::new();
        let xs: Vec<VarId> = (0..2).map(|i| model.binary(format!("x{i}"))).collect();
        let cut = DiversityCut {
            kind: CutKind::RequireAction,
            expr: LinExpr::sum(xs),
            rhs: 1.0,
            previously_set: 0,
        };
        cut.apply(&mut model);
        assert_eq!(model.violations(&[0.0, 0.0], 1e-9).len(), 1);
        assert!(model.violations(&[0.0, 1.0], 1e-9).is_empty());
    }
}
