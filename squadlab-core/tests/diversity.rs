//! Multiple plans via no-good cuts, and plan round trips.

mod common;

use std::collections::BTreeSet;

use common::*;
use squadlab_core::config::DiversityAxis;
use squadlab_core::domain::{PlayerId, SquadState};
use squadlab_core::encoder::encode;
use squadlab_core::mip::solve_with;
use squadlab_core::planner::{build, fix_plan, plan};

#[test]
fn buy_axis_yields_pairwise_distinct_buys() {
    let mut cfg = config(1);
    cfg.diversity.solutions = 3;
    cfg.diversity.axis = DiversityAxis::Buy;
    let set = plan(&pool(1), &owned_state(), &cfg).unwrap();

    assert!(set.plans.len() == 3 || set.shortfall.is_some());
    let buy_sets: Vec<BTreeSet<PlayerId>> = set
        .plans
        .iter()
        .map(|p| p.buys_at(NEXT_GW).into_iter().collect())
        .collect();
    for i in 0..buy_sets.len() {
        for j in (i + 1)..buy_sets.len() {
            assert_ne!(buy_sets[i], buy_sets[j], "plans {i} and {j} buy the same");
        }
    }
    for pair in set.plans.windows(2) {
        assert!(pair[0].score >= pair[1].score - 1e-6);
    }
    for (i, p) in set.plans.iter().enumerate() {
        assert_eq!(p.index, i);
    }
}

#[test]
fn idle_first_plan_forces_action_next() {
    // Rolling is worth far more than any swap, so plan 0 makes no transfer.
    let mut cfg = config(1);
    cfg.scoring.ft_value = 20.0;
    cfg.diversity.solutions = 2;
    cfg.diversity.axis = DiversityAxis::BuyOrSell;
    let set = plan(&pool(1), &owned_state(), &cfg).unwrap();

    assert_eq!(set.plans.len(), 2);
    assert_eq!(set.plans[0].weeks[0].transfers, 0);
    assert!(set.plans[1].weeks[0].transfers >= 1);
}

#[test]
fn lineup_axis_changes_starters() {
    let mut cfg = config(1);
    cfg.diversity.solutions = 2;
    cfg.diversity.axis = DiversityAxis::Lineup { min_diff: 2 };
    let set = plan(&pool(1), &owned_state(), &cfg).unwrap();
    assert_eq!(set.plans.len(), 2);

    let first: BTreeSet<_> = set.plans[0].lineup_at(NEXT_GW).into_iter().collect();
    let second: BTreeSet<_> = set.plans[1].lineup_at(NEXT_GW).into_iter().collect();
    assert!(first.difference(&second).count() >= 2);
}

#[test]
fn chip_axis_without_usable_chips_reports_shortfall() {
    let mut cfg = config(1);
    cfg.diversity.solutions = 2;
    cfg.diversity.axis = DiversityAxis::Chips;
    let set = plan(&pool(1), &owned_state(), &cfg).unwrap();

    assert_eq!(set.plans.len(), 1);
    let shortfall = set.shortfall.expect("explicit shortfall");
    assert_eq!(shortfall.requested, 2);
    assert_eq!(shortfall.produced, 1);
    assert!(!shortfall.reason.is_empty());
}

#[test]
fn exhausted_axis_reports_shortfall() {
    // Only two chip weeks exist for one bench boost, plus "no chip".
    let mut cfg = config(2);
    cfg.chips.bench_boost.cap = 1;
    cfg.diversity.solutions = 5;
    cfg.diversity.axis = DiversityAxis::Chips;
    let set = plan(&pool(2), &owned_state(), &cfg).unwrap();

    assert_eq!(set.plans.len(), 3);
    let shortfall = set.shortfall.expect("explicit shortfall");
    assert_eq!(shortfall.produced, 3);
}

#[test]
fn fixed_plan_reproduces_its_score() {
    let table = pool_with(2, |id, _, xp| if id == 21 { 10.0 } else { xp });
    let cfg = config(2);
    let state = owned_state();
    let set = plan(&table, &state, &cfg).unwrap();
    let original = set.best().unwrap();

    let data = encode(&table, &state, &cfg).unwrap();
    let mut pm = build(&data, &cfg).unwrap();
    fix_plan(&mut pm, &data, original).unwrap();
    let outcome = solve_with(&pm.model, &cfg.solver).unwrap();
    assert!((outcome.objective - original.score).abs() < 1e-6);
}

#[test]
fn fixed_preseason_plan_reproduces_its_score() {
    let table = pool(1);
    let state = SquadState::preseason(1000.0);
    let cfg = config(1);
    let set = plan(&table, &state, &cfg).unwrap();
    let original = set.best().unwrap();

    let data = encode(&table, &state, &cfg).unwrap();
    let mut pm = build(&data, &cfg).unwrap();
    fix_plan(&mut pm, &data, original).unwrap();
    let outcome = solve_with(&pm.model, &cfg.solver).unwrap();
    assert!((outcome.objective - original.score).abs() < 1e-6);
}

#[test]
fn fixing_a_plan_on_another_horizon_fails() {
    let state = owned_state();
    let set = plan(&pool(2), &state, &config(1)).unwrap();
    let data = encode(&pool(2), &state, &config(2)).unwrap();
    let mut pm = build(&data, &config(2)).unwrap();
    assert!(fix_plan(&mut pm, &data, set.best().unwrap()).is_err());
}
