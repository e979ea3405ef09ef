//! Failures reported before any model is solved, and solver-side failures.

mod common;

use common::*;
use squadlab_core::config::{BookedTransfer, PricePoint};
use squadlab_core::domain::{Chip, PlayerId, Position};
use squadlab_core::error::MissingData;
use squadlab_core::mip::{
    MicroLpSolver, MipModel, MipSolver, SolveError, SolveLimit, SolveOutcome, SolveStatus,
    SolverSettings,
};
use squadlab_core::planner::{plan, plan_with};
use squadlab_core::PlanError;

#[test]
fn missing_gameweek_column_is_data_unavailable() {
    let err = plan(&pool(1), &owned_state(), &config(2)).unwrap_err();
    match err {
        PlanError::DataUnavailable(MissingData::Column { gameweek, .. }) => {
            assert_eq!(gameweek, NEXT_GW + 1)
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn owned_player_missing_from_table_is_data_unavailable() {
    let mut state = owned_state();
    state.owned[0].id = PlayerId(999);
    let err = plan(&pool(1), &state, &config(1)).unwrap_err();
    assert!(matches!(
        err,
        PlanError::DataUnavailable(MissingData::Player { player: PlayerId(999), .. })
    ));
    assert!(err.is_pre_solve());
}

#[test]
fn blank_projection_of_locked_player_is_data_unavailable() {
    let table = pool(2);
    let players = table
        .players()
        .iter()
        .cloned()
        .map(|mut p| {
            if p.id == PlayerId(17) {
                p.minutes.remove(&(NEXT_GW + 1));
            }
            p
        })
        .collect();
    let table = squadlab_core::projection::ProjectionTable::new(players);
    assert!(table.has_minutes_column(NEXT_GW + 1));

    let mut cfg = config(2);
    cfg.roster.locked = vec![PlayerId(17)];
    let err = plan(&table, &owned_state(), &cfg).unwrap_err();
    match err {
        PlanError::DataUnavailable(MissingData::Cell {
            player,
            role,
            gameweek,
            column,
        }) => {
            assert_eq!(player, PlayerId(17));
            assert_eq!(role, "locked");
            assert_eq!(gameweek, NEXT_GW + 1);
            assert_eq!(column, "minutes");
        }
        other => panic!("unexpected {other:?}"),
    }

    // Unlocked, the same gap only drops the player from the pool.
    let set = plan(&table, &owned_state(), &config(2)).unwrap();
    assert!(set.pruned.contains(&PlayerId(17)));
    let best = set.best().unwrap();
    assert!(best.picks.iter().all(|r| r.id != PlayerId(17)));
}

#[test]
fn banned_and_locked_player_conflicts() {
    let mut cfg = config(1);
    cfg.roster.banned = vec![PlayerId(5)];
    cfg.roster.locked = vec![PlayerId(5)];
    let err = plan(&pool(1), &owned_state(), &cfg).unwrap_err();
    assert!(matches!(err, PlanError::ConfigurationConflict(_)));
    assert!(err.is_pre_solve());
}

#[test]
fn booked_transfer_in_frozen_week_conflicts() {
    let mut cfg = config(1);
    cfg.transfers.no_transfer_gws = vec![NEXT_GW];
    cfg.transfers.booked = vec![BookedTransfer {
        gw: NEXT_GW,
        buy: Some(PlayerId(21)),
        sell: None,
    }];
    let err = plan(&pool(1), &owned_state(), &cfg).unwrap_err();
    assert!(matches!(err, PlanError::ConfigurationConflict(_)));
}

#[test]
fn forcing_an_unavailable_chip_conflicts() {
    let mut state = owned_state();
    state.available_chips = vec![Chip::BenchBoost];
    let mut cfg = config(1);
    cfg.chips.wildcard.forced_gws = vec![NEXT_GW];
    let err = plan(&pool(1), &state, &cfg).unwrap_err();
    assert!(matches!(err, PlanError::ConfigurationConflict(_)));
}

#[test]
fn unmatched_price_point_conflicts() {
    let mut cfg = config(1);
    cfg.roster.price_points = vec![PricePoint {
        position: Position::Forward,
        price: 45.0,
        count: 1,
    }];
    let err = plan(&pool(1), &owned_state(), &cfg).unwrap_err();
    assert!(matches!(err, PlanError::ConfigurationConflict(_)));
}

#[test]
fn invalid_config_is_reported() {
    let mut cfg = config(1);
    cfg.diversity.solutions = 0;
    let err = plan(&pool(1), &owned_state(), &cfg).unwrap_err();
    assert!(matches!(err, PlanError::Config(_)));
}

#[test]
fn unreachable_budget_is_infeasible() {
    let mut state = squadlab_core::domain::SquadState::preseason(100.0);
    state.free_transfers = 1;
    let err = plan(&pool(1), &state, &config(1)).unwrap_err();
    assert!(matches!(err, PlanError::InfeasibleModel { .. }), "{err:?}");
    assert!(!err.is_pre_solve());
}

/// Solves to optimality but reports the stop as gap-limited.
struct GapLimited;

impl MipSolver for GapLimited {
    fn name(&self) -> &'static str {
        "gap-limited"
    }

    fn solve(&self, model: &MipModel, settings: &SolverSettings) -> Result<SolveOutcome, SolveError> {
        let mut outcome = MicroLpSolver.solve(model, settings)?;
        outcome.status = SolveStatus::Feasible {
            limit: SolveLimit::Gap,
            gap: Some(0.05),
        };
        Ok(outcome)
    }
}

#[test]
fn gap_limited_incumbent_fails_when_optimality_is_required() {
    let mut cfg = config(1);
    cfg.solver.mip_gap = 0.05;
    cfg.solver.require_optimal = true;
    let err = plan_with(&GapLimited, &pool(1), &owned_state(), &cfg).unwrap_err();
    assert!(!err.is_pre_solve());
    match err {
        PlanError::SolverTimeout { status } => {
            assert!(!status.is_optimal());
            assert_eq!(status.gap(), Some(0.05));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn gap_limited_incumbent_is_kept_with_its_status() {
    let mut cfg = config(1);
    cfg.solver.mip_gap = 0.05;
    let set = plan_with(&GapLimited, &pool(1), &owned_state(), &cfg).unwrap();
    let best = set.best().unwrap();
    assert_eq!(
        best.status,
        SolveStatus::Feasible {
            limit: SolveLimit::Gap,
            gap: Some(0.05)
        }
    );
    assert!(best.summary.contains("gap limit"));
}

#[cfg(not(feature = "highs"))]
#[test]
fn highs_backend_without_feature_is_a_solver_error() {
    let mut cfg = config(1);
    cfg.solver.backend = squadlab_core::mip::SolverBackend::Highs;
    let err = plan(&pool(1), &owned_state(), &cfg).unwrap_err();
    assert!(matches!(err, PlanError::Solver(_)));
}
