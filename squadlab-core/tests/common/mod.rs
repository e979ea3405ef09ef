//! Shared fixtures: a 22-player pool over eight clubs and a legal owned squad.
#![allow(dead_code)]

use squadlab_core::domain::{Gameweek, OwnedPlayer, PlayerId, Position, SquadState};
use squadlab_core::planner::Plan;
use squadlab_core::projection::{PlayerProjection, ProjectionTable};
use squadlab_core::PlannerConfig;

pub const NEXT_GW: Gameweek = 10;

const CLUBS: [&str; 8] = ["ARS", "BOU", "CHE", "EVE", "FUL", "LIV", "MCI", "NEW"];

/// (id, position, price, base xp)
const POOL: [(u32, Position, f64, f64); 22] = [
    (1, Position::Goalkeeper, 45.0, 4.0),
    (2, Position::Goalkeeper, 40.0, 3.0),
    (3, Position::Goalkeeper, 50.0, 4.5),
    (4, Position::Defender, 40.0, 3.0),
    (5, Position::Defender, 45.0, 3.5),
    (6, Position::Defender, 50.0, 4.0),
    (7, Position::Defender, 55.0, 4.5),
    (8, Position::Defender, 45.0, 3.2),
    (9, Position::Defender, 40.0, 2.8),
    (10, Position::Defender, 60.0, 5.0),
    (11, Position::Midfielder, 55.0, 4.5),
    (12, Position::Midfielder, 60.0, 5.0),
    (13, Position::Midfielder, 65.0, 5.5),
    (14, Position::Midfielder, 70.0, 6.0),
    (15, Position::Midfielder, 50.0, 4.0),
    (16, Position::Midfielder, 75.0, 6.5),
    (17, Position::Midfielder, 80.0, 7.0),
    (18, Position::Forward, 60.0, 5.0),
    (19, Position::Forward, 65.0, 5.5),
    (20, Position::Forward, 70.0, 6.0),
    (21, Position::Forward, 75.0, 6.5),
    (22, Position::Forward, 55.0, 4.5),
];

/// Owned squad: 2 G, 5 D, 5 M, 3 F costing 785, at most three per club.
pub const OWNED: [u32; 15] = [1, 2, 4, 5, 6, 8, 9, 11, 12, 13, 14, 15, 18, 19, 22];

pub fn club_of(id: u32) -> &'static str {
    CLUBS[id as usize % CLUBS.len()]
}

pub fn price_of(id: u32) -> f64 {
    POOL.iter().find(|p| p.0 == id).map_or(0.0, |p| p.2)
}

pub fn projection(id: u32, position: Position, price: f64, xp: &[f64]) -> PlayerProjection {
    let gws = (NEXT_GW..).take(xp.len());
    PlayerProjection {
        id: PlayerId(id),
        name: format!("Player{id}"),
        position,
        club: club_of(id).to_string(),
        price,
        points: gws.clone().zip(xp.iter().copied()).collect(),
        minutes: gws.map(|gw| (gw, 90.0)).collect(),
    }
}

/// Pool with `weeks` projected gameweeks starting at [`NEXT_GW`]. Later weeks
/// drift slightly so ties between weeks are rare.
pub fn pool(weeks: u32) -> ProjectionTable {
    pool_with(weeks, |_, _, xp| xp)
}

/// Pool with per-player, per-week points rewritten by `f(id, week_offset, xp)`.
pub fn pool_with(weeks: u32, f: impl Fn(u32, u32, f64) -> f64) -> ProjectionTable {
    let players = POOL
        .iter()
        .map(|&(id, pos, price, base)| {
            let xp: Vec<f64> = (0..weeks)
                .map(|w| f(id, w, base + 0.1 * f64::from(w) * f64::from(id % 3)))
                .collect();
            projection(id, pos, price, &xp)
        })
        .collect();
    ProjectionTable::new(players)
}

pub fn owned_state() -> SquadState {
    SquadState {
        owned: OWNED
            .iter()
            .map(|&id| OwnedPlayer {
                id: PlayerId(id),
                purchase_price: price_of(id),
                selling_price: price_of(id),
            })
            .collect(),
        bank: 50.0,
        free_transfers: 1,
        ..SquadState::preseason(1000.0)
    }
}

pub fn config(horizon: u32) -> PlannerConfig {
    PlannerConfig {
        horizon,
        next_gw: Some(NEXT_GW),
        ..PlannerConfig::default()
    }
}

pub fn ids(raw: &[u32]) -> Vec<PlayerId> {
    raw.iter().map(|&i| PlayerId(i)).collect()
}

/// Structural checks every solved week must pass.
pub fn assert_week_is_legal(plan: &Plan, gw: Gameweek, table: &ProjectionTable) {
    let rows: Vec<_> = plan.picks_for(gw).collect();
    let week = plan.week(gw).expect("week stats");
    let bench_boost = week.chip == Some(squadlab_core::domain::Chip::BenchBoost);
    let free_hit = week.chip == Some(squadlab_core::domain::Chip::FreeHit);

    let squad: Vec<_> = rows.iter().filter(|r| r.squad).collect();
    assert_eq!(squad.len(), 15, "GW{gw} squad size");
    for pos in Position::ALL {
        let n = squad.iter().filter(|r| r.position == pos).count();
        assert_eq!(n, pos.squad_quota(), "GW{gw} {pos} count");
    }
    let mut per_club = std::collections::BTreeMap::new();
    for r in &squad {
        *per_club.entry(r.club.as_str()).or_insert(0) += 1;
    }
    assert!(per_club.values().all(|&n| n <= 3), "GW{gw} club cap");

    let lineup: Vec<_> = rows.iter().filter(|r| r.lineup).collect();
    assert_eq!(lineup.len(), if bench_boost { 15 } else { 11 }, "GW{gw} lineup size");
    if !bench_boost {
        for pos in Position::ALL {
            let n = lineup.iter().filter(|r| r.position == pos).count();
            let (min, max) = pos.lineup_bounds();
            assert!((min..=max).contains(&n), "GW{gw} formation {pos} = {n}");
        }
        let mut slots: Vec<u8> = rows.iter().filter_map(|r| r.bench).collect();
        slots.sort_unstable();
        assert_eq!(slots, vec![0, 1, 2, 3], "GW{gw} bench slots");
        let keeper = rows.iter().find(|r| r.bench == Some(0)).expect("bench keeper");
        assert_eq!(keeper.position, Position::Goalkeeper);
        assert!(rows.iter().all(|r| !(r.lineup && r.bench.is_some())));
    }
    for r in &lineup {
        let owned = if free_hit { r.squad_fh } else { r.squad };
        assert!(owned, "GW{gw} starter {} not owned", r.id);
    }

    let captains: Vec<_> = rows.iter().filter(|r| r.captain).collect();
    let vices: Vec<_> = rows.iter().filter(|r| r.vicecap).collect();
    assert_eq!(captains.len(), 1, "GW{gw} captain");
    assert_eq!(vices.len(), 1, "GW{gw} vice");
    assert_ne!(captains[0].id, vices[0].id);
    assert!(captains[0].lineup && vices[0].lineup);

    for r in &rows {
        assert!(!(r.transfer_in && r.transfer_out), "GW{gw} {} bought and sold", r.id);
        let expected_xp = table.get(r.id).and_then(|p| p.points_at(gw)).unwrap_or(0.0);
        assert!((r.xp - expected_xp).abs() < 1e-9);
    }
    assert!(week.bank >= -1e-6, "GW{gw} bank negative");
}
