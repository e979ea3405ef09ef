//! Criterion benchmarks for model construction.
//!
//! Benchmarks:
//! 1. Encoder over a season-sized projection table
//! 2. Model build across horizons, with and without chips
//! 3. Solving a one-week model with the default backend

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use squadlab_core::domain::{Gameweek, OwnedPlayer, PlayerId, Position, SquadState};
use squadlab_core::encoder::encode;
use squadlab_core::mip::solve_with;
use squadlab_core::planner::build;
use squadlab_core::projection::{PlayerProjection, ProjectionTable};
use squadlab_core::PlannerConfig;

const NEXT_GW: Gameweek = 10;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_table(per_position: [u32; 4], weeks: u32) -> ProjectionTable {
    let clubs = [
        "ARS", "AVL", "BOU", "BRE", "BHA", "CHE", "CRY", "EVE", "FUL", "LIV",
        "MCI", "MUN", "NEW", "NFO", "TOT", "WHU", "WOL", "BUR", "LEE", "SUN",
    ];
    let mut players = Vec::new();
    let mut id = 1u32;
    for (pos, n) in Position::ALL.into_iter().zip(per_position) {
        for k in 0..n {
            let base = 2.0 + (f64::from(id * 37 % 29) / 4.0);
            players.push(PlayerProjection {
                id: PlayerId(id),
                name: format!("P{id}"),
                position: pos,
                club: clubs[id as usize % clubs.len()].to_string(),
                price: 40.0 + f64::from(k % 12) * 5.0,
                points: (0..weeks)
                    .map(|w| (NEXT_GW + w, base + 0.3 * f64::from((id + w) % 5)))
                    .collect(),
                minutes: (0..weeks).map(|w| (NEXT_GW + w, 90.0)).collect(),
            });
            id += 1;
        }
    }
    ProjectionTable::new(players)
}

/// First two keepers, five defenders, five midfielders and three forwards.
fn owned_state(table: &ProjectionTable) -> SquadState {
    let mut owned = Vec::new();
    for pos in Position::ALL {
        owned.extend(
            table
                .players()
                .iter()
                .filter(|p| p.position == pos)
                .take(pos.squad_quota())
                .map(|p| OwnedPlayer {
                    id: p.id,
                    purchase_price: p.price,
                    selling_price: p.price,
                }),
        );
    }
    SquadState {
        owned,
        bank: 20.0,
        free_transfers: 1,
        ..SquadState::preseason(1000.0)
    }
}

fn config(horizon: u32, chips: bool) -> PlannerConfig {
    let mut config = PlannerConfig {
        horizon,
        next_gw: Some(NEXT_GW),
        ..PlannerConfig::default()
    };
    config.roster.team_limit = 15;
    if chips {
        config.chips.wildcard.cap = 1;
        config.chips.free_hit.cap = 1;
        config.chips.bench_boost.cap = 1;
        config.chips.triple_captain.cap = 1;
    }
    config
}

// ── 1. Encoder ───────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let table = make_table([60, 200, 250, 90], 8);
    let state = owned_state(&table);
    let config = config(8, true);
    c.bench_function("encode_600_players_8_weeks", |b| {
        b.iter(|| encode(black_box(&table), black_box(&state), black_box(&config)))
    });
}

// ── 2. Model build ───────────────────────────────────────────────────

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_build");
    let table = make_table([20, 60, 60, 30], 8);
    let state = owned_state(&table);
    for horizon in [1u32, 3, 5, 8] {
        for chips in [false, true] {
            let config = config(horizon, chips);
            let Ok(data) = encode(&table, &state, &config) else {
                continue;
            };
            let label = if chips { "chips" } else { "plain" };
            group.bench_with_input(BenchmarkId::new(label, horizon), &data, |b, data| {
                b.iter(|| build(black_box(data), black_box(&config)))
            });
        }
    }
    group.finish();
}

// ── 3. Solve ─────────────────────────────────────────────────────────

fn bench_solve(c: &mut Criterion) {
    let table = make_table([3, 7, 7, 5], 1);
    let state = owned_state(&table);
    let config = config(1, false);
    let Ok(data) = encode(&table, &state, &config) else {
        return;
    };
    let Ok(pm) = build(&data, &config) else {
        return;
    };
    let mut group = c.benchmark_group("solve");
    group.sample_size(10);
    group.bench_function("one_week_22_players", |b| {
        b.iter(|| solve_with(black_box(&pm.model), black_box(&config.solver)))
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_build, bench_solve);
criterion_main!(benches);
