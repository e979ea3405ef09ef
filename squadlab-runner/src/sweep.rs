//! Scenario sweeps: chip-timing combinations and noise-perturbed repeats.
//!
//! Every scenario is an independent planning run with its own model, so the
//! sweep fans out over a rayon pool. Noise seeds come from the RNG hierarchy,
//! which keeps each scenario's projections fixed regardless of scheduling.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use squadlab_core::domain::{Chip, Gameweek, RunId, SquadState};
use squadlab_core::projection::ProjectionTable;
use squadlab_core::rng::RngHierarchy;
use squadlab_core::PlannerConfig;

use crate::config::{ChipOption, SweepConfig};
use crate::runner::{run_plan_from_data, PlanResult};

const NOISE_SCOPE: &str = "sweep_noise";

/// One point of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    /// Chips forced in this scenario. Listed chips absent here are disabled.
    pub chips: Vec<(Gameweek, Chip)>,
    pub noise_iteration: Option<u64>,
}

/// Cartesian product of chip options, repeated once per noise run.
#[derive(Debug, Clone)]
pub struct ScenarioGrid {
    pub options: Vec<ChipOption>,
    pub noise_runs: u32,
}

impl ScenarioGrid {
    pub fn new(options: Vec<ChipOption>, noise_runs: u32) -> Self {
        Self {
            options,
            noise_runs,
        }
    }

    /// Every assignment of "unused" or one listed week to each chip, with no
    /// two chips in the same week.
    pub fn chip_combinations(&self) -> Vec<Vec<(Gameweek, Chip)>> {
        let mut combos: Vec<Vec<(Gameweek, Chip)>> = vec![Vec::new()];
        for option in &self.options {
            let mut next = Vec::new();
            for combo in &combos {
                next.push(combo.clone());
                for &gw in &option.gws {
                    if combo.iter().any(|&(used, _)| used == gw) {
                        continue;
                    }
                    let mut extended = combo.clone();
                    extended.push((gw, option.chip));
                    next.push(extended);
                }
            }
            combos = next;
        }
        for combo in &mut combos {
            combo.sort();
        }
        combos
    }

    pub fn scenarios(&self) -> Vec<Scenario> {
        let combos = self.chip_combinations();
        let mut out = Vec::with_capacity(combos.len() * self.noise_runs.max(1) as usize);
        for chips in combos {
            let base = chip_label(&chips);
            if self.noise_runs == 0 {
                out.push(Scenario {
                    label: base,
                    chips,
                    noise_iteration: None,
                });
                continue;
            }
            for i in 0..u64::from(self.noise_runs) {
                out.push(Scenario {
                    label: format!("{base} #{i}"),
                    chips: chips.clone(),
                    noise_iteration: Some(i),
                });
            }
        }
        out
    }

    pub fn size(&self) -> usize {
        self.chip_combinations().len() * self.noise_runs.max(1) as usize
    }
}

fn chip_label(chips: &[(Gameweek, Chip)]) -> String {
    if chips.is_empty() {
        return "no chips".to_string();
    }
    chips
        .iter()
        .map(|(gw, chip)| format!("{chip}@{gw}"))
        .collect::<Vec<_>>()
        .join("+")
}

/// Planner configuration for one scenario.
pub fn apply_scenario(
    base: &PlannerConfig,
    sweep: &SweepConfig,
    run_id: &RunId,
    scenario: &Scenario,
) -> PlannerConfig {
    let mut config = base.clone();
    for option in &sweep.chip_options {
        let rule = config.chips.rule_mut(option.chip);
        match scenario.chips.iter().find(|(_, c)| *c == option.chip) {
            Some(&(gw, _)) => {
                rule.cap = rule.cap.max(1);
                rule.allowed_gws = vec![gw];
                rule.forced_gws = vec![gw];
            }
            None => {
                rule.cap = 0;
                rule.forced_gws.clear();
            }
        }
    }
    if let Some(iteration) = scenario.noise_iteration {
        let seed = RngHierarchy::new(sweep.master_seed).sub_seed(run_id, NOISE_SCOPE, iteration);
        config.randomization.enabled = true;
        config.randomization.magnitude = sweep.noise_magnitude;
        config.randomization.seed = Some(seed);
    }
    config
}

/// Drop chip options the squad cannot play and weeks outside the horizon.
pub fn usable_options(
    options: &[ChipOption],
    table: &ProjectionTable,
    state: &SquadState,
    planner: &PlannerConfig,
) -> Vec<ChipOption> {
    let Some(next_gw) = planner.next_gw.or_else(|| table.first_gameweek()) else {
        return Vec::new();
    };
    let horizon = planner.horizon_gameweeks(next_gw);
    options
        .iter()
        .filter_map(|option| {
            if !state.chip_available(option.chip) {
                tracing::warn!(event = "chip_option_skipped", chip = %option.chip, reason = "unavailable");
                return None;
            }
            let gws: Vec<Gameweek> = option
                .gws
                .iter()
                .copied()
                .filter(|gw| horizon.contains(gw))
                .collect();
            if gws.is_empty() {
                tracing::warn!(event = "chip_option_skipped", chip = %option.chip, reason = "outside horizon");
                return None;
            }
            Some(ChipOption {
                chip: option.chip,
                gws,
            })
        })
        .collect()
}

/// A scenario that produced no plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFailure {
    pub label: String,
    pub error: String,
}

/// Sweep results sorted by best plan score, highest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResults {
    pub results: Vec<PlanResult>,
    pub failures: Vec<SweepFailure>,
}

impl SweepResults {
    fn new(mut results: Vec<PlanResult>, failures: Vec<SweepFailure>) -> Self {
        results.sort_by(|a, b| b.best_score().total_cmp(&a.best_score()));
        Self { results, failures }
    }

    pub fn best(&self) -> Option<&PlanResult> {
        self.results.first()
    }

    pub fn top_n(&self, n: usize) -> &[PlanResult] {
        &self.results[..n.min(self.results.len())]
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Number of worker threads: available cores minus the reserve, at least one.
pub fn worker_threads(reserve_cores: usize) -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(reserve_cores)
        .max(1)
}

/// Run every scenario of the sweep against one table and state.
pub fn run_sweep(
    table: &ProjectionTable,
    state: &SquadState,
    planner: &PlannerConfig,
    sweep: &SweepConfig,
    run_id: &RunId,
) -> Result<SweepResults> {
    let sweep = SweepConfig {
        chip_options: usable_options(&sweep.chip_options, table, state, planner),
        ..sweep.clone()
    };
    let grid = ScenarioGrid::new(sweep.chip_options.clone(), sweep.noise_runs);
    let scenarios = grid.scenarios();
    let threads = worker_threads(sweep.reserve_cores);
    tracing::info!(
        event = "sweep_start",
        scenarios = scenarios.len(),
        threads,
        run = run_id.short(),
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("failed to build sweep thread pool")?;

    let outcomes: Vec<(String, Result<PlanResult, String>)> = pool.install(|| {
        scenarios
            .par_iter()
            .map(|scenario| {
                let config = apply_scenario(planner, &sweep, run_id, scenario);
                let outcome =
                    run_plan_from_data(table, state, &config, run_id.clone(), &scenario.label)
                        .map_err(|e| e.to_string());
                (scenario.label.clone(), outcome)
            })
            .collect()
    });

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (label, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(error) => {
                tracing::warn!(event = "scenario_failed", label = %label, error = %error);
                failures.push(SweepFailure { label, error });
            }
        }
    }
    tracing::info!(
        event = "sweep_end",
        succeeded = results.len(),
        failed = failures.len(),
    );
    Ok(SweepResults::new(results, failures))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<ChipOption> {
        vec![
            ChipOption {
                chip: Chip::Wildcard,
                gws: vec![11, 12],
            },
            ChipOption {
                chip: Chip::BenchBoost,
                gws: vec![12],
            },
        ]
    }

    #[test]
    fn combinations_skip_shared_weeks() {
        let grid = ScenarioGrid::new(options(), 0);
        let combos = grid.chip_combinations();
        // {}, {WC11}, {WC12}, {BB12}, {WC11, BB12}
        assert_eq!(combos.len(), 5);
        assert!(combos.contains(&vec![(11, Chip::Wildcard), (12, Chip::BenchBoost)]));
        assert!(!combos.contains(&vec![(12, Chip::Wildcard), (12, Chip::BenchBoost)]));
    }

    #[test]
    fn noise_runs_multiply_scenarios() {
        let grid = ScenarioGrid::new(options(), 3);
        let scenarios = grid.scenarios();
        assert_eq!(scenarios.len(), 15);
        assert_eq!(grid.size(), 15);
        assert!(scenarios.iter().all(|s| s.noise_iteration.is_some()));
        assert_eq!(scenarios[0].label, "no chips #0");
    }

    #[test]
    fn scenario_forces_listed_chip_and_disables_others() {
        let sweep = SweepConfig {
            chip_options: options(),
            ..SweepConfig::default()
        };
        let scenario = Scenario {
            label: "WC@11".into(),
            chips: vec![(11, Chip::Wildcard)],
            noise_iteration: None,
        };
        let mut base = PlannerConfig::default();
        base.chips.bench_boost.cap = 1;
        let config = apply_scenario(&base, &sweep, &RunId::from_bytes(b"t"), &scenario);

        assert_eq!(config.chips.wildcard.forced_gws, vec![11]);
        assert_eq!(config.chips.wildcard.cap, 1);
        assert_eq!(config.chips.bench_boost.cap, 0);
        assert!(!config.randomization.enabled);
    }

    #[test]
    fn noise_seeds_depend_only_on_iteration() {
        let sweep = SweepConfig {
            noise_runs: 2,
            ..SweepConfig::default()
        };
        let run = RunId::from_bytes(b"t");
        let scenario = |i| Scenario {
            label: String::new(),
            chips: Vec::new(),
            noise_iteration: Some(i),
        };
        let base = PlannerConfig::default();
        let a = apply_scenario(&base, &sweep, &run, &scenario(0));
        let b = apply_scenario(&base, &sweep, &run, &scenario(1));
        let a2 = apply_scenario(&base, &sweep, &run, &scenario(0));

        assert!(a.randomization.enabled);
        assert_eq!(a.randomization.seed, a2.randomization.seed);
        assert_ne!(a.randomization.seed, b.randomization.seed);
    }

    #[test]
    fn worker_threads_never_zero() {
        assert!(worker_threads(usize::MAX) >= 1);
    }

    proptest::proptest! {
        #[test]
        fn combinations_never_double_book_a_week(
            wc in proptest::collection::vec(10u32..14, 0..3),
            fh in proptest::collection::vec(10u32..14, 0..3),
            bb in proptest::collection::vec(10u32..14, 0..3),
        ) {
            let dedup = |mut v: Vec<u32>| { v.sort(); v.dedup(); v };
            let grid = ScenarioGrid::new(
                vec![
                    ChipOption { chip: Chip::Wildcard, gws: dedup(wc) },
                    ChipOption { chip: Chip::FreeHit, gws: dedup(fh) },
                    ChipOption { chip: Chip::BenchBoost, gws: dedup(bb) },
                ],
                0,
            );
            let combos = grid.chip_combinations();
            proptest::prop_assert!(combos.contains(&Vec::new()));
            for combo in &combos {
                let mut weeks: Vec<_> = combo.iter().map(|(gw, _)| *gw).collect();
                weeks.dedup();
                proptest::prop_assert_eq!(weeks.len(), combo.len());
                let mut chips: Vec<_> = combo.iter().map(|(_, c)| *c).collect();
                chips.sort();
                chips.dedup();
                proptest::prop_assert_eq!(chips.len(), combo.len());
            }
            let mut unique = combos.clone();
            unique.sort();
            unique.dedup();
            proptest::prop_assert_eq!(unique.len(), combos.len());
        }
    }
}
