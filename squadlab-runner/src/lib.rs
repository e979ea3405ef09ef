//! SquadLab Runner: plan orchestration, scenario sweeps, history, export.
//!
//! This crate builds on `squadlab-core` to provide:
//! - Run configuration files naming inputs, outputs and planner options
//! - Loading projection, fixture and squad-state files
//! - Single-run orchestration with schema-versioned results
//! - Parallel sweeps over chip timings and noise-perturbed projections
//! - JSONL plan history
//! - CSV, JSON and Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod history;
pub mod runner;
pub mod sweep;

pub use config::{ChipOption, RunConfig, SweepConfig};
pub use data_loader::{load_run_data, LoadError, LoadedData};
pub use export::{
    export_json, export_picks_csv, export_weeks_csv, generate_report, generate_sweep_report,
    import_json, load_artifacts, save_artifacts,
};
pub use history::{HistoryEntry, PlanHistory};
pub use runner::{run_plan_from_data, run_single_plan, PlanResult, RunError, SCHEMA_VERSION};
pub use sweep::{run_sweep, Scenario, ScenarioGrid, SweepFailure, SweepResults};
