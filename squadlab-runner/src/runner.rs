//! Single-run orchestration.
//!
//! Two entry points:
//! - `run_single_plan()`: loads the files named by a [`RunConfig`], then plans. Used by the CLI.
//! - `run_plan_from_data()`: takes an already loaded table and state. Used by sweeps.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use squadlab_core::domain::{ConfigHash, RunId, SquadState};
use squadlab_core::planner::{plan, PlanSet};
use squadlab_core::projection::ProjectionTable;
use squadlab_core::{ConfigError, PlanError, PlannerConfig};

use crate::config::RunConfig;
use crate::data_loader::{load_run_data, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    /// Human-readable scenario name; "base" for a plain run.
    pub label: String,
    pub config_hash: ConfigHash,
    pub config: PlannerConfig,
    pub created_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub plan_set: PlanSet,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl PlanResult {
    /// Score of the best plan, or negative infinity when none was produced.
    pub fn best_score(&self) -> f64 {
        self.plan_set
            .best()
            .map_or(f64::NEG_INFINITY, |p| p.score)
    }
}

/// Load data from disk and plan.
pub fn run_single_plan(config: &RunConfig) -> Result<PlanResult, RunError> {
    config.validate()?;
    let data = load_run_data(config)?;
    let result = run_plan_from_data(
        &data.table,
        &data.state,
        &config.planner,
        config.run_id(),
        "base",
    )?;
    Ok(result)
}

/// Plan against pre-loaded data.
pub fn run_plan_from_data(
    table: &ProjectionTable,
    state: &SquadState,
    planner: &PlannerConfig,
    run_id: RunId,
    label: &str,
) -> Result<PlanResult, PlanError> {
    let started = Instant::now();
    let span = tracing::info_span!("plan_run", run = run_id.short(), label);
    let _guard = span.enter();

    let plan_set = plan(table, state, planner)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        event = "run_complete",
        plans = plan_set.plans.len(),
        shortfall = plan_set.shortfall.is_some(),
        elapsed_ms,
    );

    Ok(PlanResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        label: label.to_string(),
        config_hash: planner.config_hash(),
        config: planner.clone(),
        created_at: Utc::now(),
        elapsed_ms,
        plan_set,
    })
}
