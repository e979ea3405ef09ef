//! SquadLab Core: multi-period fantasy squad planning engine.
//!
//! This crate contains the heart of the planner:
//! - Domain types (players, positions, chips, current squad state)
//! - Projection table and CSV ingest
//! - Immutable planner configuration
//! - Roster/eligibility encoder (index sets, static attributes, pruning)
//! - Backend-neutral MIP model and the solver port with `good_lp` adapters
//! - Model builder: squad, lineup, transfer, budget, free-transfer and chip constraints
//! - Objective composer, solution extraction and diversity cuts

pub mod config;
pub mod domain;
pub mod encoder;
pub mod error;
pub mod mip;
pub mod planner;
pub mod projection;
pub mod rng;
pub mod transitions;

pub use config::{ConfigError, PlannerConfig};
pub use error::PlanError;
pub use planner::{plan, plan_with, Plan, PlanSet};
