//! Multi-period squad planner: model builder, objective, extraction,
//! diversification and the plan loop.

pub mod builder;
pub mod diversify;
pub mod extract;
pub mod objective;
pub mod run;
pub mod variables;

pub use builder::{build, fix_plan, Penalty, PlanModel};
pub use diversify::{CutKind, DiversityCut};
pub use extract::{extract, DecayScore, PickRow, Plan, WeekStats};
pub use run::{audit, plan, plan_with, PlanSet, Shortfall};
pub use variables::PlanVars;
