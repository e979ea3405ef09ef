//! Plan history: JSONL append-only log of every plan a run produced.
//!
//! One JSON object per line keeps the file resilient to partial writes and
//! lets later runs compare squads, chip timings and scores across weeks.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use squadlab_core::domain::{Chip, Gameweek, PlayerId, RunId};
use squadlab_core::planner::Plan;

use crate::runner::PlanResult;

/// Squad size recorded per entry.
pub const SQUAD_SLOTS: usize = 15;

/// One plan, flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub run_id: RunId,
    pub label: String,
    /// Position of the plan within its run, 0 = best.
    pub iteration: usize,
    pub next_gw: Gameweek,
    /// First planned week each chip is played, if at all.
    pub wildcard: Option<Gameweek>,
    pub free_hit: Option<Gameweek>,
    pub bench_boost: Option<Gameweek>,
    pub triple_captain: Option<Gameweek>,
    /// Squad after next week's transfers, goalkeepers first.
    pub squad: Vec<PlayerId>,
    pub captain: Option<PlayerId>,
    pub vicecap: Option<PlayerId>,
    pub buys: String,
    pub sells: String,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_plan(
        plan: &Plan,
        run_id: &RunId,
        label: &str,
        next_gw: Gameweek,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let chip_week = |chip: Chip| {
            plan.chips()
                .into_iter()
                .find(|&(_, c)| c == chip)
                .map(|(gw, _)| gw)
        };
        let mut squad: Vec<_> = plan
            .picks_for(next_gw)
            .filter(|r| r.squad)
            .map(|r| (r.position, r.id))
            .collect();
        squad.sort();
        squad.truncate(SQUAD_SLOTS);
        let week = plan.week(next_gw);

        Self {
            run_id: run_id.clone(),
            label: label.to_string(),
            iteration: plan.index,
            next_gw,
            wildcard: chip_week(Chip::Wildcard),
            free_hit: chip_week(Chip::FreeHit),
            bench_boost: chip_week(Chip::BenchBoost),
            triple_captain: chip_week(Chip::TripleCaptain),
            squad: squad.into_iter().map(|(_, id)| id).collect(),
            captain: week.and_then(|w| w.captain),
            vicecap: week.and_then(|w| w.vicecap),
            buys: plan.buy_text(next_gw),
            sells: plan.sell_text(next_gw),
            score: plan.score,
            timestamp,
        }
    }

    /// One entry per plan in the result.
    pub fn from_result(result: &PlanResult) -> Vec<Self> {
        let set = &result.plan_set;
        set.plans
            .iter()
            .map(|plan| {
                Self::from_plan(
                    plan,
                    &result.run_id,
                    &result.label,
                    set.next_gw,
                    result.created_at,
                )
            })
            .collect()
    }
}

/// JSONL history file manager.
pub struct PlanHistory {
    path: PathBuf,
}

impl PlanHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one entry, creating the file and its directory if needed.
    pub fn append(&self, entry: &HistoryEntry) -> io::Result<()> {
        self.append_all(std::slice::from_ref(entry)).map(|_| ())
    }

    /// Append entries in order. Returns how many were written.
    pub fn append_all(&self, entries: &[HistoryEntry]) -> io::Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        for entry in entries {
            let json = serde_json::to_string(entry)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(file, "{json}")?;
        }
        file.flush()?;
        Ok(entries.len())
    }

    pub fn append_result(&self, result: &PlanResult) -> io::Result<usize> {
        self.append_all(&HistoryEntry::from_result(result))
    }

    /// Read all entries. Malformed lines are skipped.
    pub fn read_all(&self) -> io::Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut entries = Vec::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::debug!(event = "history_line_skipped", line = n + 1, error = %e),
            }
        }

        Ok(entries)
    }

    /// Entries of one run, in file order.
    pub fn read_run(&self, run_id: &RunId) -> io::Result<Vec<HistoryEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| &e.run_id == run_id)
            .collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
