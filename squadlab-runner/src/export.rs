//! Reporting and export: JSON, CSV and Markdown artifacts.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: per-plan pick tables and per-week statistics
//! - **Markdown**: a readable report of every plan, and a sweep leaderboard
//!
//! Persisted results carry a `schema_version`. Newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use squadlab_core::planner::{Plan, PlanSet};

use crate::runner::{PlanResult, SCHEMA_VERSION};
use crate::sweep::SweepResults;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &PlanResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize PlanResult to JSON")
}

/// Deserialize a `PlanResult`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<PlanResult> {
    let result: PlanResult =
        serde_json::from_str(json).context("failed to deserialize PlanResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Pick rows of every plan in the set, one row per player and week.
pub fn export_picks_csv(set: &PlanSet) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "solution",
        "gw",
        "id",
        "name",
        "pos",
        "team",
        "buy_price",
        "sell_price",
        "xp",
        "xmins",
        "squad",
        "squad_fh",
        "lineup",
        "bench",
        "captain",
        "vicecap",
        "triple_captain",
        "transfer_in",
        "transfer_out",
        "multiplier",
        "contribution",
        "chip",
    ])?;

    for row in set.plans.iter().flat_map(|p| p.picks.iter()) {
        let record: [&str; 22] = [
            &row.solution.to_string(),
            &row.gameweek.to_string(),
            &row.id.to_string(),
            &row.name,
            row.position.code(),
            &row.club,
            &format!("{:.1}", row.buy_price),
            &format!("{:.1}", row.sell_price),
            &format!("{:.3}", row.xp),
            &format!("{:.1}", row.xmins),
            flag(row.squad),
            flag(row.squad_fh),
            flag(row.lineup),
            &row.bench.map(|b| b.to_string()).unwrap_or_default(),
            flag(row.captain),
            flag(row.vicecap),
            flag(row.triple_captain),
            flag(row.transfer_in),
            flag(row.transfer_out),
            &row.multiplier.to_string(),
            &format!("{:.3}", row.contribution),
            row.chip.map_or("", |c| c.code()),
        ];
        wtr.write_record(record)?;
    }

    let bytes = wtr.into_inner().context("failed to flush picks CSV")?;
    String::from_utf8(bytes).context("picks CSV is not UTF-8")
}

/// Week-by-week ledger of every plan in the set.
pub fn export_weeks_csv(set: &PlanSet) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "solution",
        "gw",
        "bank",
        "free_transfers",
        "transfers",
        "charged",
        "hits",
        "chip",
        "lineup_points",
        "ev",
        "buys",
        "sells",
    ])?;

    for plan in &set.plans {
        for w in &plan.weeks {
            let record: [&str; 12] = [
                &plan.index.to_string(),
                &w.gameweek.to_string(),
                &format!("{:.1}", w.bank),
                &w.free_transfers.to_string(),
                &w.transfers.to_string(),
                &w.charged.to_string(),
                &w.hits.to_string(),
                w.chip.map_or("", |c| c.code()),
                &format!("{:.3}", w.lineup_points),
                &format!("{:.3}", w.ev),
                &plan.buy_text(w.gameweek),
                &plan.sell_text(w.gameweek),
            ];
            wtr.write_record(record)?;
        }
    }

    let bytes = wtr.into_inner().context("failed to flush weeks CSV")?;
    String::from_utf8(bytes).context("weeks CSV is not UTF-8")
}

// ─── Artifacts ──────────────────────────────────────────────────────

/// Save all artifacts for a run into a timestamped directory.
///
/// Creates `{output_dir}/gw{next_gw}_{YYYYMMDD_HHMMSS}/` containing:
/// - `result.json`: full result with schema version
/// - `picks.csv`: pick rows of every plan
/// - `weeks.csv`: per-week ledger of every plan
/// - `report.md`: Markdown report
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &PlanResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "gw{}_{}",
        result.plan_set.next_gw,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("picks.csv"), export_picks_csv(&result.plan_set)?)?;
    std::fs::write(run_dir.join("weeks.csv"), export_weeks_csv(&result.plan_set)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    tracing::info!(event = "artifacts_saved", dir = %run_dir.display());
    Ok(run_dir)
}

/// Load a `PlanResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<PlanResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

fn push_plan(md: &mut String, plan: &Plan) {
    md.push_str(&format!(
        "## Plan {}: {:.2} ({})\n\n",
        plan.index + 1,
        plan.score,
        plan.status
    ));
    md.push_str("| GW | Buy | Sell | Chip | FT | Hits | Bank | EV |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- |\n");
    for w in &plan.weeks {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {:.1} | {:.2} |\n",
            w.gameweek,
            plan.buy_text(w.gameweek),
            plan.sell_text(w.gameweek),
            w.chip.map_or("-", |c| c.code()),
            w.free_transfers,
            w.hits,
            w.bank,
            w.ev
        ));
    }
    md.push('\n');
    if !plan.decay_scores.is_empty() {
        md.push_str("| Decay base | Score |\n");
        md.push_str("| --- | --- |\n");
        for d in &plan.decay_scores {
            md.push_str(&format!("| {:.2} | {:.2} |\n", d.base, d.score));
        }
        md.push('\n');
    }
    md.push_str("```text\n");
    md.push_str(&plan.summary);
    if !plan.summary.ends_with('\n') {
        md.push('\n');
    }
    md.push_str("```\n\n");
}

/// Markdown report for a single run.
pub fn generate_report(result: &PlanResult) -> String {
    let set = &result.plan_set;
    let mut md = String::with_capacity(4096);

    md.push_str("# Squad Plan Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run | {} |\n", result.run_id.short()));
    md.push_str(&format!("| Scenario | {} |\n", result.label));
    md.push_str(&format!(
        "| Gameweeks | {} |\n",
        set.gameweeks
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    md.push_str(&format!("| Objective | {:?} |\n", result.config.objective.mode));
    md.push_str(&format!("| Plans | {} |\n", set.plans.len()));
    md.push_str(&format!("| Pruned players | {} |\n", set.pruned.len()));
    if let Some(seed) = set.noise_seed {
        md.push_str(&format!("| Noise seed | {seed} |\n"));
    }
    md.push_str(&format!("| Solve time | {} ms |\n", result.elapsed_ms));
    md.push_str(&format!(
        "| Created | {} |\n",
        result.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push('\n');

    if let Some(s) = &set.shortfall {
        md.push_str(&format!(
            "> **Shortfall**: {} of {} plans produced. {}\n\n",
            s.produced, s.requested, s.reason
        ));
    }

    for plan in &set.plans {
        push_plan(&mut md, plan);
    }
    md
}

/// Markdown leaderboard of a sweep's scenarios.
pub fn generate_sweep_report(results: &SweepResults) -> String {
    let mut md = String::with_capacity(2048);
    md.push_str("# Scenario Sweep\n\n");
    md.push_str("| Rank | Scenario | Score | Chips | GW1 buys | GW1 sells |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- |\n");
    for (rank, r) in results.results.iter().enumerate() {
        let Some(best) = r.plan_set.best() else {
            continue;
        };
        let gw = r.plan_set.next_gw;
        let chips = best
            .chips()
            .iter()
            .map(|(gw, c)| format!("{c}@{gw}"))
            .collect::<Vec<_>>();
        md.push_str(&format!(
            "| {} | {} | {:.2} | {} | {} | {} |\n",
            rank + 1,
            r.label,
            best.score,
            if chips.is_empty() { "-".to_string() } else { chips.join(" ") },
            best.buy_text(gw),
            best.sell_text(gw)
        ));
    }
    if !results.failures.is_empty() {
        md.push_str("\n## Failed scenarios\n\n");
        for f in &results.failures {
            md.push_str(&format!("- {}: {}\n", f.label, f.error));
        }
    }
    md
}
