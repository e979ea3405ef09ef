//! SquadLab CLI: plan, sweep and history commands.
//!
//! Commands:
//! - `plan`: solve one run from a TOML run file and save its artifacts
//! - `sweep`: run every chip/noise scenario of a run file in parallel
//! - `history show`: print entries from a JSONL plan history

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use squadlab_runner::{
    generate_sweep_report, load_run_data, run_single_plan, run_sweep, save_artifacts,
    HistoryEntry, PlanHistory, PlanResult, RunConfig,
};

#[derive(Parser)]
#[command(name = "squadlab", about = "SquadLab CLI: multi-week fantasy squad planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan from a TOML run file.
    Plan {
        /// Path to the run file.
        #[arg(long)]
        config: PathBuf,

        /// Override the number of plans to produce.
        #[arg(long)]
        solutions: Option<u32>,

        /// Override the planning horizon.
        #[arg(long)]
        horizon: Option<u32>,

        /// Override the output directory from the run file.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run the scenario sweep described by a run file.
    Sweep {
        /// Path to the run file.
        #[arg(long)]
        config: PathBuf,

        /// Number of scenarios to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Plan history commands.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print history entries.
    Show {
        /// JSONL history file.
        #[arg(long)]
        file: PathBuf,

        /// Only entries of this run id (full or prefix).
        #[arg(long)]
        run: Option<String>,

        /// Only the last N entries.
        #[arg(long)]
        last: Option<usize>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            config,
            solutions,
            horizon,
            output_dir,
            json,
        } => run_plan_cmd(&config, solutions, horizon, output_dir, json),
        Commands::Sweep { config, top } => run_sweep_cmd(&config, top),
        Commands::History { action } => match action {
            HistoryAction::Show { file, run, last } => run_history_show(file, run, last),
        },
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::from_toml_file(path)
        .with_context(|| format!("failed to load run file {}", path.display()))
}

fn run_plan_cmd(
    config_path: &Path,
    solutions: Option<u32>,
    horizon: Option<u32>,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    tracing::info!(event = "plan_cmd", run = config.run_id().short(), config = %config_path.display());
    if let Some(n) = solutions {
        config.planner.diversity.solutions = n;
    }
    if let Some(h) = horizon {
        config.planner.horizon = h;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    let result = run_single_plan(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    let run_dir = save_artifacts(&result, &config.output_dir)?;
    eprintln!("Artifacts saved to: {}", run_dir.display());

    if let Some(path) = &config.history {
        let written = PlanHistory::new(path.clone()).append_result(&result)?;
        eprintln!("History: {written} entries appended to {}", path.display());
    }
    Ok(())
}

fn run_sweep_cmd(config_path: &Path, top: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let data = load_run_data(&config)?;
    let run_id = config.run_id();
    tracing::info!(event = "sweep_cmd", run = run_id.short(), config = %config_path.display());
    let results = run_sweep(
        &data.table,
        &data.state,
        &config.planner,
        &config.sweep,
        &run_id,
    )?;
    if results.is_empty() {
        for f in &results.failures {
            eprintln!("{}: {}", f.label, f.error);
        }
        bail!("no scenario produced a plan");
    }

    println!();
    println!("=== Sweep: {} scenarios ===", results.len() + results.failures.len());
    for (rank, r) in results.top_n(top).iter().enumerate() {
        println!("{:>3}. {:<28} {:>8.2}", rank + 1, r.label, r.best_score());
    }
    if !results.failures.is_empty() {
        println!("({} scenarios failed)", results.failures.len());
    }

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;
    let report_path = config.output_dir.join(format!("sweep_{}.md", run_id.short()));
    std::fs::write(&report_path, generate_sweep_report(&results))?;
    eprintln!("Sweep report: {}", report_path.display());

    if let Some(best) = results.best() {
        let run_dir = save_artifacts(best, &config.output_dir)?;
        eprintln!("Best scenario artifacts: {}", run_dir.display());
    }

    if let Some(path) = &config.history {
        let history = PlanHistory::new(path.clone());
        let mut written = 0;
        for r in &results.results {
            written += history.append_result(r)?;
        }
        eprintln!("History: {written} entries appended to {}", path.display());
    }
    Ok(())
}

fn run_history_show(file: PathBuf, run: Option<String>, last: Option<usize>) -> Result<()> {
    let history = PlanHistory::new(file);
    let mut entries: Vec<HistoryEntry> = history
        .read_all()
        .with_context(|| format!("failed to read {}", history.path().display()))?;
    if let Some(prefix) = run {
        entries.retain(|e| e.run_id.0.starts_with(&prefix));
    }
    if let Some(n) = last {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    if entries.is_empty() {
        println!("No history entries.");
        return Ok(());
    }

    for e in &entries {
        let chips: Vec<String> = [
            ("WC", e.wildcard),
            ("FH", e.free_hit),
            ("BB", e.bench_boost),
            ("TC", e.triple_captain),
        ]
        .iter()
        .filter_map(|(code, gw)| gw.map(|gw| format!("{code}@{gw}")))
        .collect();
        println!(
            "{} {} #{} GW{} score {:.2} | buy {} | sell {} | chips {} | C {} VC {}",
            e.timestamp.format("%Y-%m-%d %H:%M"),
            e.run_id.short(),
            e.iteration,
            e.next_gw,
            e.score,
            e.buys,
            e.sells,
            if chips.is_empty() { "-".to_string() } else { chips.join(" ") },
            e.captain.map_or("-".to_string(), |c| c.to_string()),
            e.vicecap.map_or("-".to_string(), |c| c.to_string()),
        );
    }
    Ok(())
}

fn print_summary(result: &PlanResult) {
    let set = &result.plan_set;
    println!();
    println!("=== Squad Plan ===");
    println!("Run:            {}", result.run_id.short());
    println!(
        "Gameweeks:      {}-{}",
        set.gameweeks.first().copied().unwrap_or_default(),
        set.gameweeks.last().copied().unwrap_or_default()
    );
    println!("Plans:          {}", set.plans.len());
    println!("Solve time:     {} ms", result.elapsed_ms);
    if let Some(seed) = set.noise_seed {
        println!("Noise seed:     {seed}");
    }
    if let Some(s) = &set.shortfall {
        println!(
            "Shortfall:      {} of {} ({})",
            s.produced, s.requested, s.reason
        );
    }

    for plan in &set.plans {
        println!();
        println!("--- Plan {} ---", plan.index + 1);
        print!("{}", plan.summary);
        if !plan.summary.ends_with('\n') {
            println!();
        }
    }
}
