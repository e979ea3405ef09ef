//! On-disk fixtures: a 22-player projection CSV, an owned squad and a run file.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use squadlab_runner::RunConfig;

pub const NEXT_GW: u32 = 10;

const CLUBS: [&str; 8] = ["ARS", "BOU", "CHE", "EVE", "FUL", "LIV", "MCI", "NEW"];

/// (id, pos, price, base xp)
const POOL: [(u32, &str, f64, f64); 22] = [
    (1, "G", 45.0, 4.0),
    (2, "G", 40.0, 3.0),
    (3, "G", 50.0, 4.5),
    (4, "D", 40.0, 3.0),
    (5, "D", 45.0, 3.5),
    (6, "D", 50.0, 4.0),
    (7, "D", 55.0, 4.5),
    (8, "D", 45.0, 3.2),
    (9, "D", 40.0, 2.8),
    (10, "D", 60.0, 5.0),
    (11, "M", 55.0, 4.5),
    (12, "M", 60.0, 5.0),
    (13, "M", 65.0, 5.5),
    (14, "M", 70.0, 6.0),
    (15, "M", 50.0, 4.0),
    (16, "M", 75.0, 6.5),
    (17, "M", 80.0, 7.0),
    (18, "F", 60.0, 5.0),
    (19, "F", 65.0, 5.5),
    (20, "F", 70.0, 6.0),
    (21, "F", 75.0, 6.5),
    (22, "F", 55.0, 4.5),
];

pub const OWNED: [u32; 15] = [1, 2, 4, 5, 6, 8, 9, 11, 12, 13, 14, 15, 18, 19, 22];

pub fn projections_csv(weeks: u32) -> String {
    let mut out = String::from("id,name,pos,team,price");
    for w in 0..weeks {
        let gw = NEXT_GW + w;
        out.push_str(&format!(",{gw}_pts,{gw}_xmins"));
    }
    out.push('\n');
    for (id, pos, price, base) in POOL {
        out.push_str(&format!(
            "{id},Player{id},{pos},{},{price}",
            CLUBS[id as usize % CLUBS.len()]
        ));
        for w in 0..weeks {
            let xp = base + 0.1 * f64::from(w) * f64::from(id % 3);
            out.push_str(&format!(",{xp},90"));
        }
        out.push('\n');
    }
    out
}

pub fn state_json() -> String {
    let owned: Vec<String> = OWNED
        .iter()
        .map(|&id| {
            let price = POOL.iter().find(|p| p.0 == id).map_or(0.0, |p| p.2);
            format!(r#"{{"id": {id}, "purchase_price": {price}, "selling_price": {price}}}"#)
        })
        .collect();
    format!(
        r#"{{"owned": [{}], "bank": 50.0, "free_transfers": 1}}"#,
        owned.join(", ")
    )
}

/// Write projections, state and a run file into `dir`; `extra` is appended
/// to the run file verbatim.
pub fn write_run(dir: &Path, weeks: u32, extra: &str) -> PathBuf {
    std::fs::write(dir.join("projections.csv"), projections_csv(weeks)).unwrap();
    std::fs::write(dir.join("state.json"), state_json()).unwrap();
    let run = format!(
        r#"
projections = "projections.csv"
state = "state.json"
output_dir = "out"
history = "out/history.jsonl"

[planner]
horizon = {weeks}
next_gw = {NEXT_GW}
{extra}
"#
    );
    let path = dir.join("run.toml");
    std::fs::write(&path, run).unwrap();
    path
}

pub fn load(dir: &Path, weeks: u32, extra: &str) -> RunConfig {
    RunConfig::from_toml_file(write_run(dir, weeks, extra)).unwrap()
}
