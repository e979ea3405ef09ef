//! Read a solved model back into a plan: picks table, week statistics and a
//! text summary.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::domain::{Chip, Gameweek, PlayerId, Position};
use crate::encoder::PlanningData;
use crate::mip::{SolveOutcome, SolveStatus};

use super::builder::PlanModel;
use super::objective::{decayed_score, horizon_score};

/// One player in one week of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickRow {
    pub solution: usize,
    pub gameweek: Gameweek,
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub club: String,
    /// Price paid, 0 unless bought this week.
    pub buy_price: f64,
    /// Price realized, 0 unless sold this week.
    pub sell_price: f64,
    pub xp: f64,
    pub xmins: f64,
    pub squad: bool,
    pub squad_fh: bool,
    pub lineup: bool,
    /// Bench slot (0 = backup goalkeeper).
    pub bench: Option<u8>,
    pub captain: bool,
    pub vicecap: bool,
    pub triple_captain: bool,
    pub transfer_in: bool,
    pub transfer_out: bool,
    /// The sale realized the depressed price of a price-modified player.
    pub first_sale: bool,
    /// started + captain + triple captain
    pub multiplier: u8,
    pub contribution: f64,
    pub chip: Option<Chip>,
}

/// Per-week trace of the plan's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekStats {
    pub gameweek: Gameweek,
    /// Bank after the week's transfers.
    pub bank: f64,
    /// Free transfers available entering the week.
    pub free_transfers: u8,
    pub transfers: u32,
    pub charged: u32,
    pub hits: u32,
    pub lineup_points: f64,
    pub chip: Option<Chip>,
    /// Weekly objective contribution before horizon weighting.
    pub ev: f64,
    pub buys: Vec<PlayerId>,
    pub sells: Vec<PlayerId>,
    pub captain: Option<PlayerId>,
    pub vicecap: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayScore {
    pub base: f64,
    pub score: f64,
}

/// One solved plan. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// 0-based position in the plan set.
    pub index: usize,
    pub score: f64,
    pub status: SolveStatus,
    pub weekly_ev: Vec<f64>,
    pub decay_scores: Vec<DecayScore>,
    pub picks: Vec<PickRow>,
    pub weeks: Vec<WeekStats>,
    /// Free transfers rolled out of the final week.
    pub final_free_transfers: u8,
    pub summary: String,
}

impl Plan {
    pub fn week(&self, gw: Gameweek) -> Option<&WeekStats> {
        self.weeks.iter().find(|w| w.gameweek == gw)
    }

    pub fn picks_for(&self, gw: Gameweek) -> impl Iterator<Item = &PickRow> {
        self.picks.iter().filter(move |r| r.gameweek == gw)
    }

    /// Persistent squad entering `gw`.
    pub fn squad_at(&self, gw: Gameweek) -> Vec<PlayerId> {
        self.picks_for(gw).filter(|r| r.squad).map(|r| r.id).collect()
    }

    pub fn lineup_at(&self, gw: Gameweek) -> Vec<PlayerId> {
        self.picks_for(gw).filter(|r| r.lineup).map(|r| r.id).collect()
    }

    pub fn buys_at(&self, gw: Gameweek) -> Vec<PlayerId> {
        self.week(gw).map(|w| w.buys.clone()).unwrap_or_default()
    }

    pub fn sells_at(&self, gw: Gameweek) -> Vec<PlayerId> {
        self.week(gw).map(|w| w.sells.clone()).unwrap_or_default()
    }

    /// Gameweeks where a chip is played.
    pub fn chips(&self) -> Vec<(Gameweek, Chip)> {
        self.weeks
            .iter()
            .filter_map(|w| w.chip.map(|c| (w.gameweek, c)))
            .collect()
    }

    /// Names of players bought in `gw`, comma separated, or "-".
    pub fn buy_text(&self, gw: Gameweek) -> String {
        names_or_dash(self.picks_for(gw).filter(|r| r.transfer_in))
    }

    pub fn sell_text(&self, gw: Gameweek) -> String {
        names_or_dash(self.picks_for(gw).filter(|r| r.transfer_out))
    }

    pub fn total_transfers(&self) -> u32 {
        self.weeks.iter().map(|w| w.transfers).sum()
    }
}

fn names_or_dash<'a>(rows: impl Iterator<Item = &'a PickRow>) -> String {
    let names: Vec<&str> = rows.map(|r| r.name.as_str()).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

/// Build a [`Plan`] from solver values.
pub fn extract(
    data: &PlanningData,
    config: &PlannerConfig,
    pm: &PlanModel,
    outcome: &SolveOutcome,
    index: usize,
) -> Plan {
    let v = &pm.vars;
    let on = |var| outcome.is_set(var);
    let on_opt = |var: Option<_>| var.is_some_and(|x| outcome.is_set(x));

    let mut picks = Vec::new();
    let mut weeks = Vec::new();
    let mut weekly_ev = Vec::with_capacity(data.horizon());

    for (t, &gw) in data.gameweeks.iter().enumerate() {
        let chip = Chip::ALL
            .into_iter()
            .find(|c| on_opt(v.chip_var(*c, t)));
        let mut stats = WeekStats {
            gameweek: gw,
            bank: outcome.value(v.bank[t]),
            free_transfers: outcome.int_value(v.free_transfers[t]).clamp(0, 255) as u8,
            transfers: 0,
            charged: outcome.int_value(v.charged[t]).max(0) as u32,
            hits: outcome.int_value(v.penalized[t]).max(0) as u32,
            lineup_points: 0.0,
            chip,
            ev: pm.weekly_ev[t].evaluate(&outcome.values),
            buys: Vec::new(),
            sells: Vec::new(),
            captain: None,
            vicecap: None,
        };

        for (p, player) in data.players.iter().enumerate() {
            let squad = on(v.squad[t][p]);
            let squad_fh = on_opt(v.squad_fh[t][p]);
            let lineup = on(v.lineup[t][p]);
            let bench = v
                .bench_slots(t, p)
                .find(|(_, x)| on(*x))
                .map(|(o, _)| o as u8);
            let transfer_in = on(v.transfer_in[t][p]);
            let first_sale = on_opt(v.out_first[t][p]);
            let regular_sale = on(v.out_regular[t][p]);
            let transfer_out = first_sale || regular_sale;
            if !(squad || squad_fh || lineup || bench.is_some() || transfer_in || transfer_out) {
                continue;
            }

            let captain = on(v.captain[t][p]);
            let vicecap = on(v.vicecap[t][p]);
            let triple_captain = on_opt(v.tc_captain[t][p]);
            let multiplier = u8::from(lineup) + u8::from(captain) + u8::from(triple_captain);
            let xp = player.points[t];
            let contribution = xp * f64::from(multiplier);

            if transfer_in {
                stats.buys.push(player.id);
            }
            if transfer_out {
                stats.sells.push(player.id);
            }
            if captain {
                stats.captain = Some(player.id);
            }
            if vicecap {
                stats.vicecap = Some(player.id);
            }
            stats.lineup_points += contribution;

            picks.push(PickRow {
                solution: index,
                gameweek: gw,
                id: player.id,
                name: player.name.clone(),
                position: player.position,
                club: player.club.clone(),
                buy_price: if transfer_in { player.buy_price } else { 0.0 },
                sell_price: if first_sale {
                    player.sell_price
                } else if regular_sale {
                    player.buy_price
                } else {
                    0.0
                },
                xp,
                xmins: player.minutes[t],
                squad,
                squad_fh,
                lineup,
                bench,
                captain,
                vicecap,
                triple_captain,
                transfer_in,
                transfer_out,
                first_sale,
                multiplier,
                contribution,
                chip,
            });
        }
        stats.transfers = stats.sells.len() as u32;
        weekly_ev.push(stats.ev);
        weeks.push(stats);
    }

    let final_free_transfers = outcome
        .int_value(v.free_transfers[data.horizon()])
        .clamp(0, 255) as u8;
    let decay_scores = config
        .objective
        .report_decay_bases
        .iter()
        .map(|&base| DecayScore {
            base,
            score: decayed_score(&weekly_ev, base),
        })
        .collect();

    let mut plan = Plan {
        index,
        score: horizon_score(&weekly_ev, &config.objective),
        status: outcome.status,
        weekly_ev,
        decay_scores,
        picks,
        weeks,
        final_free_transfers,
        summary: String::new(),
    };
    plan.summary = summarize(&plan);
    plan
}

/// Human-readable transfer/lineup summary, one block per week.
pub fn summarize(plan: &Plan) -> String {
    let mut out = String::new();
    for week in &plan.weeks {
        let gw = week.gameweek;
        let name_of = |id: Option<PlayerId>| {
            id.and_then(|id| plan.picks_for(gw).find(|r| r.id == id))
                .map_or("-".to_string(), |r| r.name.clone())
        };
        let _ = writeln!(
            out,
            "GW{gw}: buy {} | sell {} | chip {} | FT {} | hits {} | bank {:.1} | EV {:.2}",
            plan.buy_text(gw),
            plan.sell_text(gw),
            week.chip.map_or("-", Chip::code),
            week.free_transfers,
            week.hits,
            week.bank,
            week.ev,
        );
        let lineup: Vec<String> = plan
            .picks_for(gw)
            .filter(|r| r.lineup)
            .map(|r| format!("{} ({})", r.name, r.position))
            .collect();
        let bench: Vec<&str> = {
            let mut rows: Vec<&PickRow> = plan.picks_for(gw).filter(|r| r.bench.is_some()).collect();
            rows.sort_by_key(|r| r.bench);
            rows.into_iter().map(|r| r.name.as_str()).collect()
        };
        let _ = writeln!(out, "  lineup: {}", lineup.join(", "));
        let _ = writeln!(
            out,
            "  bench: {} | captain {} | vice {}",
            if bench.is_empty() { "-".to_string() } else { bench.join(", ") },
            name_of(week.captain),
            name_of(week.vicecap),
        );
    }
    let _ = write!(out, "score {:.2} ({})", plan.score, plan.status);
    out
}
