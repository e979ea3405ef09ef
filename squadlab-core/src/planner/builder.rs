//! Model builder: every hard rule of the game as linear rows.
//!
//! Row families, in emission order:
//! - boundary conditions (current squad or pre-season budget, initial FT)
//! - per-week squad continuity, composition and club caps
//! - Free Hit shadow squad and its affordability check
//! - lineup formation, ordered bench, captaincy, triple captain
//! - bank ledger and the free-transfer state machine
//! - price-modified sale ordering
//! - chip limits and rule options (bans, locks, bookings, hit limits, ...)

use std::collections::BTreeSet;

use crate::config::{OpposingGroup, OpposingPlay, PlannerConfig};
use crate::domain::{Chip, Gameweek, Position, BENCH_SLOTS, LINEUP_SIZE, SQUAD_SIZE};
use crate::encoder::PlanningData;
use crate::error::{MissingData, PlanError};
use crate::mip::{LinExpr, MipModel, ObjectiveSense, VarId};
use crate::transitions::{FT_BIG_M, MAX_FREE_TRANSFERS};

use super::extract::{PickRow, Plan};
use super::objective;
use super::variables::{PlanVars, FT_STATES};

/// Soft-penalty indicator created for an opposing-play pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penalty {
    pub week: usize,
    pub var: VarId,
    pub weight: f64,
}

/// A built model with the handles needed to read it back.
#[derive(Debug, Clone)]
pub struct PlanModel {
    pub model: MipModel,
    pub vars: PlanVars,
    /// Expected value of each planned week, before horizon weighting.
    pub weekly_ev: Vec<LinExpr>,
    pub penalties: Vec<Penalty>,
}

/// Declare variables, emit every constraint and set the objective.
pub fn build(data: &PlanningData, config: &PlannerConfig) -> Result<PlanModel, PlanError> {
    let mut model = MipModel::new();
    let vars = PlanVars::declare(&mut model, data);
    let mut b = Builder {
        data,
        config,
        model: &mut model,
        vars: &vars,
    };

    b.boundary();
    for t in 0..data.horizon() {
        b.continuity(t);
        b.squad_composition(t);
        b.free_hit_squad(t);
        b.lineup(t);
        b.captaincy(t);
        b.chips_in_week(t);
        b.budget(t);
        b.free_transfers(t);
    }
    b.price_modified_sales();
    b.chip_limits();
    b.roster_options()?;
    b.transfer_options();
    let penalties = b.opposing_play();

    let weekly_ev = objective::weekly_ev(data, config, &vars, &penalties);
    model.set_objective(
        objective::horizon_objective(&weekly_ev, &config.objective),
        ObjectiveSense::Maximize,
    );

    tracing::debug!(
        event = "model_built",
        vars = model.num_vars(),
        integer_vars = model.num_integer_vars(),
        constraints = model.num_constraints(),
        penalties = penalties.len()
    );

    Ok(PlanModel {
        model,
        vars,
        weekly_ev,
        penalties,
    })
}

/// Pin every squad, lineup, transfer and chip decision of `plan` on a freshly
/// built model. Re-solving reproduces the plan's score.
pub fn fix_plan(pm: &mut PlanModel, data: &PlanningData, plan: &Plan) -> Result<(), PlanError> {
    let planned: Vec<Gameweek> = plan.weeks.iter().map(|w| w.gameweek).collect();
    if planned != data.gameweeks {
        return Err(PlanError::ConfigurationConflict(format!(
            "plan covers {planned:?}, model covers {:?}",
            data.gameweeks
        )));
    }
    if let Some(row) = plan.picks.iter().find(|r| data.index_of(r.id).is_none()) {
        return Err(PlanError::DataUnavailable(MissingData::Player {
            player: row.id,
            role: "planned",
        }));
    }

    let v = &pm.vars;
    let model = &mut pm.model;
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    for (t, week) in plan.weeks.iter().enumerate() {
        for chip in Chip::ALL {
            if let Some(x) = v.chip_var(chip, t) {
                model.fix(x, flag(week.chip == Some(chip)));
            }
        }
        for (p, player) in data.players.iter().enumerate() {
            let row = plan
                .picks_for(week.gameweek)
                .find(|r| r.id == player.id);
            let has = |f: fn(&PickRow) -> bool| row.is_some_and(f);

            model.fix(v.squad[t][p], flag(has(|r| r.squad)));
            model.fix(v.lineup[t][p], flag(has(|r| r.lineup)));
            model.fix(v.captain[t][p], flag(has(|r| r.captain)));
            model.fix(v.vicecap[t][p], flag(has(|r| r.vicecap)));
            model.fix(v.transfer_in[t][p], flag(has(|r| r.transfer_in)));
            model.fix(
                v.out_regular[t][p],
                flag(has(|r| r.transfer_out && !r.first_sale)),
            );
            if let Some(x) = v.out_first[t][p] {
                model.fix(x, flag(has(|r| r.first_sale)));
            }
            if let Some(x) = v.squad_fh[t][p] {
                model.fix(x, flag(has(|r| r.squad_fh)));
            }
            if let Some(x) = v.tc_captain[t][p] {
                model.fix(x, flag(has(|r| r.triple_captain)));
            }
            let slot = row.and_then(|r| r.bench).map(usize::from);
            for (o, x) in v.bench_slots(t, p) {
                model.fix(x, flag(slot == Some(o)));
            }
        }
    }
    if data.preseason {
        for (p, player) in data.players.iter().enumerate() {
            let first = plan
                .picks_for(data.next_gw)
                .any(|r| r.id == player.id && r.squad);
            model.fix(v.initial[p], flag(first));
        }
    }
    Ok(())
}

struct Builder<'a> {
    data: &'a PlanningData,
    config: &'a PlannerConfig,
    model: &'a mut MipModel,
    vars: &'a PlanVars,
}

impl Builder<'_> {
    fn players(&self) -> std::ops::Range<usize> {
        0..self.data.players.len()
    }

    fn at_position(&self, pos: Position) -> Vec<usize> {
        self.players()
            .filter(|&p| self.data.players[p].position == pos)
            .collect()
    }

    fn at_club(&self, club: usize) -> Vec<usize> {
        self.players()
            .filter(|&p| self.data.players[p].club_idx == club)
            .collect()
    }

    fn gw(&self, t: usize) -> Gameweek {
        self.data.gameweeks[t]
    }

    /// Boundary squad, bank and free-transfer count.
    fn boundary(&mut self) {
        let v = self.vars;
        if self.data.preseason {
            // Pre-season: the boundary squad is the first pick.
            self.model.eq("initial_size", LinExpr::sum(v.initial.iter().copied()), SQUAD_SIZE as f64);
            for pos in Position::ALL {
                let members = self.at_position(pos);
                self.model.eq(
                    "initial_position",
                    LinExpr::sum(members.iter().map(|&p| v.initial[p])),
                    pos.squad_quota() as f64,
                );
            }
            for club in 0..self.data.clubs.len() {
                let members = self.at_club(club);
                self.model.le(
                    "initial_club",
                    LinExpr::sum(members.iter().map(|&p| v.initial[p])),
                    f64::from(self.config.roster.team_limit),
                );
            }
            let mut spend = LinExpr::weighted(
                self.players()
                    .map(|p| (v.initial[p], self.data.players[p].buy_price)),
            );
            if let Some(bank) = v.initial_bank {
                spend.add_term(bank, 1.0);
            }
            self.model.eq("initial_budget", spend, self.data.budget);
            for p in self.players() {
                self.model.set_upper(v.transfer_in[0][p], 0.0);
                self.model.set_upper(v.out_regular[0][p], 0.0);
            }
        } else {
            for (p, player) in self.data.players.iter().enumerate() {
                self.model.fix(v.initial[p], if player.owned { 1.0 } else { 0.0 });
            }
        }

        let initial_ft = match self.special_ft(self.data.next_gw) {
            Some(value) => value,
            None => self.data.initial_free_transfers.min(MAX_FREE_TRANSFERS),
        };
        self.model.fix(v.free_transfers[0], f64::from(initial_ft));
    }

    fn special_ft(&self, gw: Gameweek) -> Option<u8> {
        self.config
            .transfers
            .special_ft
            .filter(|s| s.gw == gw)
            .map(|s| s.value)
    }

    fn continuity(&mut self, t: usize) {
        let v = self.vars;
        for p in self.players() {
            let mut row = LinExpr::from(v.squad[t][p]);
            row.add_term(v.prev_squad(t, p), -1.0);
            row.add_term(v.transfer_in[t][p], -1.0);
            row += v.sold(t, p);
            self.model.eq("continuity", row, 0.0);

            let mut once = LinExpr::from(v.transfer_in[t][p]);
            once += v.sold(t, p);
            self.model.le("buy_or_sell", once, 1.0);
        }
    }

    fn squad_composition(&mut self, t: usize) {
        let v = self.vars;
        self.model.eq(
            "squad_size",
            LinExpr::sum(v.squad[t].iter().copied()),
            SQUAD_SIZE as f64,
        );
        for pos in Position::ALL {
            let members = self.at_position(pos);
            self.model.eq(
                "squad_position",
                LinExpr::sum(members.iter().map(|&p| v.squad[t][p])),
                pos.squad_quota() as f64,
            );
        }
        let team_limit = f64::from(self.config.roster.team_limit);
        let defenders_cap = self.config.roster.max_defenders_per_team.map(f64::from);
        for club in 0..self.data.clubs.len() {
            let members = self.at_club(club);
            self.model.le(
                "squad_club",
                LinExpr::sum(members.iter().map(|&p| v.squad[t][p])),
                team_limit,
            );
            if let Some(cap) = defenders_cap {
                let defensive = members
                    .iter()
                    .filter(|&&p| self.data.players[p].position.is_defensive());
                self.model.le(
                    "squad_club_defence",
                    LinExpr::sum(defensive.map(|&p| v.squad[t][p])),
                    cap,
                );
            }
        }
    }

    /// Shadow squad for a Free Hit week, sized `15 * fh`.
    fn free_hit_squad(&mut self, t: usize) {
        let v = self.vars;
        let Some(fh) = v.chip_var(Chip::FreeHit, t) else {
            return;
        };
        let shadow = |ps: &[usize]| LinExpr::sum(ps.iter().filter_map(|&p| v.squad_fh[t][p]));

        let all: Vec<usize> = self.players().collect();
        let mut size = shadow(&all);
        size.add_term(fh, -(SQUAD_SIZE as f64));
        self.model.eq("fh_size", size, 0.0);
        for pos in Position::ALL {
            let mut row = shadow(&self.at_position(pos));
            row.add_term(fh, -(pos.squad_quota() as f64));
            self.model.eq("fh_position", row, 0.0);
        }
        let team_limit = f64::from(self.config.roster.team_limit);
        for club in 0..self.data.clubs.len() {
            let members = self.at_club(club);
            self.model.le("fh_club", shadow(&members), team_limit);
            if let Some(cap) = self.config.roster.max_defenders_per_team {
                let defensive: Vec<usize> = members
                    .into_iter()
                    .filter(|&p| self.data.players[p].position.is_defensive())
                    .collect();
                self.model.le("fh_club_defence", shadow(&defensive), f64::from(cap));
            }
        }

        // Persistent squad is frozen: Σ in ≤ 15 (1 - fh).
        let mut frozen = LinExpr::sum(v.transfer_in[t].iter().copied());
        frozen.add_term(fh, SQUAD_SIZE as f64);
        self.model.le("fh_frozen", frozen, SQUAD_SIZE as f64);

        // Affordability against the full-sell value of the previous squad.
        let mut afford = LinExpr::new();
        for (p, player) in self.data.players.iter().enumerate() {
            if let Some(x) = v.squad_fh[t][p] {
                afford.add_term(x, player.buy_price);
            }
            afford.add_term(v.prev_squad(t, p), -player.free_hit_sell_value());
        }
        afford.add_expr(&v.prev_bank(t, self.data.initial_bank), -1.0);
        self.model.le("fh_budget", afford, 0.0);
    }

    fn lineup(&mut self, t: usize) {
        let v = self.vars;
        let bb = v.chip_expr(Chip::BenchBoost, t);
        let bench_players = (SQUAD_SIZE - LINEUP_SIZE) as f64;

        let mut size = LinExpr::sum(v.lineup[t].iter().copied());
        size.add_expr(&bb, -bench_players);
        self.model.eq("lineup_size", size, LINEUP_SIZE as f64);

        for pos in Position::ALL {
            let members = self.at_position(pos);
            let (min, max) = pos.lineup_bounds();
            let count = LinExpr::sum(members.iter().map(|&p| v.lineup[t][p]));
            self.model.ge("formation_min", count.clone(), min as f64);
            let mut upper = count;
            upper.add_expr(&bb, -((pos.squad_quota() - max) as f64));
            self.model.le("formation_max", upper, max as f64);
        }

        for o in 0..BENCH_SLOTS {
            let mut slot = LinExpr::sum(self.players().filter_map(|p| v.bench[t][p][o]));
            slot += bb.clone();
            self.model.eq("bench_slot", slot, 1.0);
        }

        let fh = v.chip_var(Chip::FreeHit, t);
        for p in self.players() {
            let mut role = LinExpr::from(v.lineup[t][p]);
            for (_, x) in v.bench_slots(t, p) {
                role.add_term(x, 1.0);
            }
            let mut owned = role.clone();
            owned.add_term(v.squad[t][p], -1.0);
            if let Some(fh) = fh {
                owned.add_term(fh, -1.0);
            }
            self.model.le("role_in_squad", owned, 0.0);

            if let (Some(fh), Some(shadow)) = (fh, v.squad_fh[t][p]) {
                let mut in_shadow = role;
                in_shadow.add_term(shadow, -1.0);
                in_shadow.add_term(fh, 1.0);
                self.model.le("role_in_fh_squad", in_shadow, 1.0);
            }
        }
    }

    fn captaincy(&mut self, t: usize) {
        let v = self.vars;
        self.model.eq("captain_one", LinExpr::sum(v.captain[t].iter().copied()), 1.0);
        self.model.eq("vicecap_one", LinExpr::sum(v.vicecap[t].iter().copied()), 1.0);
        for p in self.players() {
            self.model.le(
                "captain_starts",
                LinExpr::from(v.captain[t][p]) - LinExpr::from(v.lineup[t][p]),
                0.0,
            );
            self.model.le(
                "vicecap_starts",
                LinExpr::from(v.vicecap[t][p]) - LinExpr::from(v.lineup[t][p]),
                0.0,
            );
            self.model.le(
                "captain_vicecap_distinct",
                LinExpr::sum([v.captain[t][p], v.vicecap[t][p]]),
                1.0,
            );
            if let Some(tc) = v.tc_captain[t][p] {
                self.model.le(
                    "tc_on_captain",
                    LinExpr::from(tc) - LinExpr::from(v.captain[t][p]),
                    0.0,
                );
            }
        }
        if let Some(use_tc) = v.chip_var(Chip::TripleCaptain, t) {
            let mut link = LinExpr::sum(v.tc_captain[t].iter().filter_map(|x| *x));
            link.add_term(use_tc, -1.0);
            self.model.eq("tc_link", link, 0.0);
        }
    }

    fn chips_in_week(&mut self, t: usize) {
        let v = self.vars;
        let active: Vec<VarId> = Chip::ALL
            .into_iter()
            .filter_map(|c| v.chip_var(c, t))
            .collect();
        if active.len() > 1 {
            self.model.le("one_chip_per_week", LinExpr::sum(active), 1.0);
        }
        for chip in Chip::ALL {
            if let Some(x) = v.chip_var(chip, t) {
                if self.data.chip(chip).forced[t] {
                    self.model.fix(x, 1.0);
                }
            }
        }
    }

    fn budget(&mut self, t: usize) {
        let v = self.vars;
        let mut row = LinExpr::from(v.bank[t]);
        row.add_expr(&v.prev_bank(t, self.data.initial_bank), -1.0);
        for (p, player) in self.data.players.iter().enumerate() {
            if let Some(first) = v.out_first[t][p] {
                row.add_term(first, -player.sell_price);
            }
            row.add_term(v.out_regular[t][p], -player.buy_price);
            row.add_term(v.transfer_in[t][p], player.buy_price);
        }
        let fee = self.config.scoring.itb_loss_per_transfer;
        if t > 0 && fee > 0.0 {
            row.add_expr(&v.transfers(t), fee);
        }
        self.model.eq("bank_ledger", row, 0.0);
    }

    /// Charged and penalized transfers, and the clamp into `ft[t + 1]`.
    fn free_transfers(&mut self, t: usize) {
        let v = self.vars;
        let n = v.transfers(t);
        let reset = v.reset_expr(t);
        let squad = SQUAD_SIZE as f64;
        let charged = LinExpr::from(v.charged[t]);
        let ft = LinExpr::from(v.free_transfers[t]);
        let next = LinExpr::from(v.free_transfers[t + 1]);

        // charged ≥ n - 15 reset; charged ≤ n; charged ≤ 15 (1 - reset)
        let mut lower = charged.clone() - n.clone();
        lower.add_expr(&reset, squad);
        self.model.ge("charged_lower", lower, 0.0);
        self.model.le("charged_le_transfers", charged.clone() - n, 0.0);
        let mut zero_on_reset = charged.clone();
        zero_on_reset.add_expr(&reset, squad);
        self.model.le("charged_reset", zero_on_reset, squad);

        // penalized = max(0, charged - ft)
        let penalized = LinExpr::from(v.penalized[t]);
        let over = LinExpr::from(v.over_free[t]);
        self.model.ge(
            "penalized",
            penalized.clone() - charged.clone() + ft.clone(),
            0.0,
        );
        let mut upper = penalized.clone() - charged.clone() + ft.clone();
        upper.add_expr(&over, squad);
        self.model.le("penalized_upper", upper, squad);
        let mut gated = penalized;
        gated.add_expr(&over, -squad);
        self.model.le("penalized_gate", gated, 0.0);

        let next_gw = self.gw(t) + 1;
        if let Some(value) = self.special_ft(next_gw) {
            self.model.fix(v.free_transfers[t + 1], f64::from(value));
            self.model.fix(v.ft_below[t], 0.0);
            self.model.fix(v.ft_above[t], 0.0);
        } else {
            let m = FT_BIG_M;
            let below = LinExpr::from(v.ft_below[t]);
            let above = LinExpr::from(v.ft_above[t]);
            let max = f64::from(MAX_FREE_TRANSFERS);
            // delta = next - ft + charged + reset, equal to 1 when unclamped.
            let delta = next.clone() - ft.clone() + charged.clone() + reset.clone();
            // slack = ft - charged - reset = raw - 1
            let slack = ft - charged - reset;

            self.model.le("ft_clamp_upper", delta.clone() - below.clone() * m, 1.0);
            self.model.ge("ft_clamp_lower", delta + above.clone() * m, 1.0);
            self.model.le("ft_below_cap", next.clone() + below.clone() * m, m + 1.0);
            self.model.ge("ft_above_floor", next - above.clone() * m, max - m);
            self.model.le("ft_below_only_if_raw_low", slack.clone() + below.clone() * m, m);
            self.model.ge("ft_above_only_if_raw_high", slack - above.clone() * m, max - 1.0 - m);
            self.model.le("ft_one_side", below + above, 1.0);
        }

        let states = &v.ft_state[t];
        self.model.eq("ft_state_one", LinExpr::sum(states.iter().copied()), 1.0);
        let mut decode = LinExpr::weighted(
            (0..FT_STATES).map(|s| (states[s], (s + 1) as f64)),
        );
        decode.add_term(v.free_transfers[t + 1], -1.0);
        self.model.eq("ft_state_decode", decode, 0.0);
    }

    /// At most one first sale per price-modified player, and no regular sale
    /// before it. One horizon-scaled row per week.
    fn price_modified_sales(&mut self) {
        let v = self.vars;
        let weeks = self.data.horizon();
        let h = weeks as f64;
        let modified: Vec<usize> = self.data.price_modified().collect();
        for p in modified {
            let firsts: Vec<VarId> = (0..weeks).filter_map(|t| v.out_first[t][p]).collect();
            self.model.le("first_sale_once", LinExpr::sum(firsts.iter().copied()), 1.0);
            for t in 0..weeks {
                let mut row = LinExpr::weighted(firsts[..=t].iter().map(|&x| (x, h)));
                for w in 0..=t {
                    row.add_term(v.out_regular[w][p], -1.0);
                }
                self.model.ge("regular_after_first", row, 0.0);
            }
        }
    }

    fn chip_limits(&mut self) {
        let v = self.vars;
        for chip in Chip::ALL {
            let plan = self.data.chip(chip);
            let uses: Vec<VarId> = (0..self.data.horizon())
                .filter_map(|t| v.chip_var(chip, t))
                .collect();
            if (plan.cap as usize) < uses.len() {
                self.model.le("chip_cap", LinExpr::sum(uses), f64::from(plan.cap));
            }
        }
    }

    fn roster_options(&mut self) -> Result<(), PlanError> {
        let v = self.vars;
        let roster = &self.config.roster;
        let weeks = self.data.horizon();

        let ban = |model: &mut MipModel, p: usize, t: usize| {
            model.set_upper(v.squad[t][p], 0.0);
            if let Some(x) = v.squad_fh[t][p] {
                model.set_upper(x, 0.0);
            }
        };
        for id in &roster.banned {
            if let Some(p) = self.data.index_of(*id) {
                for t in 0..weeks {
                    ban(self.model, p, t);
                }
            }
        }
        for id in &roster.banned_next_gw {
            if let Some(p) = self.data.index_of(*id) {
                ban(self.model, p, 0);
            }
        }

        let lock = |model: &mut MipModel, p: usize, t: usize| {
            let mut row = LinExpr::from(v.squad[t][p]);
            if let Some(x) = v.squad_fh[t][p] {
                row.add_term(x, 1.0);
            }
            model.ge("locked", row, 1.0);
        };
        for id in &roster.locked {
            if let Some(p) = self.data.index_of(*id) {
                for t in 0..weeks {
                    lock(self.model, p, t);
                }
            }
        }
        for id in &roster.locked_next_gw {
            if let Some(p) = self.data.index_of(*id) {
                lock(self.model, p, 0);
            }
        }

        for pp in &roster.price_points {
            let candidates: Vec<usize> = self
                .players()
                .filter(|&p| {
                    let player = &self.data.players[p];
                    player.position == pp.position && (player.buy_price - pp.price).abs() < 1e-6
                })
                .collect();
            if candidates.len() < pp.count as usize {
                return Err(PlanError::ConfigurationConflict(format!(
                    "price point {} @ {} needs {} players, only {} exist",
                    pp.position,
                    pp.price,
                    pp.count,
                    candidates.len()
                )));
            }
            self.model.ge(
                "price_point",
                LinExpr::sum(candidates.iter().map(|&p| v.squad[0][p])),
                f64::from(pp.count),
            );
        }
        Ok(())
    }

    fn transfer_options(&mut self) {
        let v = self.vars;
        let transfers = &self.config.transfers;
        let weeks = self.data.horizon();

        for booked in &transfers.booked {
            let Some(t) = self.data.week_of(booked.gw) else {
                continue;
            };
            if let Some(p) = booked.buy.and_then(|id| self.data.index_of(id)) {
                self.model.set_lower(v.transfer_in[t][p], 1.0);
            }
            if let Some(p) = booked.sell.and_then(|id| self.data.index_of(id)) {
                self.model.ge("booked_sell", v.sold(t, p), 1.0);
            }
        }

        let frozen: BTreeSet<usize> = transfers
            .no_transfer_gws
            .iter()
            .filter_map(|gw| self.data.week_of(*gw))
            .collect();
        for &t in &frozen {
            for p in self.players() {
                self.model.set_upper(v.transfer_in[t][p], 0.0);
                self.model.set_upper(v.out_regular[t][p], 0.0);
                if let Some(first) = v.out_first[t][p] {
                    self.model.set_upper(first, 0.0);
                }
            }
        }

        if let Some(limit) = transfers.hit_limit {
            self.model.le(
                "hit_limit",
                LinExpr::sum(v.penalized.iter().copied()),
                f64::from(limit),
            );
        }
        if let Some(limit) = transfers.weekly_hit_limit {
            for t in 0..weeks {
                self.model.set_upper(v.penalized[t], f64::from(limit));
            }
        }
        if let Some(limit) = transfers.future_transfer_limit {
            if weeks > 1 {
                self.model.le(
                    "future_transfer_limit",
                    LinExpr::sum(v.charged[1..].iter().copied()),
                    f64::from(limit),
                );
            }
        }
    }

    /// Starters from clubs meeting each other. Returns objective penalties.
    fn opposing_play(&mut self) -> Vec<Penalty> {
        let (weight, group, forbid) = match &self.config.roster.opposing_play {
            OpposingPlay::Allow => return Vec::new(),
            OpposingPlay::Penalize { weight, group } => (*weight, *group, false),
            OpposingPlay::Forbid { group } => (0.0, *group, true),
        };
        let v = self.vars;
        let big_m = SQUAD_SIZE as f64;
        let mut penalties = Vec::new();

        for (i, fixture) in self.data.fixtures.iter().enumerate() {
            let t = fixture.week;
            let side = |club: usize, attack: Option<bool>| -> Vec<usize> {
                self.at_club(club)
                    .into_iter()
                    .filter(|&p| match attack {
                        None => true,
                        Some(true) => !self.data.players[p].position.is_defensive(),
                        Some(false) => self.data.players[p].position.is_defensive(),
                    })
                    .collect()
            };
            let pairings = match group {
                OpposingGroup::All => vec![(side(fixture.home, None), side(fixture.away, None))],
                OpposingGroup::AttackVsDefence => vec![
                    (side(fixture.home, Some(true)), side(fixture.away, Some(false))),
                    (side(fixture.away, Some(true)), side(fixture.home, Some(false))),
                ],
            };

            for (k, (a, b)) in pairings.into_iter().enumerate() {
                if a.is_empty() || b.is_empty() {
                    continue;
                }
                let gw = self.gw(t);
                let any_a = self.model.binary(format!("opp_a[{gw}][{i}][{k}]"));
                let any_b = self.model.binary(format!("opp_b[{gw}][{i}][{k}]"));
                for (flag, members) in [(any_a, &a), (any_b, &b)] {
                    let mut row = LinExpr::from(flag) * big_m;
                    for &p in members {
                        row.add_term(v.lineup[t][p], -1.0);
                    }
                    self.model.ge("opposing_side", row, 0.0);
                }
                if forbid {
                    self.model.le("opposing_forbid", LinExpr::sum([any_a, any_b]), 1.0);
                } else {
                    // Forced up when both sides start; never forced down.
                    let clash = self.model.binary(format!("opp_clash[{gw}][{i}][{k}]"));
                    self.model.ge(
                        "opposing_clash",
                        LinExpr::from(clash) - LinExpr::sum([any_a, any_b]),
                        -1.0,
                    );
                    penalties.push(Penalty {
                        week: t,
                        var: clash,
                        weight,
                    });
                }
            }
        }
        penalties
    }
}
