//! Decision variables of the planning model.
//!
//! Arrays are week-major: `x[t][p]` with `t` the offset from `next_gw` and
//! `p` the index into `PlanningData::players`. Variables that can never be
//! non-zero (Free Hit squad without a usable Free Hit, bench slots a position
//! may not occupy, first sales of unmodified players) are not created at all;
//! accessors return `None` for them.

use crate::domain::{Chip, Position, BENCH_SLOTS, SQUAD_SIZE};
use crate::encoder::PlanningData;
use crate::mip::{LinExpr, MipModel, VarId};
use crate::transitions::{MAX_FREE_TRANSFERS, MIN_FREE_TRANSFERS};

/// Number of one-hot free-transfer states (1..=5).
pub const FT_STATES: usize = MAX_FREE_TRANSFERS as usize;

#[derive(Debug, Clone)]
pub struct PlanVars {
    /// Squad at the boundary gameweek `next_gw - 1`. Fixed unless pre-season.
    pub initial: Vec<VarId>,
    /// Pre-season only: bank left after picking the boundary squad.
    pub initial_bank: Option<VarId>,
    pub squad: Vec<Vec<VarId>>,
    pub squad_fh: Vec<Vec<Option<VarId>>>,
    pub lineup: Vec<Vec<VarId>>,
    pub bench: Vec<Vec<[Option<VarId>; BENCH_SLOTS]>>,
    pub captain: Vec<Vec<VarId>>,
    pub vicecap: Vec<Vec<VarId>>,
    pub transfer_in: Vec<Vec<VarId>>,
    pub out_first: Vec<Vec<Option<VarId>>>,
    pub out_regular: Vec<Vec<VarId>>,
    pub bank: Vec<VarId>,
    /// `free_transfers[t]` for `t` in `0..=horizon`; the last entry values the
    /// roll out of the final week.
    pub free_transfers: Vec<VarId>,
    pub ft_below: Vec<VarId>,
    pub ft_above: Vec<VarId>,
    /// `ft_state[t][s - 1]` is set when `free_transfers[t + 1] == s`.
    pub ft_state: Vec<[VarId; FT_STATES]>,
    pub charged: Vec<VarId>,
    pub penalized: Vec<VarId>,
    /// Set when `charged` exceeds the free transfers, so `penalized > 0` is allowed.
    pub over_free: Vec<VarId>,
    pub use_wc: Vec<Option<VarId>>,
    pub use_fh: Vec<Option<VarId>>,
    pub use_bb: Vec<Option<VarId>>,
    pub use_tc: Vec<Option<VarId>>,
    /// Triple captain attached to player `p` in week `t`.
    pub tc_captain: Vec<Vec<Option<VarId>>>,
}

impl PlanVars {
    /// Declare every variable with its natural bounds.
    pub fn declare(model: &mut MipModel, data: &PlanningData) -> Self {
        let weeks = data.horizon();
        let players = &data.players;
        let gw = |t: usize| data.gameweeks[t];

        let initial = players
            .iter()
            .map(|p| model.binary(format!("squad[{}][{}]", data.next_gw - 1, p.id)))
            .collect();
        let initial_bank = data
            .preseason
            .then(|| model.continuous("bank_initial", 0.0, f64::INFINITY));

        let per_player = |model: &mut MipModel, name: &str| -> Vec<Vec<VarId>> {
            (0..weeks)
                .map(|t| {
                    players
                        .iter()
                        .map(|p| model.binary(format!("{name}[{}][{}]", gw(t), p.id)))
                        .collect()
                })
                .collect()
        };

        let squad = per_player(model, "squad");
        let lineup = per_player(model, "lineup");
        let captain = per_player(model, "captain");
        let vicecap = per_player(model, "vicecap");
        let transfer_in = per_player(model, "transfer_in");
        let out_regular = per_player(model, "out_regular");

        let fh_plan = data.chip(Chip::FreeHit);
        let squad_fh = (0..weeks)
            .map(|t| {
                players
                    .iter()
                    .map(|p| {
                        fh_plan
                            .usable_at(t)
                            .then(|| model.binary(format!("squad_fh[{}][{}]", gw(t), p.id)))
                    })
                    .collect()
            })
            .collect();

        let bench = (0..weeks)
            .map(|t| {
                players
                    .iter()
                    .map(|p| {
                        let mut slots = [None; BENCH_SLOTS];
                        for (o, slot) in slots.iter_mut().enumerate() {
                            let keeper_slot = o == 0;
                            if keeper_slot == (p.position == Position::Goalkeeper) {
                                *slot = Some(model.binary(format!("bench[{}][{}][{o}]", gw(t), p.id)));
                            }
                        }
                        slots
                    })
                    .collect()
            })
            .collect();

        let out_first = (0..weeks)
            .map(|t| {
                players
                    .iter()
                    .map(|p| {
                        p.price_modified
                            .then(|| model.binary(format!("out_first[{}][{}]", gw(t), p.id)))
                    })
                    .collect()
            })
            .collect();

        let bank = (0..weeks)
            .map(|t| model.continuous(format!("bank[{}]", gw(t)), 0.0, f64::INFINITY))
            .collect();

        let min_ft = f64::from(MIN_FREE_TRANSFERS);
        let max_ft = f64::from(MAX_FREE_TRANSFERS);
        let free_transfers = (0..=weeks)
            .map(|t| {
                let name = format!("free_transfers[{}]", data.next_gw + t as u32);
                if t == 0 {
                    model.integer(name, 0.0, max_ft)
                } else {
                    model.integer(name, min_ft, max_ft)
                }
            })
            .collect();
        let ft_below = (0..weeks)
            .map(|t| model.binary(format!("ft_below[{}]", gw(t))))
            .collect();
        let ft_above = (0..weeks)
            .map(|t| model.binary(format!("ft_above[{}]", gw(t))))
            .collect();
        let ft_state = (0..weeks)
            .map(|t| std::array::from_fn(|s| model.binary(format!("ft_state[{}][{}]", gw(t) + 1, s + 1))))
            .collect();

        let squad_max = SQUAD_SIZE as f64;
        let charged = (0..weeks)
            .map(|t| model.integer(format!("charged[{}]", gw(t)), 0.0, squad_max))
            .collect();
        let penalized = (0..weeks)
            .map(|t| model.integer(format!("penalized[{}]", gw(t)), 0.0, squad_max))
            .collect();
        let over_free = (0..weeks)
            .map(|t| model.binary(format!("over_free[{}]", gw(t))))
            .collect();

        let mut chip_vars = |chip: Chip| -> Vec<Option<VarId>> {
            let plan = data.chip(chip);
            (0..weeks)
                .map(|t| {
                    plan.usable_at(t)
                        .then(|| model.binary(format!("use_{}[{}]", chip.code().to_lowercase(), gw(t))))
                })
                .collect()
        };
        let use_wc = chip_vars(Chip::Wildcard);
        let use_fh = chip_vars(Chip::FreeHit);
        let use_bb = chip_vars(Chip::BenchBoost);
        let use_tc = chip_vars(Chip::TripleCaptain);

        let tc_plan = data.chip(Chip::TripleCaptain);
        let tc_captain = (0..weeks)
            .map(|t| {
                players
                    .iter()
                    .map(|p| {
                        tc_plan
                            .usable_at(t)
                            .then(|| model.binary(format!("tc_captain[{}][{}]", gw(t), p.id)))
                    })
                    .collect()
            })
            .collect();

        Self {
            initial,
            initial_bank,
            squad,
            squad_fh,
            lineup,
            bench,
            captain,
            vicecap,
            transfer_in,
            out_first,
            out_regular,
            bank,
            free_transfers,
            ft_below,
            ft_above,
            ft_state,
            charged,
            penalized,
            over_free,
            use_wc,
            use_fh,
            use_bb,
            use_tc,
            tc_captain,
        }
    }

    pub fn weeks(&self) -> usize {
        self.squad.len()
    }

    pub fn chip_var(&self, chip: Chip, t: usize) -> Option<VarId> {
        let column = match chip {
            Chip::Wildcard => &self.use_wc,
            Chip::FreeHit => &self.use_fh,
            Chip::BenchBoost => &self.use_bb,
            Chip::TripleCaptain => &self.use_tc,
        };
        column.get(t).copied().flatten()
    }

    /// Chip indicator as an expression (empty when the chip is unusable).
    pub fn chip_expr(&self, chip: Chip, t: usize) -> LinExpr {
        LinExpr::sum(self.chip_var(chip, t))
    }

    /// `wc(t) + fh(t)`.
    pub fn reset_expr(&self, t: usize) -> LinExpr {
        self.chip_expr(Chip::Wildcard, t) + self.chip_expr(Chip::FreeHit, t)
    }

    /// Squad in the week before `t` (the boundary squad for `t = 0`).
    pub fn prev_squad(&self, t: usize, p: usize) -> VarId {
        if t == 0 {
            self.initial[p]
        } else {
            self.squad[t - 1][p]
        }
    }

    /// Bank entering week `t`, as an expression with the supplied constant
    /// for the boundary week.
    pub fn prev_bank(&self, t: usize, initial_bank: f64) -> LinExpr {
        if t > 0 {
            return LinExpr::from(self.bank[t - 1]);
        }
        match self.initial_bank {
            Some(var) => LinExpr::from(var),
            None => LinExpr::constant(initial_bank),
        }
    }

    /// `out_first + out_regular` for one player and week.
    pub fn sold(&self, t: usize, p: usize) -> LinExpr {
        let mut expr = LinExpr::from(self.out_regular[t][p]);
        if let Some(first) = self.out_first[t][p] {
            expr.add_term(first, 1.0);
        }
        expr
    }

    /// Total sales in week `t` (the transfer count `n(t)`).
    pub fn transfers(&self, t: usize) -> LinExpr {
        let mut expr = LinExpr::new();
        for p in 0..self.squad[t].len() {
            expr += self.sold(t, p);
        }
        expr
    }

    pub fn bench_slots(&self, t: usize, p: usize) -> impl Iterator<Item = (usize, VarId)> + '_ {
        self.bench[t][p]
            .iter()
            .enumerate()
            .filter_map(|(o, v)| v.map(|v| (o, v)))
    }
}
