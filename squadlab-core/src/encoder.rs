//! Roster/eligibility encoder.
//!
//! Turns the projection table, the current squad state and the configuration
//! into the read-only index sets the model builder works from. Everything that
//! can be rejected without a solver is rejected here: missing projection
//! columns, missing players, contradictory options, malformed squads.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::PlannerConfig;
use crate::domain::{Chip, Gameweek, PlayerId, Position, SquadState, SQUAD_SIZE};
use crate::error::{MissingData, PlanError};
use crate::projection::{PlayerProjection, ProjectionTable};

/// Sell prices within this distance of the buy price are treated as equal.
const PRICE_EPS: f64 = 1e-6;

/// Static attributes of one player in the planning pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEntry {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub club: String,
    /// Index into [`PlanningData::clubs`].
    pub club_idx: usize,
    pub buy_price: f64,
    /// What the game pays on sale. Equals `buy_price` unless price-modified.
    pub sell_price: f64,
    /// Owned with a sell price below the current price.
    pub price_modified: bool,
    pub owned: bool,
    /// Expected points per planned week (index `t` = `gameweeks[t]`).
    pub points: Vec<f64>,
    pub minutes: Vec<f64>,
}

impl PlayerEntry {
    pub fn horizon_points(&self) -> f64 {
        self.points.iter().sum()
    }

    /// Price used to value this player in a Free Hit affordability check.
    pub fn free_hit_sell_value(&self) -> f64 {
        if self.price_modified {
            self.sell_price
        } else {
            self.buy_price
        }
    }
}

/// Resolved usage rule for one chip over the horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipPlan {
    pub cap: u32,
    /// Per planned week: may the chip be played?
    pub allowed: Vec<bool>,
    /// Per planned week: must the chip be played?
    pub forced: Vec<bool>,
}

impl ChipPlan {
    fn unavailable(weeks: usize) -> Self {
        Self {
            cap: 0,
            allowed: vec![false; weeks],
            forced: vec![false; weeks],
        }
    }

    /// Whether the chip can be played at all in this horizon.
    pub fn usable(&self) -> bool {
        self.cap > 0 && self.allowed.iter().any(|a| *a)
    }

    pub fn usable_at(&self, t: usize) -> bool {
        self.cap > 0 && self.allowed.get(t).copied().unwrap_or(false)
    }
}

/// A fixture inside the horizon, in pool-club indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekFixture {
    pub week: usize,
    pub home: usize,
    pub away: usize,
}

/// Everything the model builder needs, fixed before any variable exists.
#[derive(Debug, Clone)]
pub struct PlanningData {
    pub next_gw: Gameweek,
    /// Planned gameweeks; index `t` throughout the model.
    pub gameweeks: Vec<Gameweek>,
    pub players: Vec<PlayerEntry>,
    pub clubs: Vec<String>,
    pub initial_bank: f64,
    pub initial_free_transfers: u8,
    pub preseason: bool,
    /// Total budget, binding only in pre-season.
    pub budget: f64,
    pub chips: BTreeMap<Chip, ChipPlan>,
    /// Players exempt from pruning.
    pub safe: BTreeSet<PlayerId>,
    /// Players dropped by pruning or for a gap in their projections.
    pub pruned: Vec<PlayerId>,
    pub fixtures: Vec<WeekFixture>,
    index: HashMap<PlayerId, usize>,
}

impl PlanningData {
    pub fn horizon(&self) -> usize {
        self.gameweeks.len()
    }

    pub fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn week_of(&self, gw: Gameweek) -> Option<usize> {
        self.gameweeks.iter().position(|g| *g == gw)
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerEntry> {
        self.index_of(id).map(|i| &self.players[i])
    }

    pub fn chip(&self, chip: Chip) -> &ChipPlan {
        &self.chips[&chip]
    }

    /// Indices of price-modified players.
    pub fn price_modified(&self) -> impl Iterator<Item = usize> + '_ {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.price_modified)
            .map(|(i, _)| i)
    }
}

/// Build the planning data, or fail before any model is constructed.
pub fn encode(
    table: &ProjectionTable,
    state: &SquadState,
    config: &PlannerConfig,
) -> Result<PlanningData, PlanError> {
    config.validate()?;

    let next_gw = match config.next_gw {
        Some(gw) => gw,
        None => table
            .first_gameweek()
            .ok_or(PlanError::DataUnavailable(MissingData::EmptyTable))?,
    };
    let gameweeks = config.horizon_gameweeks(next_gw);
    if gameweeks.is_empty() {
        return Err(PlanError::ConfigurationConflict(format!(
            "GW{next_gw} is past season end GW{}",
            config.season_end_gw
        )));
    }
    for &gw in &gameweeks {
        if !table.has_points_column(gw) {
            return Err(PlanError::DataUnavailable(MissingData::Column {
                gameweek: gw,
                column: "points",
            }));
        }
        if !table.has_minutes_column(gw) {
            return Err(PlanError::DataUnavailable(MissingData::Column {
                gameweek: gw,
                column: "minutes",
            }));
        }
    }

    check_required_players(table, state, config)?;
    check_conflicts(config, &gameweeks)?;
    if !state.is_preseason() {
        check_initial_squad(table, state, config)?;
    }
    let chips = resolve_chips(state, config, &gameweeks)?;

    let safe = safe_set(table, state, config, &gameweeks);
    let required: HashMap<PlayerId, &'static str> =
        required_players(state, config).into_iter().collect();
    let mut pruned = Vec::new();
    let mut kept: Vec<(&PlayerProjection, HorizonValues)> = Vec::new();
    let survivors = prune(table, config, &gameweeks, &safe);
    for p in table.players() {
        if !survivors.contains(&p.id) {
            pruned.push(p.id);
            continue;
        }
        match horizon_values(p, &gameweeks) {
            Ok(values) => kept.push((p, values)),
            Err((gameweek, column)) => {
                if let Some(&role) = required.get(&p.id) {
                    return Err(PlanError::DataUnavailable(MissingData::Cell {
                        player: p.id,
                        role,
                        gameweek,
                        column,
                    }));
                }
                tracing::debug!(event = "projection_gap", player = %p.id, gameweek, column);
                pruned.push(p.id);
            }
        }
    }

    let clubs: Vec<String> = kept
        .iter()
        .map(|(p, _)| p.club.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let club_index: HashMap<&str, usize> = clubs
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let players: Vec<PlayerEntry> = kept
        .into_iter()
        .map(|(p, (points, minutes))| {
            let owned = state.owned_player(p.id);
            let sell_price = owned.map_or(p.price, |o| o.selling_price);
            PlayerEntry {
                id: p.id,
                name: p.name.clone(),
                position: p.position,
                club: p.club.clone(),
                club_idx: club_index[p.club.as_str()],
                buy_price: p.price,
                sell_price,
                price_modified: owned.is_some() && sell_price < p.price - PRICE_EPS,
                owned: owned.is_some(),
                points,
                minutes,
            }
        })
        .collect();
    let index = players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();

    let fixtures = table
        .fixtures()
        .iter()
        .filter_map(|f| {
            let week = gameweeks.iter().position(|gw| *gw == f.gameweek)?;
            Some(WeekFixture {
                week,
                home: *club_index.get(f.home.as_str())?,
                away: *club_index.get(f.away.as_str())?,
            })
        })
        .collect();

    tracing::info!(
        event = "encoded",
        next_gw,
        horizon = gameweeks.len(),
        players = players.len(),
        pruned = pruned.len(),
        safe = safe.len(),
        preseason = state.is_preseason()
    );

    Ok(PlanningData {
        next_gw,
        gameweeks,
        players,
        clubs,
        initial_bank: state.bank,
        initial_free_transfers: state.free_transfers,
        preseason: state.is_preseason(),
        budget: state.budget,
        chips,
        safe,
        pruned,
        fixtures,
        index,
    })
}

/// Points and minutes per planned week.
type HorizonValues = (Vec<f64>, Vec<f64>);

/// A player's projections over the horizon, or the first missing cell.
fn horizon_values(
    p: &PlayerProjection,
    gameweeks: &[Gameweek],
) -> Result<HorizonValues, (Gameweek, &'static str)> {
    let mut points = Vec::with_capacity(gameweeks.len());
    let mut minutes = Vec::with_capacity(gameweeks.len());
    for &gw in gameweeks {
        points.push(p.points_at(gw).ok_or((gw, "points"))?);
        minutes.push(p.minutes_at(gw).ok_or((gw, "minutes"))?);
    }
    Ok((points, minutes))
}

/// Players the plan must account for, with the role that requires them.
fn required_players(state: &SquadState, config: &PlannerConfig) -> Vec<(PlayerId, &'static str)> {
    let roster = &config.roster;
    state
        .owned
        .iter()
        .map(|o| (o.id, "owned"))
        .chain(roster.locked.iter().map(|id| (*id, "locked")))
        .chain(roster.locked_next_gw.iter().map(|id| (*id, "locked")))
        .chain(
            config
                .transfers
                .booked
                .iter()
                .flat_map(|b| b.buy.into_iter().chain(b.sell))
                .map(|id| (id, "booked")),
        )
        .collect()
}

fn check_required_players(
    table: &ProjectionTable,
    state: &SquadState,
    config: &PlannerConfig,
) -> Result<(), PlanError> {
    for (player, role) in required_players(state, config) {
        if table.get(player).is_none() {
            return Err(PlanError::DataUnavailable(MissingData::Player { player, role }));
        }
    }
    Ok(())
}

fn conflict(msg: String) -> PlanError {
    PlanError::ConfigurationConflict(msg)
}

fn check_conflicts(config: &PlannerConfig, gameweeks: &[Gameweek]) -> Result<(), PlanError> {
    let roster = &config.roster;
    let banned: BTreeSet<PlayerId> = roster.banned.iter().copied().collect();
    let banned_next: BTreeSet<PlayerId> = roster.banned_next_gw.iter().copied().collect();
    let locked: BTreeSet<PlayerId> = roster.locked.iter().copied().collect();
    let locked_next: BTreeSet<PlayerId> = roster.locked_next_gw.iter().copied().collect();

    if let Some(id) = banned.intersection(&locked).next() {
        return Err(conflict(format!("player {id} is both banned and locked")));
    }
    if let Some(id) = banned.intersection(&locked_next).next() {
        return Err(conflict(format!("player {id} is banned but locked for next GW")));
    }
    if let Some(id) = banned_next.intersection(&locked).next() {
        return Err(conflict(format!("player {id} is locked but banned for next GW")));
    }
    if let Some(id) = banned_next.intersection(&locked_next).next() {
        return Err(conflict(format!("player {id} is both banned and locked for next GW")));
    }

    let next_gw = gameweeks[0];
    for booked in &config.transfers.booked {
        if !gameweeks.contains(&booked.gw) {
            return Err(conflict(format!(
                "booked transfer in GW{} is outside the horizon",
                booked.gw
            )));
        }
        if config.transfers.no_transfer_gws.contains(&booked.gw) {
            return Err(conflict(format!(
                "booked transfer in GW{} which allows no transfers",
                booked.gw
            )));
        }
        if let Some(buy) = booked.buy {
            if banned.contains(&buy) || (booked.gw == next_gw && banned_next.contains(&buy)) {
                return Err(conflict(format!("booked buy of banned player {buy}")));
            }
        }
        if let Some(sell) = booked.sell {
            if locked.contains(&sell) || (booked.gw == next_gw && locked_next.contains(&sell)) {
                return Err(conflict(format!("booked sale of locked player {sell}")));
            }
        }
        if let (Some(buy), Some(sell)) = (booked.buy, booked.sell) {
            if buy == sell {
                return Err(conflict(format!(
                    "player {buy} booked to be bought and sold in GW{}",
                    booked.gw
                )));
            }
        }
    }
    Ok(())
}

fn check_initial_squad(
    table: &ProjectionTable,
    state: &SquadState,
    config: &PlannerConfig,
) -> Result<(), PlanError> {
    if state.owned.len() != SQUAD_SIZE {
        return Err(conflict(format!(
            "current squad has {} players, expected {SQUAD_SIZE}",
            state.owned.len()
        )));
    }
    let distinct: BTreeSet<PlayerId> = state.owned.iter().map(|o| o.id).collect();
    if distinct.len() != SQUAD_SIZE {
        return Err(conflict("current squad lists a player twice".into()));
    }

    let mut by_position: BTreeMap<Position, usize> = BTreeMap::new();
    let mut by_club: BTreeMap<&str, u32> = BTreeMap::new();
    for owned in &state.owned {
        // Presence was checked by check_required_players.
        if let Some(p) = table.get(owned.id) {
            *by_position.entry(p.position).or_default() += 1;
            *by_club.entry(p.club.as_str()).or_default() += 1;
        }
    }
    for pos in Position::ALL {
        let have = by_position.get(&pos).copied().unwrap_or(0);
        if have != pos.squad_quota() {
            return Err(conflict(format!(
                "current squad has {have} {pos} players, expected {}",
                pos.squad_quota()
            )));
        }
    }
    if let Some((club, n)) = by_club
        .iter()
        .find(|(_, n)| **n > config.roster.team_limit)
    {
        return Err(conflict(format!(
            "current squad has {n} players from {club}, limit is {}",
            config.roster.team_limit
        )));
    }
    Ok(())
}

fn resolve_chips(
    state: &SquadState,
    config: &PlannerConfig,
    gameweeks: &[Gameweek],
) -> Result<BTreeMap<Chip, ChipPlan>, PlanError> {
    let weeks = gameweeks.len();
    let next_gw = gameweeks[0];
    let mut forced_at: BTreeMap<Gameweek, Chip> = BTreeMap::new();
    let mut plans = BTreeMap::new();

    if let Some(active) = state.active_chip {
        let rule = config.chips.rule(active);
        if !rule.allowed_gws.is_empty() && !rule.allowed_gws.contains(&next_gw) {
            return Err(conflict(format!(
                "{active} is active for GW{next_gw} but not allowed there"
            )));
        }
    }

    for chip in Chip::ALL {
        let rule = config.chips.rule(chip);
        let mut forced: BTreeSet<Gameweek> = rule.forced_gws.iter().copied().collect();
        if state.active_chip == Some(chip) {
            forced.insert(next_gw);
        }
        let available = state.chip_available(chip) || state.active_chip == Some(chip);

        for &gw in &forced {
            if !gameweeks.contains(&gw) {
                return Err(conflict(format!("{chip} forced in GW{gw}, outside the horizon")));
            }
            if !available {
                return Err(conflict(format!("{chip} forced in GW{gw} but not available")));
            }
            if !rule.allowed_gws.is_empty() && !rule.allowed_gws.contains(&gw) {
                return Err(conflict(format!("{chip} forced in GW{gw} outside its allowed weeks")));
            }
            if let Some(other) = forced_at.insert(gw, chip) {
                return Err(conflict(format!("{other} and {chip} both forced in GW{gw}")));
            }
            if config.transfers.no_transfer_gws.contains(&gw) && chip.resets_transfers() {
                return Err(conflict(format!(
                    "{chip} forced in GW{gw}, which allows no transfers"
                )));
            }
        }

        let forced_count = forced.len() as u32;
        if rule.cap > 0 && forced_count > rule.cap {
            return Err(conflict(format!(
                "{chip} forced {forced_count} times but capped at {}",
                rule.cap
            )));
        }

        let plan = if available {
            let cap = rule.cap.max(forced_count);
            ChipPlan {
                cap,
                allowed: gameweeks
                    .iter()
                    .map(|gw| cap > 0 && (rule.allowed_gws.is_empty() || rule.allowed_gws.contains(gw)))
                    .collect(),
                forced: gameweeks.iter().map(|gw| forced.contains(gw)).collect(),
            }
        } else {
            ChipPlan::unavailable(weeks)
        };
        plans.insert(chip, plan);
    }
    Ok(plans)
}

fn safe_set(
    table: &ProjectionTable,
    state: &SquadState,
    config: &PlannerConfig,
    gameweeks: &[Gameweek],
) -> BTreeSet<PlayerId> {
    let roster = &config.roster;
    let mut safe: BTreeSet<PlayerId> = state.owned.iter().map(|o| o.id).collect();
    safe.extend(roster.locked.iter().copied());
    safe.extend(roster.locked_next_gw.iter().copied());
    for booked in &config.transfers.booked {
        safe.extend(booked.buy);
        safe.extend(booked.sell);
    }
    for pp in &roster.price_points {
        safe.extend(
            table
                .players()
                .iter()
                .filter(|p| p.position == pp.position && (p.price - pp.price).abs() < PRICE_EPS)
                .map(|p| p.id),
        );
    }

    let mut by_ev: Vec<(PlayerId, f64)> = table
        .players()
        .iter()
        .map(|p| (p.id, p.total_points(gameweeks)))
        .collect();
    by_ev.sort_by(|a, b| b.1.total_cmp(&a.1));
    let keep = ((by_ev.len() as f64) * config.pruning.keep_top_ev_percent / 100.0).ceil() as usize;
    safe.extend(by_ev.iter().take(keep).map(|(id, _)| *id));
    safe
}

/// Ids that survive pruning.
fn prune(
    table: &ProjectionTable,
    config: &PlannerConfig,
    gameweeks: &[Gameweek],
    safe: &BTreeSet<PlayerId>,
) -> BTreeSet<PlayerId> {
    let pruning = &config.pruning;
    let ratio_cutoff = pruning.ev_per_price_cutoff.and_then(|pct| {
        let mut ratios: Vec<f64> = table
            .players()
            .iter()
            .filter(|p| p.price > 0.0)
            .map(|p| p.total_points(gameweeks) / p.price)
            .collect();
        if ratios.is_empty() {
            return None;
        }
        ratios.sort_by(f64::total_cmp);
        let idx = ((ratios.len() - 1) as f64 * pct / 100.0).floor() as usize;
        Some(ratios[idx])
    });

    table
        .players()
        .iter()
        .filter(|p| {
            if safe.contains(&p.id) {
                return true;
            }
            if let Some(lb) = pruning.xmin_lb {
                if p.total_minutes(gameweeks) < lb {
                    return false;
                }
            }
            if let (Some(cutoff), true) = (ratio_cutoff, p.price > 0.0) {
                if p.total_points(gameweeks) / p.price < cutoff {
                    return false;
                }
            }
            true
        })
        .map(|p| p.id)
        .collect()
}
