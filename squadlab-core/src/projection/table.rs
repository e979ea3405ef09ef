use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{Club, Gameweek, PlayerId, Position};

/// Static attributes plus per-gameweek projections for one player.
///
/// A gameweek missing from `points` or `minutes` means "no projection", not
/// zero; the encoder refuses to plan over such gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProjection {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub club: Club,
    /// Current market (buy) price.
    pub price: f64,
    pub points: BTreeMap<Gameweek, f64>,
    pub minutes: BTreeMap<Gameweek, f64>,
}

impl PlayerProjection {
    pub fn points_at(&self, gw: Gameweek) -> Option<f64> {
        self.points.get(&gw).copied()
    }

    pub fn minutes_at(&self, gw: Gameweek) -> Option<f64> {
        self.minutes.get(&gw).copied()
    }

    /// Sum of projected points over the given gameweeks (missing weeks count 0).
    pub fn total_points(&self, gws: &[Gameweek]) -> f64 {
        gws.iter().filter_map(|gw| self.points_at(*gw)).sum()
    }

    pub fn total_minutes(&self, gws: &[Gameweek]) -> f64 {
        gws.iter().filter_map(|gw| self.minutes_at(*gw)).sum()
    }
}

/// One scheduled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub gameweek: Gameweek,
    pub home: Club,
    pub away: Club,
}

/// The projection table with column coverage bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionTable {
    players: Vec<PlayerProjection>,
    #[serde(default)]
    fixtures: Vec<Fixture>,
    /// Gameweeks with a points column.
    point_columns: BTreeSet<Gameweek>,
    /// Gameweeks with a minutes column.
    minute_columns: BTreeSet<Gameweek>,
    #[serde(skip)]
    index: HashMap<PlayerId, usize>,
}

impl ProjectionTable {
    /// Build a table; column coverage is the union of gameweeks seen.
    pub fn new(players: Vec<PlayerProjection>) -> Self {
        let point_columns = players
            .iter()
            .flat_map(|p| p.points.keys().copied())
            .collect();
        let minute_columns = players
            .iter()
            .flat_map(|p| p.minutes.keys().copied())
            .collect();
        Self::with_columns(players, point_columns, minute_columns)
    }

    /// Build a table with explicit column coverage (as read from a header).
    pub fn with_columns(
        players: Vec<PlayerProjection>,
        point_columns: BTreeSet<Gameweek>,
        minute_columns: BTreeSet<Gameweek>,
    ) -> Self {
        let index = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        Self {
            players,
            fixtures: Vec::new(),
            point_columns,
            minute_columns,
            index,
        }
    }

    pub fn with_fixtures(mut self, fixtures: Vec<Fixture>) -> Self {
        self.fixtures = fixtures;
        self
    }

    pub fn players(&self) -> &[PlayerProjection] {
        &self.players
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerProjection> {
        match self.index.get(&id) {
            Some(&i) => self.players.get(i),
            // Deserialized tables have no index until rebuilt.
            None => self.players.iter().find(|p| p.id == id),
        }
    }

    pub fn has_points_column(&self, gw: Gameweek) -> bool {
        self.point_columns.contains(&gw)
    }

    pub fn has_minutes_column(&self, gw: Gameweek) -> bool {
        self.minute_columns.contains(&gw)
    }

    /// Earliest gameweek with a points column.
    pub fn first_gameweek(&self) -> Option<Gameweek> {
        self.point_columns.iter().next().copied()
    }

    pub fn point_columns(&self) -> impl Iterator<Item = Gameweek> + '_ {
        self.point_columns.iter().copied()
    }

    /// Replace every player's points, keeping column coverage.
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&PlayerProjection, Gameweek, f64) -> f64,
    {
        let players = self
            .players
            .iter()
            .map(|p| {
                let mut q = p.clone();
                q.points = p.points.iter().map(|(&gw, &xp)| (gw, f(p, gw, xp))).collect();
                q
            })
            .collect();
        let mut table = Self::with_columns(
            players,
            self.point_columns.clone(),
            self.minute_columns.clone(),
        );
        table.fixtures = self.fixtures.clone();
        table
    }
}
