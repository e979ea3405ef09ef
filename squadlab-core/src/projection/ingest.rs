//! CSV ingest for projection and fixture tables.
//!
//! Projection layout: `id,name,pos,team,price` followed by any number of
//! `<gw>_pts` and `<gw>_xmins` columns. Header matching is case-insensitive.
//! Blank cells leave the gameweek unprojected for that player.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Read;

use thiserror::Error;

use super::table::{Fixture, PlayerProjection, ProjectionTable};
use crate::domain::{Gameweek, PlayerId, Position};

/// Errors from reading projection or fixture CSVs.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: unknown position '{value}'")]
    UnknownPosition { row: usize, value: String },

    #[error("duplicate player id {0}")]
    DuplicatePlayer(PlayerId),
}

enum ColumnKind {
    Points(Gameweek),
    Minutes(Gameweek),
}

fn classify(header: &str) -> Option<ColumnKind> {
    let lower = header.to_ascii_lowercase();
    if let Some(gw) = lower.strip_suffix("_pts") {
        return gw.parse().ok().map(ColumnKind::Points);
    }
    if let Some(gw) = lower.strip_suffix("_xmins") {
        return gw.parse().ok().map(ColumnKind::Minutes);
    }
    None
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize, ProjectionError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| ProjectionError::MissingColumn(name.to_string()))
}

fn parse_f64(row: usize, column: &str, value: &str) -> Result<f64, ProjectionError> {
    value.parse().map_err(|_| ProjectionError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Read a projection table from CSV.
pub fn read_projections<R: Read>(reader: R) -> Result<ProjectionTable, ProjectionError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let id_col = find_column(&headers, "id")?;
    let name_col = find_column(&headers, "name")?;
    let pos_col = find_column(&headers, "pos")?;
    let team_col = find_column(&headers, "team")?;
    let price_col = find_column(&headers, "price")?;

    let gw_columns: Vec<(usize, ColumnKind)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| classify(h).map(|kind| (i, kind)))
        .collect();

    let mut point_columns = BTreeSet::new();
    let mut minute_columns = BTreeSet::new();
    for (_, kind) in &gw_columns {
        match kind {
            ColumnKind::Points(gw) => point_columns.insert(*gw),
            ColumnKind::Minutes(gw) => minute_columns.insert(*gw),
        };
    }

    let mut players = Vec::new();
    let mut seen = HashSet::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // 1-based data rows after the header line.
        let row = i + 2;
        let field = |col: usize| record.get(col).unwrap_or("");

        let id = PlayerId(field(id_col).parse().map_err(|_| ProjectionError::InvalidValue {
            row,
            column: "id".into(),
            value: field(id_col).to_string(),
        })?);
        if !seen.insert(id) {
            return Err(ProjectionError::DuplicatePlayer(id));
        }
        let position =
            Position::parse(field(pos_col)).ok_or_else(|| ProjectionError::UnknownPosition {
                row,
                value: field(pos_col).to_string(),
            })?;
        let price = parse_f64(row, "price", field(price_col))?;

        let mut points = BTreeMap::new();
        let mut minutes = BTreeMap::new();
        for (col, kind) in &gw_columns {
            let raw = field(*col);
            if raw.is_empty() {
                continue;
            }
            let header = headers.get(*col).unwrap_or_default();
            let value = parse_f64(row, header, raw)?;
            match kind {
                ColumnKind::Points(gw) => points.insert(*gw, value),
                ColumnKind::Minutes(gw) => minutes.insert(*gw, value),
            };
        }

        players.push(PlayerProjection {
            id,
            name: field(name_col).to_string(),
            position,
            club: field(team_col).to_string(),
            price,
            points,
            minutes,
        });
    }

    tracing::debug!(
        event = "projections_loaded",
        players = players.len(),
        gameweeks = point_columns.len()
    );
    Ok(ProjectionTable::with_columns(
        players,
        point_columns,
        minute_columns,
    ))
}

/// Read a fixture list (`gw,home,away`) from CSV.
pub fn read_fixtures<R: Read>(reader: R) -> Result<Vec<Fixture>, ProjectionError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let gw_col = find_column(&headers, "gw")?;
    let home_col = find_column(&headers, "home")?;
    let away_col = find_column(&headers, "away")?;

    let mut fixtures = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 2;
        let field = |col: usize| record.get(col).unwrap_or("");
        let gameweek = field(gw_col)
            .parse()
            .map_err(|_| ProjectionError::InvalidValue {
                row,
                column: "gw".into(),
                value: field(gw_col).to_string(),
            })?;
        fixtures.push(Fixture {
            gameweek,
            home: field(home_col).to_string(),
            away: field(away_col).to_string(),
        });
    }
    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ID,Name,Pos,Team,Price,10_Pts,10_xMins,11_Pts,11_xMins
1,Raya,GKP,ARS,55,4.1,90,3.9,90
2,Saka,M,ARS,100,6.2,85,,80
";

    #[test]
    fn reads_static_columns_and_gameweeks() {
        let table = read_projections(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let raya = table.get(PlayerId(1)).unwrap();
        assert_eq!(raya.position, Position::Goalkeeper);
        assert_eq!(raya.club, "ARS");
        assert_eq!(raya.points_at(11), Some(3.9));
        assert!(table.has_points_column(10));
        assert!(table.has_minutes_column(11));
        assert!(!table.has_points_column(12));
    }

    #[test]
    fn blank_cell_means_missing_projection() {
        let table = read_projections(SAMPLE.as_bytes()).unwrap();
        let saka = table.get(PlayerId(2)).unwrap();
        assert_eq!(saka.points_at(11), None);
        assert_eq!(saka.minutes_at(11), Some(80.0));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = read_projections("id,name,pos,team\n1,a,G,X\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::MissingColumn(c) if c == "price"));
    }

    #[test]
    fn bad_position_is_reported_with_row() {
        let err = read_projections("id,name,pos,team,price\n1,a,Q,X,40\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::UnknownPosition { row: 2, .. }));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let csv = "id,name,pos,team,price\n1,a,G,X,40\n1,b,D,Y,40\n";
        let err = read_projections(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::DuplicatePlayer(PlayerId(1))));
    }

    #[test]
    fn reads_fixtures() {
        let fixtures = read_fixtures("gw,home,away\n10,ARS,CHE\n11,CHE,LIV\n".as_bytes()).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].home, "ARS");
        assert_eq!(fixtures[1].gameweek, 11);
    }
}
