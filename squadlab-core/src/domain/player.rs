use serde::{Deserialize, Serialize};
use std::fmt;

/// Players owned entering every gameweek.
pub const SQUAD_SIZE: usize = 15;
/// Starters fielded in a normal gameweek.
pub const LINEUP_SIZE: usize = 11;
/// Ordered bench slots; slot 0 is reserved for the backup goalkeeper.
pub const BENCH_SLOTS: usize = 4;

/// Playing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "G", alias = "GK", alias = "GKP")]
    Goalkeeper,
    #[serde(rename = "D", alias = "DEF")]
    Defender,
    #[serde(rename = "M", alias = "MID")]
    Midfielder,
    #[serde(rename = "F", alias = "FWD")]
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse the position codes used by projection exports.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "G" | "GK" | "GKP" => Some(Self::Goalkeeper),
            "D" | "DEF" => Some(Self::Defender),
            "M" | "MID" => Some(Self::Midfielder),
            "F" | "FWD" => Some(Self::Forward),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Goalkeeper => "G",
            Self::Defender => "D",
            Self::Midfielder => "M",
            Self::Forward => "F",
        }
    }

    /// Exact number of squad members at this position (2/5/5/3).
    pub fn squad_quota(self) -> usize {
        match self {
            Self::Goalkeeper => 2,
            Self::Defender => 5,
            Self::Midfielder => 5,
            Self::Forward => 3,
        }
    }

    /// Formation bounds for starters in a normal gameweek.
    pub fn lineup_bounds(self) -> (usize, usize) {
        match self {
            Self::Goalkeeper => (1, 1),
            Self::Defender => (3, 5),
            Self::Midfielder => (2, 5),
            Self::Forward => (1, 3),
        }
    }

    pub fn is_defensive(self) -> bool {
        matches!(self, Self::Goalkeeper | Self::Defender)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotas_sum_to_squad_size() {
        let total: usize = Position::ALL.iter().map(|p| p.squad_quota()).sum();
        assert_eq!(total, SQUAD_SIZE);
    }

    #[test]
    fn formation_bounds_admit_eleven() {
        let min: usize = Position::ALL.iter().map(|p| p.lineup_bounds().0).sum();
        let max: usize = Position::ALL.iter().map(|p| p.lineup_bounds().1).sum();
        assert!(min <= LINEUP_SIZE && LINEUP_SIZE <= max);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(Position::parse("gkp"), Some(Position::Goalkeeper));
        assert_eq!(Position::parse("DEF"), Some(Position::Defender));
        assert_eq!(Position::parse(" m "), Some(Position::Midfielder));
        assert_eq!(Position::parse("FWD"), Some(Position::Forward));
        assert_eq!(Position::parse("ST"), None);
    }

    #[test]
    fn serde_uses_single_letter_codes() {
        let json = serde_json::to_string(&Position::Forward).unwrap();
        assert_eq!(json, "\"F\"");
        let back: Position = serde_json::from_str("\"MID\"").unwrap();
        assert_eq!(back, Position::Midfielder);
    }
}
