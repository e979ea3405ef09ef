use serde::{Deserialize, Serialize};
use std::fmt;

/// One-off rule overrides. At most one chip is active per gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chip {
    /// Unlimited free transfers for one week; the free-transfer balance is kept.
    #[serde(alias = "wc")]
    Wildcard,
    /// Temporary squad for one week, reverting afterwards.
    #[serde(alias = "fh")]
    FreeHit,
    /// Bench points count for one week.
    #[serde(alias = "bb")]
    BenchBoost,
    /// Captain scores triple for one week.
    #[serde(alias = "tc")]
    TripleCaptain,
}

impl Chip {
    pub const ALL: [Chip; 4] = [
        Chip::Wildcard,
        Chip::FreeHit,
        Chip::BenchBoost,
        Chip::TripleCaptain,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Wildcard => "WC",
            Self::FreeHit => "FH",
            Self::BenchBoost => "BB",
            Self::TripleCaptain => "TC",
        }
    }

    /// Chips that make the week's transfers free.
    pub fn resets_transfers(self) -> bool {
        matches!(self, Self::Wildcard | Self::FreeHit)
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
