use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::PlayerAggregate;

/// The derived metric a player leaderboard is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// `rank_total / games_played`, lowest first.
    AveragePlacement,
    /// `adjusted_score_total`, highest first.
    TotalAdjustedScore,
    /// `raw_score_total`, highest first.
    TotalRawScore,
    /// `adjusted_score_total / games_played`, highest first.
    AverageAdjustedScore,
    /// `raw_score_total / games_played`, highest first.
    AverageRawScore,
    /// `games_played`, highest first.
    GamesPlayed,
}

impl Ranking {
    pub const ALL: [Ranking; 6] = [
        Ranking::AveragePlacement,
        Ranking::TotalAdjustedScore,
        Ranking::TotalRawScore,
        Ranking::AverageAdjustedScore,
        Ranking::AverageRawScore,
        Ranking::GamesPlayed,
    ];

    /// Whether smaller values rank higher.
    pub fn ascending(self) -> bool {
        matches!(self, Ranking::AveragePlacement)
    }

    /// The reported value for a player, with scores scaled to points.
    pub fn value(self, player: &PlayerAggregate) -> f64 {
        match self {
            Ranking::AveragePlacement => player.average_placement(),
            Ranking::TotalAdjustedScore => player.adjusted_total_scaled(),
            Ranking::TotalRawScore => player.raw_total_scaled(),
            Ranking::AverageAdjustedScore => player.adjusted_average_scaled(),
            Ranking::AverageRawScore => player.raw_average_scaled(),
            Ranking::GamesPlayed => player.games_played as f64,
        }
    }

    /// Leaderboard order: better players first, ties by player id ascending.
    ///
    /// Totals compare as integers. Averages compare the unscaled quotient,
    /// which is the same quotient the SQLite backend sorts on.
    pub fn compare(self, a: &PlayerAggregate, b: &PlayerAggregate) -> Ordering {
        let primary = match self {
            Ranking::AveragePlacement => {
                quotient(a.rank_total as f64, a).total_cmp(&quotient(b.rank_total as f64, b))
            }
            Ranking::TotalAdjustedScore => b.adjusted_score_total.cmp(&a.adjusted_score_total),
            Ranking::TotalRawScore => b.raw_score_total.cmp(&a.raw_score_total),
            Ranking::AverageAdjustedScore => quotient(b.adjusted_score_total as f64, b)
                .total_cmp(&quotient(a.adjusted_score_total as f64, a)),
            Ranking::AverageRawScore => quotient(b.raw_score_total as f64, b)
                .total_cmp(&quotient(a.raw_score_total as f64, a)),
            Ranking::GamesPlayed => b.games_played.cmp(&a.games_played),
        };
        primary.then_with(|| a.player_id.cmp(&b.player_id))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ranking::AveragePlacement => "average_placement",
            Ranking::TotalAdjustedScore => "total_adjusted_score",
            Ranking::TotalRawScore => "total_raw_score",
            Ranking::AverageAdjustedScore => "average_adjusted_score",
            Ranking::AverageRawScore => "average_raw_score",
            Ranking::GamesPlayed => "games_played",
        }
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn quotient(total: f64, player: &PlayerAggregate) -> f64 {
    total / player.games_played as f64
}
