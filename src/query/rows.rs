use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Ranking;
use crate::model::{scaled, MatchRecord, PlayerAggregate};

/// One line of a player leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based position on the board.
    pub position: usize,
    pub player_id: String,
    /// The ranking's metric, scores in points.
    pub value: f64,
    pub games_played: u64,
}

impl LeaderboardRow {
    pub(crate) fn new(position: usize, ranking: Ranking, player: &PlayerAggregate) -> Self {
        LeaderboardRow {
            position,
            player_id: player.player_id.clone(),
            value: ranking.value(player),
            games_played: player.games_played,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentMatch {
    pub match_id: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<&MatchRecord> for RecentMatch {
    fn from(record: &MatchRecord) -> Self {
        RecentMatch {
            match_id: record.match_id.clone(),
            recorded_at: record.recorded_at,
        }
    }
}

/// Every derived metric for one player, scores in points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub adjusted_score_total: f64,
    pub adjusted_score_average: f64,
    pub raw_score_total: f64,
    pub raw_score_average: f64,
    pub average_placement: f64,
    pub games_played: u64,
}

impl From<&PlayerAggregate> for PlayerProfile {
    fn from(player: &PlayerAggregate) -> Self {
        PlayerProfile {
            player_id: player.player_id.clone(),
            adjusted_score_total: player.adjusted_total_scaled(),
            adjusted_score_average: player.adjusted_average_scaled(),
            raw_score_total: player.raw_total_scaled(),
            raw_score_average: player.raw_average_scaled(),
            average_placement: player.average_placement(),
            games_played: player.games_played,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatProfile {
    /// Finishing position, 1 = best.
    pub position: u64,
    pub player_id: String,
    pub raw_score: f64,
    pub adjusted_score: f64,
}

/// Full seat breakdown of one match, scores in points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchProfile {
    pub match_id: String,
    pub recorded_at: DateTime<Utc>,
    pub seats: Vec<SeatProfile>,
}

impl From<&MatchRecord> for MatchProfile {
    fn from(record: &MatchRecord) -> Self {
        MatchProfile {
            match_id: record.match_id.clone(),
            recorded_at: record.recorded_at,
            seats: record
                .placements()
                .map(|(position, seat)| SeatProfile {
                    position,
                    player_id: seat.player_id.clone(),
                    raw_score: scaled(seat.raw_score),
                    adjusted_score: scaled(seat.adjusted_score),
                })
                .collect(),
        }
    }
}

/// Unprojected contents of the whole store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerDump {
    pub matches: Vec<MatchRecord>,
    pub players: Vec<PlayerAggregate>,
}
