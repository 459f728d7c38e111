use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Record, SEATS_PER_MATCH};

/// One participant's contribution to a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub player_id: String,
    pub raw_score: i64,
    pub adjusted_score: i64,
}

impl Seat {
    pub fn new(player_id: impl Into<String>, raw_score: i64, adjusted_score: i64) -> Self {
        Seat {
            player_id: player_id.into(),
            raw_score,
            adjusted_score,
        }
    }
}

/// An immutable record of one finished match.
///
/// `seats[0]` finished first. The array index decides both which player a
/// score belongs to and how many rank points that player receives, so the
/// order must never be rearranged after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub recorded_at: DateTime<Utc>,
    pub seats: [Seat; SEATS_PER_MATCH],
}

impl MatchRecord {
    /// Iterate seats paired with their 1-indexed finishing position.
    pub fn placements(&self) -> impl Iterator<Item = (u64, &Seat)> {
        self.seats
            .iter()
            .enumerate()
            .map(|(index, seat)| (index as u64 + 1, seat))
    }

    /// Finishing position of `player_id` in this match, if they took part.
    pub fn position_of(&self, player_id: &str) -> Option<u64> {
        self.placements()
            .find(|(_, seat)| seat.player_id == player_id)
            .map(|(position, _)| position)
    }
}

impl Record for MatchRecord {
    const COLLECTION: &'static str = "matches";

    fn id(&self) -> &str {
        &self.match_id
    }
}
