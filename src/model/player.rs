use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{scaled, Record, Seat};

/// Folding a seat would push one of a player's totals out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} of player {player_id} would overflow")]
pub struct TotalOverflow {
    pub player_id: String,
    pub field: &'static str,
}

/// Running totals for one player across every recorded match.
///
/// A row only exists after the player's first match, so `games_played` is
/// always at least one and the averages never divide by zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    pub player_id: String,
    pub raw_score_total: i64,
    pub adjusted_score_total: i64,
    pub rank_total: u64,
    pub games_played: u64,
}

impl PlayerAggregate {
    /// Aggregate for a player seen for the first time, finishing at `position`.
    pub fn first_game(seat: &Seat, position: u64) -> Self {
        PlayerAggregate {
            player_id: seat.player_id.clone(),
            raw_score_total: seat.raw_score,
            adjusted_score_total: seat.adjusted_score,
            rank_total: position,
            games_played: 1,
        }
    }

    /// Add one more match finished at `position`.
    ///
    /// Either every total is updated or, on overflow, none is.
    pub fn fold(&mut self, seat: &Seat, position: u64) -> Result<(), TotalOverflow> {
        debug_assert_eq!(self.player_id, seat.player_id);
        let overflow = |field| TotalOverflow {
            player_id: self.player_id.clone(),
            field,
        };
        let raw_score_total = self
            .raw_score_total
            .checked_add(seat.raw_score)
            .ok_or_else(|| overflow("raw_score_total"))?;
        let adjusted_score_total = self
            .adjusted_score_total
            .checked_add(seat.adjusted_score)
            .ok_or_else(|| overflow("adjusted_score_total"))?;
        let rank_total = self
            .rank_total
            .checked_add(position)
            .ok_or_else(|| overflow("rank_total"))?;
        let games_played = self
            .games_played
            .checked_add(1)
            .ok_or_else(|| overflow("games_played"))?;

        self.raw_score_total = raw_score_total;
        self.adjusted_score_total = adjusted_score_total;
        self.rank_total = rank_total;
        self.games_played = games_played;
        Ok(())
    }

    /// Fold `seat` into `existing`, or start a new aggregate if there is none.
    pub fn folded(
        existing: Option<PlayerAggregate>,
        seat: &Seat,
        position: u64,
    ) -> Result<Self, TotalOverflow> {
        match existing {
            Some(mut aggregate) => {
                aggregate.fold(seat, position)?;
                Ok(aggregate)
            }
            None => Ok(PlayerAggregate::first_game(seat, position)),
        }
    }

    /// Mean finishing position; lower is better.
    pub fn average_placement(&self) -> f64 {
        self.rank_total as f64 / self.games_played as f64
    }

    pub fn raw_total_scaled(&self) -> f64 {
        scaled(self.raw_score_total)
    }

    pub fn adjusted_total_scaled(&self) -> f64 {
        scaled(self.adjusted_score_total)
    }

    pub fn raw_average_scaled(&self) -> f64 {
        self.raw_total_scaled() / self.games_played as f64
    }

    pub fn adjusted_average_scaled(&self) -> f64 {
        self.adjusted_total_scaled() / self.games_played as f64
    }
}

impl Record for PlayerAggregate {
    const COLLECTION: &'static str = "players";

    fn id(&self) -> &str {
        &self.player_id
    }
}
