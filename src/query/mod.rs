//! Stat queries - read-only projections over a ledger store.
//!
//! Every query is a plain read: nothing here can write to the store.
//! Unknown ids produce `None`, never an error.
//!
//! ## Example
//!
//! ```ignore
//! use riichi_ledger::{InMemoryLedgerStore, StatsExt};
//!
//! let store = InMemoryLedgerStore::new();
//! let top = store.stats().average_placement(10)?;
//! let alice = store.stats().player_profile("alice")?;
//! ```

mod ranking;
mod rows;

pub use ranking::Ranking;
pub use rows::{LeaderboardRow, LedgerDump, MatchProfile, PlayerProfile, RecentMatch, SeatProfile};

use crate::store::{LedgerStore, StoreError};

/// Read-only view of a ledger store.
pub struct StatQuery<'a, S> {
    store: &'a S,
}

impl<'a, S: LedgerStore> StatQuery<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Top `n` players by `ranking`.
    pub fn leaderboard(
        &self,
        ranking: Ranking,
        n: usize,
    ) -> Result<Vec<LeaderboardRow>, StoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let players = self.store.top_players(ranking, n)?;
        Ok(players
            .iter()
            .enumerate()
            .map(|(index, player)| LeaderboardRow::new(index + 1, ranking, player))
            .collect())
    }

    /// Lowest mean finishing position first.
    pub fn average_placement(&self, n: usize) -> Result<Vec<LeaderboardRow>, StoreError> {
        self.leaderboard(Ranking::AveragePlacement, n)
    }

    pub fn total_adjusted_score(&self, n: usize) -> Result<Vec<LeaderboardRow>, StoreError> {
        self.leaderboard(Ranking::TotalAdjustedScore, n)
    }

    pub fn total_raw_score(&self, n: usize) -> Result<Vec<LeaderboardRow>, StoreError> {
        self.leaderboard(Ranking::TotalRawScore, n)
    }

    pub fn average_adjusted_score(&self, n: usize) -> Result<Vec<LeaderboardRow>, StoreError> {
        self.leaderboard(Ranking::AverageAdjustedScore, n)
    }

    pub fn average_raw_score(&self, n: usize) -> Result<Vec<LeaderboardRow>, StoreError> {
        self.leaderboard(Ranking::AverageRawScore, n)
    }

    pub fn games_played(&self, n: usize) -> Result<Vec<LeaderboardRow>, StoreError> {
        self.leaderboard(Ranking::GamesPlayed, n)
    }

    /// The `n` most recently recorded matches, newest first.
    pub fn recent_matches(&self, n: usize) -> Result<Vec<RecentMatch>, StoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let matches = self.store.recent_matches(n)?;
        Ok(matches.iter().map(RecentMatch::from).collect())
    }

    pub fn player_profile(&self, player_id: &str) -> Result<Option<PlayerProfile>, StoreError> {
        let player = self.store.get_player(player_id)?;
        Ok(player.as_ref().map(PlayerProfile::from))
    }

    pub fn match_profile(&self, match_id: &str) -> Result<Option<MatchProfile>, StoreError> {
        let record = self.store.get_match(match_id)?;
        Ok(record.as_ref().map(MatchProfile::from))
    }

    /// Every match and every player, each in insertion order, read from
    /// one consistent snapshot.
    pub fn dump(&self) -> Result<LedgerDump, StoreError> {
        let (matches, players) = self.store.snapshot()?;
        Ok(LedgerDump { matches, players })
    }
}

/// Extension trait for stat queries on any [`LedgerStore`].
pub trait StatsExt: LedgerStore + Sized {
    fn stats(&self) -> StatQuery<'_, Self> {
        StatQuery::new(self)
    }
}

impl<S: LedgerStore> StatsExt for S {}
