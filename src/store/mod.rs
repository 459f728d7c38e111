//! Ledger stores - persistence for match records and player aggregates.
//!
//! A store exposes plain reads plus [`LedgerStore::begin`], which opens a
//! serializable [`LedgerTransaction`]. Writes staged in a transaction become
//! visible together on [`LedgerTransaction::commit`]; dropping the
//! transaction without committing discards all of them.
//!
//! ## Example
//!
//! ```ignore
//! use riichi_ledger::{InMemoryLedgerStore, LedgerStore, LedgerTransaction};
//!
//! let store = InMemoryLedgerStore::new();
//! let mut tx = store.begin()?;
//! let current = tx.player("alice")?;
//! tx.put_player(PlayerAggregate::folded(current, &seat, 1)?)?;
//! tx.insert_match(record)?;
//! tx.commit()?;
//! ```

mod any;
mod error;
mod in_memory;
mod sqlite;

use crate::model::{MatchRecord, PlayerAggregate};
use crate::query::Ranking;

pub use any::{AnyLedgerStore, AnyTransaction};
pub use error::StoreError;
pub use in_memory::{InMemoryLedgerStore, InMemoryTransaction};
pub use sqlite::{SqliteLedgerStore, SqliteTransaction};

/// Storage for the two entity sets the ledger owns.
///
/// Reads never observe a partially committed transaction.
pub trait LedgerStore: Send + Sync {
    /// The transaction type returned by [`LedgerStore::begin`].
    type Transaction<'a>: LedgerTransaction
    where
        Self: 'a;

    /// Open a write transaction, waiting until no other write transaction
    /// is in progress.
    fn begin(&self) -> Result<Self::Transaction<'_>, StoreError>;

    /// Check whether a match with this id has been recorded.
    fn match_exists(&self, match_id: &str) -> Result<bool, StoreError>;

    /// Get a match record by id. Returns None if not found.
    fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>, StoreError>;

    /// Get a player aggregate by id. Returns None if the player never played.
    fn get_player(&self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError>;

    /// The first `limit` players ordered by `ranking`, ties broken by player id.
    fn top_players(
        &self,
        ranking: Ranking,
        limit: usize,
    ) -> Result<Vec<PlayerAggregate>, StoreError>;

    /// The `limit` most recently recorded matches, newest first.
    fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, StoreError>;

    /// Every match record in insertion order.
    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError>;

    /// Every player aggregate in insertion order.
    fn players(&self) -> Result<Vec<PlayerAggregate>, StoreError>;

    /// Every match and every player from one consistent point in time.
    fn snapshot(&self) -> Result<(Vec<MatchRecord>, Vec<PlayerAggregate>), StoreError>;
}

/// An open write transaction against a [`LedgerStore`].
pub trait LedgerTransaction {
    /// Read a player aggregate, including writes staged in this transaction.
    fn player(&mut self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError>;

    /// Stage an aggregate, replacing any stored row with the same player id.
    fn put_player(&mut self, aggregate: PlayerAggregate) -> Result<(), StoreError>;

    /// Stage a new match record.
    ///
    /// Fails with [`StoreError::Conflict`] if the match id is already
    /// recorded or staged.
    fn insert_match(&mut self, record: MatchRecord) -> Result<(), StoreError>;

    /// Make every staged write visible at once.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// Sort `items` and keep the first `limit`.
pub(crate) fn take_sorted<T>(
    mut items: Vec<T>,
    limit: usize,
    compare: impl FnMut(&T, &T) -> std::cmp::Ordering,
) -> Vec<T> {
    items.sort_by(compare);
    items.truncate(limit);
    items
}
