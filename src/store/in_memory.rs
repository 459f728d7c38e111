//! InMemoryLedgerStore - HashMap-indexed ledger store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use super::{take_sorted, LedgerStore, LedgerTransaction, StoreError};
use crate::model::{MatchRecord, PlayerAggregate, Record};
use crate::query::Ranking;

/// Rows in insertion order plus an id index into each table.
#[derive(Default)]
struct Tables {
    matches: Vec<MatchRecord>,
    match_index: HashMap<String, usize>,
    players: Vec<PlayerAggregate>,
    player_index: HashMap<String, usize>,
}

impl Tables {
    fn player(&self, player_id: &str) -> Option<&PlayerAggregate> {
        self.player_index
            .get(player_id)
            .map(|&index| &self.players[index])
    }

    fn put_player(&mut self, aggregate: PlayerAggregate) {
        match self.player_index.get(&aggregate.player_id) {
            Some(&index) => self.players[index] = aggregate,
            None => {
                self.player_index
                    .insert(aggregate.player_id.clone(), self.players.len());
                self.players.push(aggregate);
            }
        }
    }

    fn insert_match(&mut self, record: MatchRecord) {
        self.match_index
            .insert(record.match_id.clone(), self.matches.len());
        self.matches.push(record);
    }
}

/// In-memory ledger store.
///
/// A transaction holds the write lock until it commits or is dropped, so
/// ingestions are serialized and readers only ever see committed rows.
/// Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Tables) -> T,
    ) -> Result<T, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned(operation))?;
        Ok(f(&tables))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    type Transaction<'a> = InMemoryTransaction<'a>;

    fn begin(&self) -> Result<InMemoryTransaction<'_>, StoreError> {
        let tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("begin"))?;
        Ok(InMemoryTransaction {
            tables,
            players: Vec::new(),
            matches: Vec::new(),
        })
    }

    fn match_exists(&self, match_id: &str) -> Result<bool, StoreError> {
        self.read("match_exists", |tables| {
            tables.match_index.contains_key(match_id)
        })
    }

    fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>, StoreError> {
        self.read("get_match", |tables| {
            tables
                .match_index
                .get(match_id)
                .map(|&index| tables.matches[index].clone())
        })
    }

    fn get_player(&self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        self.read("get_player", |tables| tables.player(player_id).cloned())
    }

    fn top_players(
        &self,
        ranking: Ranking,
        limit: usize,
    ) -> Result<Vec<PlayerAggregate>, StoreError> {
        let players = self.read("top_players", |tables| tables.players.clone())?;
        Ok(take_sorted(players, limit, |a, b| ranking.compare(a, b)))
    }

    fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, StoreError> {
        let indexed = self.read("recent_matches", |tables| {
            tables
                .matches
                .iter()
                .cloned()
                .enumerate()
                .collect::<Vec<_>>()
        })?;
        let newest_first = take_sorted(indexed, limit, |(ia, a), (ib, b)| {
            b.recorded_at.cmp(&a.recorded_at).then(ib.cmp(ia))
        });
        Ok(newest_first.into_iter().map(|(_, record)| record).collect())
    }

    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        self.read("matches", |tables| tables.matches.clone())
    }

    fn players(&self) -> Result<Vec<PlayerAggregate>, StoreError> {
        self.read("players", |tables| tables.players.clone())
    }

    fn snapshot(&self) -> Result<(Vec<MatchRecord>, Vec<PlayerAggregate>), StoreError> {
        self.read("snapshot", |tables| {
            (tables.matches.clone(), tables.players.clone())
        })
    }
}

/// Write transaction over an [`InMemoryLedgerStore`].
///
/// Writes are staged locally and copied into the tables on commit.
pub struct InMemoryTransaction<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    players: Vec<PlayerAggregate>,
    matches: Vec<MatchRecord>,
}

impl LedgerTransaction for InMemoryTransaction<'_> {
    fn player(&mut self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        let staged = self
            .players
            .iter()
            .rev()
            .find(|aggregate| aggregate.player_id == player_id);
        Ok(staged
            .or_else(|| self.tables.player(player_id))
            .cloned())
    }

    fn put_player(&mut self, aggregate: PlayerAggregate) -> Result<(), StoreError> {
        self.players.push(aggregate);
        Ok(())
    }

    fn insert_match(&mut self, record: MatchRecord) -> Result<(), StoreError> {
        let duplicate = self.tables.match_index.contains_key(record.id())
            || self.matches.iter().any(|staged| staged.id() == record.id());
        if duplicate {
            return Err(StoreError::Conflict {
                collection: MatchRecord::COLLECTION,
                id: record.match_id,
            });
        }
        self.matches.push(record);
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        for aggregate in std::mem::take(&mut self.players) {
            self.tables.put_player(aggregate);
        }
        for record in std::mem::take(&mut self.matches) {
            self.tables.insert_match(record);
        }
        Ok(())
    }
}
