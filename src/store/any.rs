//! AnyLedgerStore - a store whose backend is chosen at runtime from config.

use super::{
    InMemoryLedgerStore, InMemoryTransaction, LedgerStore, LedgerTransaction, SqliteLedgerStore,
    SqliteTransaction, StoreError,
};
use crate::config::{LedgerConfig, StorageBackend};
use crate::model::{MatchRecord, PlayerAggregate};
use crate::query::Ranking;

/// Either backend behind one type, so callers can hold a `Ledger<AnyLedgerStore>`
/// regardless of which backend the configuration selected.
#[derive(Clone)]
pub enum AnyLedgerStore {
    Memory(InMemoryLedgerStore),
    Sqlite(SqliteLedgerStore),
}

impl AnyLedgerStore {
    /// Open the backend selected by `config`.
    pub fn open(config: &LedgerConfig) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackend::Memory => Ok(AnyLedgerStore::Memory(InMemoryLedgerStore::new())),
            StorageBackend::Sqlite => Ok(AnyLedgerStore::Sqlite(SqliteLedgerStore::open_with(
                &config.sqlite.path,
                &config.sqlite,
            )?)),
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $store:ident => $body:expr) => {
        match $self {
            AnyLedgerStore::Memory($store) => $body,
            AnyLedgerStore::Sqlite($store) => $body,
        }
    };
}

impl LedgerStore for AnyLedgerStore {
    type Transaction<'a> = AnyTransaction<'a>;

    fn begin(&self) -> Result<AnyTransaction<'_>, StoreError> {
        match self {
            AnyLedgerStore::Memory(store) => Ok(AnyTransaction::Memory(store.begin()?)),
            AnyLedgerStore::Sqlite(store) => Ok(AnyTransaction::Sqlite(store.begin()?)),
        }
    }

    fn match_exists(&self, match_id: &str) -> Result<bool, StoreError> {
        dispatch!(self, store => store.match_exists(match_id))
    }

    fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>, StoreError> {
        dispatch!(self, store => store.get_match(match_id))
    }

    fn get_player(&self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        dispatch!(self, store => store.get_player(player_id))
    }

    fn top_players(
        &self,
        ranking: Ranking,
        limit: usize,
    ) -> Result<Vec<PlayerAggregate>, StoreError> {
        dispatch!(self, store => store.top_players(ranking, limit))
    }

    fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, StoreError> {
        dispatch!(self, store => store.recent_matches(limit))
    }

    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        dispatch!(self, store => store.matches())
    }

    fn players(&self) -> Result<Vec<PlayerAggregate>, StoreError> {
        dispatch!(self, store => store.players())
    }

    fn snapshot(&self) -> Result<(Vec<MatchRecord>, Vec<PlayerAggregate>), StoreError> {
        dispatch!(self, store => store.snapshot())
    }
}

/// Transaction over an [`AnyLedgerStore`].
pub enum AnyTransaction<'a> {
    Memory(InMemoryTransaction<'a>),
    Sqlite(SqliteTransaction<'a>),
}

impl LedgerTransaction for AnyTransaction<'_> {
    fn player(&mut self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        match self {
            AnyTransaction::Memory(tx) => tx.player(player_id),
            AnyTransaction::Sqlite(tx) => tx.player(player_id),
        }
    }

    fn put_player(&mut self, aggregate: PlayerAggregate) -> Result<(), StoreError> {
        match self {
            AnyTransaction::Memory(tx) => tx.put_player(aggregate),
            AnyTransaction::Sqlite(tx) => tx.put_player(aggregate),
        }
    }

    fn insert_match(&mut self, record: MatchRecord) -> Result<(), StoreError> {
        match self {
            AnyTransaction::Memory(tx) => tx.insert_match(record),
            AnyTransaction::Sqlite(tx) => tx.insert_match(record),
        }
    }

    fn commit(self) -> Result<(), StoreError> {
        match self {
            AnyTransaction::Memory(tx) => tx.commit(),
            AnyTransaction::Sqlite(tx) => tx.commit(),
        }
    }
}
