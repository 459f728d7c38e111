pub mod config;
mod error;
mod ledger;
mod model;
mod query;
mod store;

pub use crate::config::{ConfigError, LedgerConfig, SqliteConfig, StorageBackend, Synchronous};
pub use error::LedgerError;
pub use ledger::{Clock, Ledger, SystemClock};
pub use model::{
    scaled, MatchRecord, PlayerAggregate, Record, Seat, TotalOverflow, SCORE_SCALE,
    SEATS_PER_MATCH,
};
pub use query::{
    LeaderboardRow, LedgerDump, MatchProfile, PlayerProfile, Ranking, RecentMatch, SeatProfile,
    StatQuery, StatsExt,
};
pub use store::{
    AnyLedgerStore, AnyTransaction, InMemoryLedgerStore, InMemoryTransaction, LedgerStore,
    LedgerTransaction, SqliteLedgerStore, SqliteTransaction, StoreError,
};
