//! SqliteLedgerStore - durable ledger store backed by `SQLite`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{info, warn};

use super::{LedgerStore, LedgerTransaction, StoreError};
use crate::config::SqliteConfig;
use crate::model::{MatchRecord, PlayerAggregate, Record, Seat};
use crate::query::Ranking;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS matches (
    match_id     TEXT    NOT NULL UNIQUE,
    recorded_at  INTEGER NOT NULL,
    player_1     TEXT    NOT NULL,
    player_2     TEXT    NOT NULL,
    player_3     TEXT    NOT NULL,
    player_4     TEXT    NOT NULL,
    raw_1        INTEGER NOT NULL,
    raw_2        INTEGER NOT NULL,
    raw_3        INTEGER NOT NULL,
    raw_4        INTEGER NOT NULL,
    adjusted_1   INTEGER NOT NULL,
    adjusted_2   INTEGER NOT NULL,
    adjusted_3   INTEGER NOT NULL,
    adjusted_4   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_matches_recorded_at ON matches (recorded_at);
CREATE TABLE IF NOT EXISTS players (
    player_id            TEXT    NOT NULL UNIQUE,
    raw_score_total      INTEGER NOT NULL,
    adjusted_score_total INTEGER NOT NULL,
    rank_total           INTEGER NOT NULL,
    games_played         INTEGER NOT NULL
);
";

const MATCH_COLUMNS: &str = "match_id, recorded_at, \
     player_1, raw_1, adjusted_1, \
     player_2, raw_2, adjusted_2, \
     player_3, raw_3, adjusted_3, \
     player_4, raw_4, adjusted_4";

const PLAYER_COLUMNS: &str =
    "player_id, raw_score_total, adjusted_score_total, rank_total, games_played";

/// `ORDER BY` clause for each ranking. Mirrors [`Ranking::compare`].
fn order_by(ranking: Ranking) -> &'static str {
    match ranking {
        Ranking::AveragePlacement => "CAST(rank_total AS REAL) / games_played ASC, player_id ASC",
        Ranking::TotalAdjustedScore => "adjusted_score_total DESC, player_id ASC",
        Ranking::TotalRawScore => "raw_score_total DESC, player_id ASC",
        Ranking::AverageAdjustedScore => {
            "CAST(adjusted_score_total AS REAL) / games_played DESC, player_id ASC"
        }
        Ranking::AverageRawScore => {
            "CAST(raw_score_total AS REAL) / games_played DESC, player_id ASC"
        }
        Ranking::GamesPlayed => "games_played DESC, player_id ASC",
    }
}

/// Durable ledger store backed by a single `SQLite` connection.
///
/// The connection sits behind a mutex; write transactions additionally run
/// under `BEGIN IMMEDIATE` so other processes sharing the file are excluded
/// for the duration of an ingestion. Clone-friendly via Arc.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedgerStore").finish_non_exhaustive()
    }
}

impl SqliteLedgerStore {
    /// Open (or create) the database file at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(path, &SqliteConfig::default())
    }

    /// Open (or create) the database file at `path`, applying `config`.
    pub fn open_with(path: impl AsRef<Path>, config: &SqliteConfig) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(config.busy_timeout())?;
        conn.pragma_update(None, "synchronous", config.synchronous.as_pragma())?;
        let store = Self::from_connection(conn)?;
        info!(path = %path.display(), "opened sqlite ledger store");
        Ok(store)
    }

    /// Open a private in-memory database. Contents vanish on drop.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, creating the tables if needed.
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }
}

impl LedgerStore for SqliteLedgerStore {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn begin(&self) -> Result<SqliteTransaction<'_>, StoreError> {
        let conn = self.lock("begin")?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(SqliteTransaction { conn, open: true })
    }

    fn match_exists(&self, match_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock("match_exists")?;
        let found = conn
            .query_row(
                "SELECT 1 FROM matches WHERE match_id = ?1",
                params![match_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>, StoreError> {
        let conn = self.lock("get_match")?;
        let row = conn
            .query_row(
                &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ?1"),
                params![match_id],
                MatchRow::from_row,
            )
            .optional()?;
        row.map(MatchRow::into_record).transpose()
    }

    fn get_player(&self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        let conn = self.lock("get_player")?;
        select_player(&conn, player_id)
    }

    fn top_players(
        &self,
        ranking: Ranking,
        limit: usize,
    ) -> Result<Vec<PlayerAggregate>, StoreError> {
        let conn = self.lock("top_players")?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players ORDER BY {} LIMIT ?1",
            order_by(ranking)
        ))?;
        let rows = stmt.query_map(params![sql_limit(limit)], PlayerRow::from_row)?;
        let players = rows
            .map(|row| row?.into_aggregate())
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(players)
    }

    fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, StoreError> {
        let conn = self.lock("recent_matches")?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches ORDER BY recorded_at DESC, rowid DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![sql_limit(limit)], MatchRow::from_row)?;
        let records = rows
            .map(|row| row?.into_record())
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(records)
    }

    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let conn = self.lock("matches")?;
        select_all_matches(&conn)
    }

    fn players(&self) -> Result<Vec<PlayerAggregate>, StoreError> {
        let conn = self.lock("players")?;
        select_all_players(&conn)
    }

    fn snapshot(&self) -> Result<(Vec<MatchRecord>, Vec<PlayerAggregate>), StoreError> {
        let conn = self.lock("snapshot")?;
        // A read transaction keeps writers in other processes out between the two scans.
        let tx = conn.unchecked_transaction()?;
        let matches = select_all_matches(&tx)?;
        let players = select_all_players(&tx)?;
        tx.commit()?;
        Ok((matches, players))
    }
}

/// Write transaction over a [`SqliteLedgerStore`].
///
/// Rolls back on drop unless [`LedgerTransaction::commit`] succeeded.
pub struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    open: bool,
}

impl LedgerTransaction for SqliteTransaction<'_> {
    fn player(&mut self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        select_player(&self.conn, player_id)
    }

    fn put_player(&mut self, aggregate: PlayerAggregate) -> Result<(), StoreError> {
        let rank_total = to_sql_count(aggregate.rank_total)?;
        let games_played = to_sql_count(aggregate.games_played)?;
        self.conn.execute(
            "INSERT INTO players \
             (player_id, raw_score_total, adjusted_score_total, rank_total, games_played) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (player_id) DO UPDATE SET \
             raw_score_total = excluded.raw_score_total, \
             adjusted_score_total = excluded.adjusted_score_total, \
             rank_total = excluded.rank_total, \
             games_played = excluded.games_played",
            params![
                aggregate.player_id,
                aggregate.raw_score_total,
                aggregate.adjusted_score_total,
                rank_total,
                games_played,
            ],
        )?;
        Ok(())
    }

    fn insert_match(&mut self, record: MatchRecord) -> Result<(), StoreError> {
        let [s1, s2, s3, s4] = &record.seats;
        let result = self.conn.execute(
            &format!(
                "INSERT INTO matches ({MATCH_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                record.match_id,
                record.recorded_at.timestamp_millis(),
                s1.player_id,
                s1.raw_score,
                s1.adjusted_score,
                s2.player_id,
                s2.raw_score,
                s2.adjusted_score,
                s3.player_id,
                s3.raw_score,
                s3.adjusted_score,
                s4.player_id,
                s4.raw_score,
                s4.adjusted_score,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict {
                    collection: MatchRecord::COLLECTION,
                    id: record.match_id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn commit(mut self) -> Result<(), StoreError> {
        if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
            warn!(
                error = %commit_err,
                "COMMIT failed for ledger transaction - attempting ROLLBACK"
            );
            self.open = false;
            if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                return Err(StoreError::Corrupt(format!(
                    "COMMIT failed ({commit_err}) and ROLLBACK also failed ({rollback_err})"
                )));
            }
            return Err(commit_err.into());
        }
        self.open = false;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "ROLLBACK failed for abandoned ledger transaction");
            }
        }
    }
}

fn select_player(
    conn: &Connection,
    player_id: &str,
) -> Result<Option<PlayerAggregate>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = ?1"),
            params![player_id],
            PlayerRow::from_row,
        )
        .optional()?;
    row.map(PlayerRow::into_aggregate).transpose()
}

fn select_all_matches(conn: &Connection) -> Result<Vec<MatchRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([], MatchRow::from_row)?;
    let records = rows
        .map(|row| row?.into_record())
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(records)
}

fn select_all_players(conn: &Connection) -> Result<Vec<PlayerAggregate>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAYER_COLUMNS} FROM players ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([], PlayerRow::from_row)?;
    let players = rows
        .map(|row| row?.into_aggregate())
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(players)
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn to_sql_count(count: u64) -> Result<i64, StoreError> {
    i64::try_from(count)
        .map_err(|_| StoreError::Corrupt(format!("counter {count} exceeds INTEGER range")))
}

fn from_sql_count(column: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

/// A `players` row as stored, before range checks.
struct PlayerRow {
    player_id: String,
    raw_score_total: i64,
    adjusted_score_total: i64,
    rank_total: i64,
    games_played: i64,
}

impl PlayerRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PlayerRow {
            player_id: row.get(0)?,
            raw_score_total: row.get(1)?,
            adjusted_score_total: row.get(2)?,
            rank_total: row.get(3)?,
            games_played: row.get(4)?,
        })
    }

    fn into_aggregate(self) -> Result<PlayerAggregate, StoreError> {
        let games_played = from_sql_count("games_played", self.games_played)?;
        if games_played == 0 {
            return Err(StoreError::Corrupt(format!(
                "player {} has no games",
                self.player_id
            )));
        }
        Ok(PlayerAggregate {
            rank_total: from_sql_count("rank_total", self.rank_total)?,
            games_played,
            raw_score_total: self.raw_score_total,
            adjusted_score_total: self.adjusted_score_total,
            player_id: self.player_id,
        })
    }
}

/// A `matches` row as stored, before timestamp decoding.
struct MatchRow {
    match_id: String,
    recorded_at: i64,
    seats: [Seat; 4],
}

impl MatchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let seat = |base: usize| -> rusqlite::Result<Seat> {
            Ok(Seat {
                player_id: row.get(base)?,
                raw_score: row.get(base + 1)?,
                adjusted_score: row.get(base + 2)?,
            })
        };
        Ok(MatchRow {
            match_id: row.get(0)?,
            recorded_at: row.get(1)?,
            seats: [seat(2)?, seat(5)?, seat(8)?, seat(11)?],
        })
    }

    fn into_record(self) -> Result<MatchRecord, StoreError> {
        let recorded_at: DateTime<Utc> = Utc
            .timestamp_millis_opt(self.recorded_at)
            .single()
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "match {} has invalid timestamp {}",
                    self.match_id, self.recorded_at
                ))
            })?;
        Ok(MatchRecord {
            match_id: self.match_id,
            recorded_at,
            seats: self.seats,
        })
    }
}
