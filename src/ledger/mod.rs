//! The aggregate ledger - records matches and folds them into player totals.
//!
//! ## Example
//!
//! ```ignore
//! use riichi_ledger::{Ledger, InMemoryLedgerStore, Seat};
//!
//! let ledger = Ledger::new(InMemoryLedgerStore::new());
//! ledger.ingest_match(
//!     "2024-05-01-table-3",
//!     &[
//!         Seat::new("alice", 48_300, 68_300),
//!         Seat::new("bob", 27_100, 7_100),
//!         Seat::new("carol", 19_900, -20_100),
//!         Seat::new("dave", 4_700, -55_300),
//!     ],
//! )?;
//!
//! let board = ledger.stats().average_placement(10)?;
//! ```

mod clock;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::SubsecRound;
use tracing::{debug, info, warn};

pub use clock::{Clock, SystemClock};

use crate::error::LedgerError;
use crate::model::{MatchRecord, PlayerAggregate, Seat, SEATS_PER_MATCH};
use crate::query::{StatQuery, StatsExt};
use crate::store::{LedgerStore, LedgerTransaction};

/// Records matches into a [`LedgerStore`] and keeps player aggregates
/// consistent with them.
///
/// The ledger owns its store handle. Clone is cheap when the store is
/// (both bundled stores share their tables across clones).
#[derive(Clone)]
pub struct Ledger<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }

    /// Use `clock` to stamp `recorded_at` instead of wall-clock time.
    pub fn with_clock(store: S, clock: impl Clock + 'static) -> Self {
        Ledger {
            store,
            clock: Arc::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Read-only stat queries over this ledger's store.
    pub fn stats(&self) -> StatQuery<'_, S> {
        self.store.stats()
    }

    /// Check whether `match_id` has already been recorded.
    ///
    /// This is a convenience for callers that want to skip known matches.
    /// [`Ledger::ingest_match`] rejects duplicates on its own, including
    /// when two ingestions of the same id race past this check.
    pub fn match_exists(&self, match_id: &str) -> Result<bool, LedgerError> {
        Ok(self.store.match_exists(match_id)?)
    }

    /// Record a finished match and fold each seat into that player's totals.
    ///
    /// `seats` must hold exactly four entries ordered by finishing position,
    /// best first. Seat `i` (1-indexed) adds `i` to the player's rank total
    /// along with its raw and adjusted scores.
    ///
    /// The match record and all four aggregate updates commit together or
    /// not at all.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] if the seat count is not four, an id is
    ///   empty, or a player holds two seats. Also when adding a seat would
    ///   overflow one of that player's totals. Nothing is written.
    /// - [`LedgerError::Conflict`] if `match_id` is already recorded.
    /// - [`LedgerError::Storage`] if the store fails.
    pub fn ingest_match(
        &self,
        match_id: &str,
        seats: &[Seat],
    ) -> Result<MatchRecord, LedgerError> {
        let seats = validate(match_id, seats)?;
        let record = MatchRecord {
            match_id: match_id.to_string(),
            recorded_at: self.clock.now().trunc_subsecs(3),
            seats,
        };

        let mut tx = self.store.begin()?;

        for (position, seat) in record.placements() {
            let existing = tx.player(&seat.player_id)?;
            match &existing {
                Some(current) => debug!(
                    match_id,
                    player_id = %seat.player_id,
                    position,
                    games_played = current.games_played.saturating_add(1),
                    "folding seat into player aggregate"
                ),
                None => debug!(
                    match_id,
                    player_id = %seat.player_id,
                    position,
                    "creating player aggregate"
                ),
            }
            let folded = PlayerAggregate::folded(existing, seat, position).map_err(|err| {
                warn!(match_id, error = %err, "rejected match that overflows player totals");
                LedgerError::Validation(err.to_string())
            })?;
            tx.put_player(folded)?;
        }

        if let Err(err) = tx.insert_match(record.clone()) {
            if err.is_conflict() {
                warn!(match_id, "rejected duplicate match");
            }
            return Err(err.into());
        }

        tx.commit()?;

        info!(
            match_id,
            recorded_at = %record.recorded_at,
            winner = %record.seats[0].player_id,
            "recorded match"
        );
        Ok(record)
    }
}

fn validate(match_id: &str, seats: &[Seat]) -> Result<[Seat; SEATS_PER_MATCH], LedgerError> {
    if match_id.is_empty() {
        return Err(LedgerError::Validation("match id is empty".to_string()));
    }
    let seats: [Seat; SEATS_PER_MATCH] =
        seats.to_vec().try_into().map_err(|seats: Vec<Seat>| {
            LedgerError::Validation(format!(
                "expected {} seats, got {}",
                SEATS_PER_MATCH,
                seats.len()
            ))
        })?;

    let mut seen = HashSet::with_capacity(SEATS_PER_MATCH);
    for (index, seat) in seats.iter().enumerate() {
        if seat.player_id.is_empty() {
            return Err(LedgerError::Validation(format!(
                "seat {} has an empty player id",
                index + 1
            )));
        }
        if !seen.insert(seat.player_id.as_str()) {
            return Err(LedgerError::Validation(format!(
                "player {} holds more than one seat",
                seat.player_id
            )));
        }
    }
    Ok(seats)
}
