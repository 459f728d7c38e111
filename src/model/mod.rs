//! Records - the two entity sets owned by the ledger.
//!
//! A [`MatchRecord`] is written once per finished match and never changes.
//! A [`PlayerAggregate`] holds running totals for one player and is folded
//! forward by every match naming that player.
//!
//! ## Example
//!
//! ```ignore
//! use riichi_ledger::{PlayerAggregate, Seat};
//!
//! let seat = Seat::new("alice", 48_000, 58_000);
//! let mut alice = PlayerAggregate::first_game(&seat, 1);
//! alice.fold(&Seat::new("alice", 22_000, -8_000), 3)?;
//!
//! assert_eq!(alice.games_played, 2);
//! assert_eq!(alice.average_placement(), 2.0);
//! ```

mod match_record;
mod player;

pub use match_record::{MatchRecord, Seat};
pub use player::{PlayerAggregate, TotalOverflow};

/// Number of seats in every recorded match.
pub const SEATS_PER_MATCH: usize = 4;

/// Scores are stored in thousandths of a point; read paths divide by this.
pub const SCORE_SCALE: f64 = 1000.0;

/// Trait for entities persisted by a ledger store.
pub trait Record {
    /// The collection name for this record type.
    /// Maps to a table in SQLite and a key prefix in the in-memory store.
    const COLLECTION: &'static str;

    /// Returns the natural key of this record.
    fn id(&self) -> &str;
}

/// Converts a stored score into points.
pub fn scaled(score: i64) -> f64 {
    score as f64 / SCORE_SCALE
}
