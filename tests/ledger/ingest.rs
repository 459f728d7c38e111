use riichi_ledger::{Ledger, LedgerError, LedgerStore, Seat};

use crate::support::{init_tracing, memory_ledger, scored, seats, sqlite_ledger};

fn folds_each_seat_by_position<S: LedgerStore>(ledger: Ledger<S>) {
    ledger
        .ingest_match("m-1", &seats(["alice", "bob", "carol", "dave"]))
        .unwrap();
    ledger
        .ingest_match("m-2", &seats(["dave", "carol", "bob", "alice"]))
        .unwrap();

    let store = ledger.store();
    let alice = store.get_player("alice").unwrap().unwrap();
    assert_eq!(alice.games_played, 2);
    assert_eq!(alice.rank_total, 1 + 4);
    assert_eq!(alice.raw_score_total, 42_100 + 8_200);
    assert_eq!(alice.adjusted_score_total, 62_100 - 51_800);

    let bob = store.get_player("bob").unwrap().unwrap();
    assert_eq!(bob.rank_total, 2 + 3);
    assert_eq!(bob.average_placement(), 2.5);

    let record = store.get_match("m-2").unwrap().unwrap();
    assert_eq!(record.seats[0].player_id, "dave");
    assert_eq!(record.position_of("alice"), Some(4));
    assert_eq!(store.matches().unwrap().len(), 2);
    assert_eq!(store.players().unwrap().len(), 4);
}

#[test]
fn folds_each_seat_by_position_in_memory() {
    init_tracing();
    folds_each_seat_by_position(memory_ledger());
}

#[test]
fn folds_each_seat_by_position_sqlite() {
    init_tracing();
    folds_each_seat_by_position(sqlite_ledger());
}

fn duplicate_is_rejected_without_side_effects<S: LedgerStore>(ledger: Ledger<S>) {
    let first = ledger
        .ingest_match("m-1", &seats(["alice", "bob", "carol", "dave"]))
        .unwrap();

    // Different seats under the same id must not leak into aggregates.
    let err = ledger
        .ingest_match("m-1", &seats(["erin", "frank", "alice", "bob"]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict { ref match_id } if match_id == "m-1"));

    let store = ledger.store();
    assert_eq!(store.matches().unwrap(), vec![first]);
    assert!(store.get_player("erin").unwrap().is_none());
    let alice = store.get_player("alice").unwrap().unwrap();
    assert_eq!(alice.games_played, 1);
    assert_eq!(alice.rank_total, 1);
}

#[test]
fn duplicate_is_rejected_without_side_effects_in_memory() {
    duplicate_is_rejected_without_side_effects(memory_ledger());
}

#[test]
fn duplicate_is_rejected_without_side_effects_sqlite() {
    duplicate_is_rejected_without_side_effects(sqlite_ledger());
}

fn invalid_input_writes_nothing<S: LedgerStore>(ledger: Ledger<S>) {
    let three = vec![
        Seat::new("alice", 30_000, 10_000),
        Seat::new("bob", 30_000, 10_000),
        Seat::new("carol", 40_000, 20_000),
    ];
    assert!(matches!(
        ledger.ingest_match("m-1", &three),
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        ledger.ingest_match("m-1", &[]),
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        ledger.ingest_match("m-1", &seats(["alice", "bob", "bob", "dave"])),
        Err(LedgerError::Validation(_))
    ));

    assert!(!ledger.match_exists("m-1").unwrap());
    assert!(ledger.store().players().unwrap().is_empty());

    // The id is still free after the rejected attempts.
    ledger
        .ingest_match("m-1", &seats(["alice", "bob", "carol", "dave"]))
        .unwrap();
    assert!(ledger.match_exists("m-1").unwrap());
}

#[test]
fn invalid_input_writes_nothing_in_memory() {
    invalid_input_writes_nothing(memory_ledger());
}

#[test]
fn invalid_input_writes_nothing_sqlite() {
    invalid_input_writes_nothing(sqlite_ledger());
}

fn negative_and_zero_scores_accumulate<S: LedgerStore>(ledger: Ledger<S>) {
    ledger
        .ingest_match(
            "m-1",
            &scored(["a", "b", "c", "d"], [50_000, 50_000, 0, -100_000], [0, 0, 0, -200_000]),
        )
        .unwrap();
    ledger
        .ingest_match(
            "m-2",
            &scored(
                ["d", "c", "b", "a"],
                [40_000, 30_000, 20_000, 10_000],
                [60_000, 10_000, -20_000, -50_000],
            ),
        )
        .unwrap();

    let d = ledger.store().get_player("d").unwrap().unwrap();
    assert_eq!(d.raw_score_total, -60_000);
    assert_eq!(d.adjusted_score_total, -140_000);

    let profile = ledger.stats().player_profile("d").unwrap().unwrap();
    assert_eq!(profile.raw_score_total, -60.0);
    assert_eq!(profile.adjusted_score_average, -70.0);
    assert_eq!(profile.average_placement, 2.5);
}

#[test]
fn negative_and_zero_scores_accumulate_in_memory() {
    negative_and_zero_scores_accumulate(memory_ledger());
}

#[test]
fn negative_and_zero_scores_accumulate_sqlite() {
    negative_and_zero_scores_accumulate(sqlite_ledger());
}

#[test]
fn recorded_at_comes_from_the_clock() {
    let ledger = memory_ledger();
    let first = ledger
        .ingest_match("m-1", &seats(["a", "b", "c", "d"]))
        .unwrap();
    let second = ledger
        .ingest_match("m-2", &seats(["a", "b", "c", "d"]))
        .unwrap();
    assert_eq!(first.recorded_at.timestamp_millis(), 1_700_000_000_000);
    assert!(second.recorded_at > first.recorded_at);
}

/// A seat that would push a total past the integer range is rejected like
/// any other invalid match and leaves the store working.
fn total_overflow_is_rejected_and_store_stays_usable<S: LedgerStore>(ledger: Ledger<S>) {
    ledger
        .ingest_match("m-1", &scored(["a", "b", "c", "d"], [i64::MAX, 0, 0, 0], [0; 4]))
        .unwrap();

    let err = ledger
        .ingest_match("m-2", &scored(["b", "a", "c", "d"], [0, 1, 0, 0], [0; 4]))
        .unwrap_err();
    assert!(
        matches!(err, LedgerError::Validation(ref msg) if msg.contains("raw_score_total")),
        "{err}"
    );

    let store = ledger.store();
    assert!(!ledger.match_exists("m-2").unwrap());
    let a = store.get_player("a").unwrap().unwrap();
    assert_eq!(a.raw_score_total, i64::MAX);
    assert_eq!(a.games_played, 1);
    // b was folded before a in the rejected match and must be rolled back too.
    assert_eq!(store.get_player("b").unwrap().unwrap().games_played, 1);

    ledger
        .ingest_match("m-3", &seats(["b", "c", "d", "e"]))
        .unwrap();
    assert_eq!(store.get_player("b").unwrap().unwrap().games_played, 2);
    assert_eq!(store.matches().unwrap().len(), 2);
}

#[test]
fn total_overflow_is_rejected_and_store_stays_usable_in_memory() {
    total_overflow_is_rejected_and_store_stays_usable(memory_ledger());
}

#[test]
fn total_overflow_is_rejected_and_store_stays_usable_sqlite() {
    total_overflow_is_rejected_and_store_stays_usable(sqlite_ledger());
}
