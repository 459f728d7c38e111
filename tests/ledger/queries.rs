use riichi_ledger::{Ledger, LedgerStore, Ranking};

use crate::support::{memory_ledger, scored, seats, sqlite_ledger};

fn placement_leaderboard_orders_lowest_first<S: LedgerStore>(ledger: Ledger<S>) {
    // P1 finishes 1st and 2nd, P2 3rd twice.
    ledger
        .ingest_match("m-1", &seats(["P1", "P3", "P2", "P4"]))
        .unwrap();
    ledger
        .ingest_match("m-2", &seats(["P3", "P1", "P2", "P4"]))
        .unwrap();

    let board = ledger.stats().average_placement(2).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].position, 1);
    assert_eq!(board[0].player_id, "P1");
    assert_eq!(board[0].value, 1.5);
    assert_eq!(board[1].player_id, "P3");
    assert_eq!(board[1].value, 1.5);

    let full = ledger.stats().average_placement(10).unwrap();
    let ids: Vec<&str> = full.iter().map(|row| row.player_id.as_str()).collect();
    assert_eq!(ids, vec!["P1", "P3", "P2", "P4"]);
    assert_eq!(full[2].value, 3.0);
    assert_eq!(full[3].value, 4.0);
    assert_eq!(full[3].position, 4);
}

#[test]
fn placement_leaderboard_orders_lowest_first_in_memory() {
    placement_leaderboard_orders_lowest_first(memory_ledger());
}

#[test]
fn placement_leaderboard_orders_lowest_first_sqlite() {
    placement_leaderboard_orders_lowest_first(sqlite_ledger());
}

fn scores_are_reported_in_points<S: LedgerStore>(ledger: Ledger<S>) {
    ledger
        .ingest_match(
            "m-1",
            &scored(
                ["a", "b", "c", "d"],
                [45_000, 30_000, 15_000, 10_000],
                [25_000, 5_000, -10_000, -20_000],
            ),
        )
        .unwrap();

    let stats = ledger.stats();
    let adjusted = stats.total_adjusted_score(1).unwrap();
    assert_eq!(adjusted[0].player_id, "a");
    assert_eq!(adjusted[0].value, 25.0);

    let average = stats.average_adjusted_score(4).unwrap();
    assert_eq!(average[0].value, 25.0);
    assert_eq!(average[3].player_id, "d");
    assert_eq!(average[3].value, -20.0);

    let raw = stats.total_raw_score(2).unwrap();
    assert_eq!(raw[0].value, 45.0);
    assert_eq!(raw[1].value, 30.0);

    let raw_average = stats.average_raw_score(1).unwrap();
    assert_eq!(raw_average[0].value, 45.0);

    let profile = stats.match_profile("m-1").unwrap().unwrap();
    assert_eq!(profile.seats[0].adjusted_score, 25.0);
    assert_eq!(profile.seats[2].raw_score, 15.0);
    assert_eq!(profile.seats[2].position, 3);
}

#[test]
fn scores_are_reported_in_points_in_memory() {
    scores_are_reported_in_points(memory_ledger());
}

#[test]
fn scores_are_reported_in_points_sqlite() {
    scores_are_reported_in_points(sqlite_ledger());
}

fn games_played_breaks_ties_by_player_id<S: LedgerStore>(ledger: Ledger<S>) {
    ledger
        .ingest_match("m-1", &seats(["d", "c", "b", "a"]))
        .unwrap();
    ledger
        .ingest_match("m-2", &seats(["c", "e", "f", "g"]))
        .unwrap();

    let board = ledger.stats().games_played(3).unwrap();
    let ids: Vec<&str> = board.iter().map(|row| row.player_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(board[0].value, 2.0);
    assert_eq!(board[1].games_played, 1);
}

#[test]
fn games_played_breaks_ties_by_player_id_in_memory() {
    games_played_breaks_ties_by_player_id(memory_ledger());
}

#[test]
fn games_played_breaks_ties_by_player_id_sqlite() {
    games_played_breaks_ties_by_player_id(sqlite_ledger());
}

fn recent_matches_newest_first<S: LedgerStore>(ledger: Ledger<S>) {
    for n in 1..=5 {
        ledger
            .ingest_match(&format!("m-{n}"), &seats(["a", "b", "c", "d"]))
            .unwrap();
    }

    let recent = ledger.stats().recent_matches(3).unwrap();
    let ids: Vec<&str> = recent.iter().map(|m| m.match_id.as_str()).collect();
    assert_eq!(ids, vec!["m-5", "m-4", "m-3"]);
    assert!(recent[0].recorded_at > recent[1].recorded_at);

    assert_eq!(ledger.stats().recent_matches(50).unwrap().len(), 5);
}

#[test]
fn recent_matches_newest_first_in_memory() {
    recent_matches_newest_first(memory_ledger());
}

#[test]
fn recent_matches_newest_first_sqlite() {
    recent_matches_newest_first(sqlite_ledger());
}

fn empty_results<S: LedgerStore>(ledger: Ledger<S>) {
    let stats = ledger.stats();
    for ranking in Ranking::ALL {
        assert!(stats.leaderboard(ranking, 10).unwrap().is_empty(), "{ranking}");
    }
    assert!(stats.recent_matches(10).unwrap().is_empty());
    assert!(stats.player_profile("nobody").unwrap().is_none());
    assert!(stats.match_profile("nothing").unwrap().is_none());

    ledger
        .ingest_match("m-1", &seats(["a", "b", "c", "d"]))
        .unwrap();
    let stats = ledger.stats();
    assert!(stats.average_placement(0).unwrap().is_empty());
    assert!(stats.recent_matches(0).unwrap().is_empty());
    assert!(stats.player_profile("nobody").unwrap().is_none());
}

#[test]
fn empty_results_in_memory() {
    empty_results(memory_ledger());
}

#[test]
fn empty_results_sqlite() {
    empty_results(sqlite_ledger());
}

fn dump_lists_everything_in_insertion_order<S: LedgerStore>(ledger: Ledger<S>) {
    ledger
        .ingest_match("m-1", &seats(["a", "b", "c", "d"]))
        .unwrap();
    ledger
        .ingest_match("m-2", &seats(["e", "a", "f", "b"]))
        .unwrap();

    let dump = ledger.stats().dump().unwrap();
    let match_ids: Vec<&str> = dump.matches.iter().map(|m| m.match_id.as_str()).collect();
    assert_eq!(match_ids, vec!["m-1", "m-2"]);
    let player_ids: Vec<&str> = dump.players.iter().map(|p| p.player_id.as_str()).collect();
    assert_eq!(player_ids, vec!["a", "b", "c", "d", "e", "f"]);

    let json = serde_json::to_value(&dump).unwrap();
    assert_eq!(json["matches"][1]["seats"][0]["player_id"], "e");
    assert_eq!(json["players"][0]["games_played"], 2);
}

#[test]
fn dump_lists_everything_in_insertion_order_in_memory() {
    dump_lists_everything_in_insertion_order(memory_ledger());
}

#[test]
fn dump_lists_everything_in_insertion_order_sqlite() {
    dump_lists_everything_in_insertion_order(sqlite_ledger());
}

#[test]
fn player_profile_reports_every_metric() {
    let ledger = memory_ledger();
    ledger
        .ingest_match(
            "m-1",
            &scored(
                ["a", "b", "c", "d"],
                [40_000, 30_000, 20_000, 10_000],
                [60_000, 10_000, -20_000, -50_000],
            ),
        )
        .unwrap();
    ledger
        .ingest_match(
            "m-2",
            &scored(
                ["b", "a", "c", "d"],
                [40_000, 30_000, 20_000, 10_000],
                [60_000, 10_000, -20_000, -50_000],
            ),
        )
        .unwrap();

    let a = ledger.stats().player_profile("a").unwrap().unwrap();
    assert_eq!(a.games_played, 2);
    assert_eq!(a.average_placement, 1.5);
    assert_eq!(a.adjusted_score_total, 70.0);
    assert_eq!(a.adjusted_score_average, 35.0);
    assert_eq!(a.raw_score_total, 70.0);
    assert_eq!(a.raw_score_average, 35.0);
}

/// Ids are bound as data, so quote characters and SQL fragments in an id
/// neither match other rows nor break the lookup.
fn ids_with_sql_metacharacters_are_plain_data<S: LedgerStore>(ledger: Ledger<S>) {
    let match_id = "m-1' OR '1'='1";
    let player_id = "bob'; DROP TABLE players; --";
    ledger
        .ingest_match("m-1", &seats(["alice", "carol", "dave", "erin"]))
        .unwrap();

    let stats = ledger.stats();
    assert!(stats.match_profile(match_id).unwrap().is_none());
    assert!(stats.player_profile("alice' OR '1'='1").unwrap().is_none());
    assert!(!ledger.match_exists(match_id).unwrap());

    ledger
        .ingest_match(match_id, &seats([player_id, "alice", "carol", "dave"]))
        .unwrap();

    let profile = ledger.stats().match_profile(match_id).unwrap().unwrap();
    assert_eq!(profile.match_id, match_id);
    assert_eq!(profile.seats[0].player_id, player_id);

    let bob = ledger.stats().player_profile(player_id).unwrap().unwrap();
    assert_eq!(bob.games_played, 1);
    assert_eq!(bob.average_placement, 1.0);
    assert_eq!(ledger.store().players().unwrap().len(), 5);
    assert_eq!(ledger.store().matches().unwrap().len(), 2);
}

#[test]
fn ids_with_sql_metacharacters_are_plain_data_in_memory() {
    ids_with_sql_metacharacters_are_plain_data(memory_ledger());
}

#[test]
fn ids_with_sql_metacharacters_are_plain_data_sqlite() {
    ids_with_sql_metacharacters_are_plain_data(sqlite_ledger());
}
