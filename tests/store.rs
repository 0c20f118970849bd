use std::fs;
use std::path::PathBuf;

use rusqlite::{Connection, params};

use league_standings::model::{PlayerRef, PointsAdjustment};
use league_standings::snapshot::{LeagueSnapshot, parse_snapshot_json};
use league_standings::standings::StandingsOptions;
use league_standings::store::{import_snapshot, init_schema, list_competitions, load_snapshot};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_snapshot() -> LeagueSnapshot {
    parse_snapshot_json(&read_fixture("league_snapshot.json"))
        .expect("fixture should parse")
        .snapshot
}

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    init_schema(&conn).expect("schema");
    conn
}

#[test]
fn stored_snapshot_gives_the_same_standings() {
    let snap = fixture_snapshot();
    let mut conn = memory_db();
    let summary = import_snapshot(&mut conn, 7, &snap).expect("import");
    assert_eq!(summary.matches, 5);
    assert_eq!(summary.goals, 7);

    let loaded = load_snapshot(&conn, 7).expect("load");
    assert!(loaded.skipped.is_empty());
    let stored = &loaded.snapshot;
    assert_eq!(stored.competition.as_ref().map(|c| c.name.as_str()), Some("Ligue Test"));
    assert_eq!(stored.participants.len(), 4);
    assert_eq!(stored.players.len(), 6);

    let kickoffs: Vec<u64> = stored.matches.iter().map(|m| m.id).collect();
    assert_eq!(kickoffs, vec![1001, 1007, 1002, 1003, 1004]);

    assert_eq!(
        stored.goals[3].assist,
        Some(PlayerRef::FreeText("MOUSSA CAMARA".to_string()))
    );

    let opts = StandingsOptions::default();
    for include in [false, true] {
        assert_eq!(stored.standings(include, &opts), snap.standings(include, &opts));
    }
    assert_eq!(stored.player_totals(1, false, &opts), snap.player_totals(1, false, &opts));
}

#[test]
fn reimport_replaces_events_and_adjustments() {
    let mut snap = fixture_snapshot();
    let mut conn = memory_db();
    import_snapshot(&mut conn, 7, &snap).expect("first import");

    snap.goals.truncate(2);
    snap.penalties = vec![PointsAdjustment {
        participant: 3,
        points: -1,
        reason: "Forfeit fine".to_string(),
    }];
    import_snapshot(&mut conn, 7, &snap).expect("second import");

    let stored = load_snapshot(&conn, 7).expect("load").snapshot;
    assert_eq!(stored.goals.len(), 2);
    assert_eq!(stored.penalties, snap.penalties);
    assert_eq!(stored.matches.len(), 5);

    let runs: i64 = conn
        .query_row("SELECT COUNT(*) FROM import_runs WHERE competition_id = 7", [], |r| r.get(0))
        .expect("count runs");
    assert_eq!(runs, 2);
}

#[test]
fn competitions_are_kept_apart() {
    let snap = fixture_snapshot();
    let mut conn = memory_db();
    import_snapshot(&mut conn, 7, &snap).expect("import");

    let other = LeagueSnapshot {
        participants: snap.participants[..2].to_vec(),
        ..LeagueSnapshot::default()
    };
    import_snapshot(&mut conn, 8, &other).expect("import empty season");

    let known = list_competitions(&conn).expect("list");
    let ids: Vec<u32> = known.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![7, 8]);
    assert_eq!(known[1].name, "Competition 8");

    let loaded = load_snapshot(&conn, 8).expect("load").snapshot;
    assert!(loaded.matches.is_empty());
    assert_eq!(loaded.participants.len(), 2);
    let table = loaded.standings(false, &StandingsOptions::default());
    assert!(table.rows.iter().all(|r| r.played == 0 && r.points == 0));
}

#[test]
fn unknown_competition_is_an_error() {
    let conn = memory_db();
    let err = load_snapshot(&conn, 42).expect_err("nothing stored");
    assert!(err.to_string().contains("42"));
}

#[test]
fn undecodable_match_rows_are_skipped() {
    let snap = fixture_snapshot();
    let mut conn = memory_db();
    import_snapshot(&mut conn, 7, &snap).expect("import");
    conn.execute(
        "UPDATE matches SET status = ?1 WHERE match_id = ?2",
        params!["ABANDONED", 1004_i64],
    )
    .expect("corrupt status");

    let loaded = load_snapshot(&conn, 7).expect("load");
    assert_eq!(loaded.snapshot.matches.len(), 4);
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].0, "matches");
    assert_eq!(loaded.skipped[0].1, 1004);
}

#[test]
fn implausible_stored_scores_are_skipped() {
    let snap = fixture_snapshot();
    let mut conn = memory_db();
    import_snapshot(&mut conn, 7, &snap).expect("import");
    conn.execute(
        "UPDATE matches SET home_score = ?1 WHERE match_id = ?2",
        params![3_000_000_000_i64, 1001_i64],
    )
    .expect("corrupt score");

    let loaded = load_snapshot(&conn, 7).expect("load");
    assert_eq!(loaded.snapshot.matches.len(), 4);
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].1, 1001);
    assert!(loaded.skipped[0].2.contains("home_score"));
}
