use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use league_standings::export::{
    export_workbook, render_leaders_text, render_player_totals_text, render_standings_text,
    standings_json,
};
use league_standings::player_totals::rank_player_totals;
use league_standings::snapshot::{LeagueSnapshot, parse_snapshot_json};
use league_standings::standings::StandingsOptions;

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

#[test]
fn standings_document_carries_scope_and_rows() {
    let snap = fixture_snapshot();
    let table = snap.standings(false, &StandingsOptions::default());
    let raw = standings_json(snap.competition.as_ref(), &table).expect("serialize");
    let doc: Value = serde_json::from_str(&raw).expect("valid json");

    assert_eq!(doc["competition"]["id"], 7);
    assert_eq!(doc["status_scope"], "finished_only");
    assert_eq!(doc["statuses_used"], serde_json::json!(["FINISHED"]));
    assert_eq!(doc["widened"], false);
    assert_eq!(doc["matches_counted"], 2);
    assert_eq!(doc["skipped"], 1);

    let rows = doc["table"].as_array().expect("table array");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["name"], "Horoya AC");
    assert_eq!(rows[0]["form"], serde_json::json!(["W", "D"]));
    assert_eq!(rows[3]["penalty_points"], -3);
    assert_eq!(rows[3]["position"], 4);
}

#[test]
fn text_table_marks_adjusted_points() {
    let snap = fixture_snapshot();
    let table = snap.standings(false, &StandingsOptions::default());
    let text = render_standings_text("Ligue Test", &table);

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Ligue Test");
    assert!(lines[2].contains("Horoya AC"));
    assert!(lines[2].trim_end().ends_with("WD"));
    assert!(lines[5].contains("Hafia FC"));
    assert!(lines[5].contains("-3*"));
    assert!(text.contains("* Hafia FC: -3 pts adjustment"));
    assert!(text.contains("(1 match records ignored)"));
    assert!(!text.contains("in-progress results counted"));
}

#[test]
fn squad_and_leader_listings() {
    let snap = fixture_snapshot();
    let opts = StandingsOptions::default();
    let totals = snap.player_totals(1, false, &opts).expect("club 1");
    let text = render_player_totals_text("Squad", &rank_player_totals(&totals));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[2].starts_with("Moussa Camara"));

    let leaders = render_leaders_text("Top scorers", &snap.top_scorers(false, &opts, 3));
    assert!(leaders.contains("  1. Moussa Camara (2)"));
    assert!(leaders.contains("  3. Lamine Conde (1)"));
}

#[test]
fn workbook_is_written() {
    let snap = fixture_snapshot();
    let opts = StandingsOptions::default();
    let table = snap.standings(false, &opts);
    let players = rank_player_totals(&snap.player_totals(1, false, &opts).expect("club 1"));

    let path = std::env::temp_dir().join(format!("league_standings_{}.xlsx", std::process::id()));
    let report = export_workbook(&path, &table, &players).expect("write workbook");
    assert_eq!(report.standings_rows, 4);
    assert_eq!(report.player_rows, 3);
    let size = fs::metadata(&path).expect("workbook exists").len();
    assert!(size > 0);

    let report = export_workbook(&path, &table, &[]).expect("standings only");
    assert_eq!((report.standings_rows, report.player_rows), (4, 0));
    let _ = fs::remove_file(&path);
}
